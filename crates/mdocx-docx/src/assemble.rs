//! Document assembly from blocks and render results.

use std::collections::BTreeMap;

use mdocx_diagrams::{RenderFailure, RenderResult, RenderingConfig};
use mdocx_segment::{Block, BlockKind};

use crate::section::{AssembledDocument, Section};
use crate::translate::translate_prose;

/// Assemble the output document from segmented blocks and their render
/// results.
///
/// Blocks are consumed strictly in ordinal order. A diagram block whose
/// render failed, or whose result is missing after a deadline expiry,
/// becomes a visible placeholder; assembly itself never fails because of a
/// diagram.
#[must_use]
pub fn assemble(
    blocks: &[Block],
    results: &BTreeMap<usize, RenderResult>,
    config: &RenderingConfig,
) -> AssembledDocument {
    let mut sections = Vec::new();
    for block in blocks {
        match &block.kind {
            BlockKind::Prose { text } => {
                sections.extend(translate_prose(text));
            }
            BlockKind::Diagram { .. } => {
                let section = match results.get(&block.ordinal) {
                    Some(Ok(image)) => Section::Image(image.clone()),
                    Some(Err(failure)) => placeholder(failure),
                    None => placeholder(&RenderFailure::timeout(
                        "no render result before the conversion deadline",
                    )),
                };
                if matches!(section, Section::Placeholder { .. }) {
                    tracing::warn!(ordinal = block.ordinal, "diagram degraded to placeholder");
                }
                sections.push(section);
            }
        }
    }

    tracing::debug!(sections = sections.len(), "document assembled");
    AssembledDocument {
        sections,
        image_box: (config.image_width_px, config.image_height_px),
    }
}

fn placeholder(failure: &RenderFailure) -> Section {
    Section::Placeholder {
        reason: failure.reason,
        detail: failure.detail.clone(),
    }
}
