//! The assembled document model.

use mdocx_diagrams::{FailureReason, RenderedImage};

/// A run of text with inline styling.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StyledRun {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    /// Inline code span, rendered in a monospace font.
    pub code: bool,
}

impl StyledRun {
    /// A plain, unstyled run.
    #[must_use]
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// One table row: a list of cells, each a list of runs.
pub type TableRow = Vec<Vec<StyledRun>>;

/// One structural element of the output document, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section {
    Heading {
        /// 1 through 6.
        level: u8,
        runs: Vec<StyledRun>,
    },
    Paragraph {
        runs: Vec<StyledRun>,
    },
    ListItem {
        ordered: bool,
        /// Nesting depth, zero for a top-level item.
        depth: usize,
        runs: Vec<StyledRun>,
    },
    CodeBlock {
        text: String,
    },
    Table {
        /// First `header_rows` rows render bold.
        header_rows: usize,
        rows: Vec<TableRow>,
    },
    /// A successfully rendered diagram, centered and scaled to the
    /// configured bounding box.
    Image(RenderedImage),
    /// A diagram that failed to render. The document keeps its place with
    /// a visible marker instead of dropping the block.
    Placeholder {
        reason: FailureReason,
        detail: String,
    },
}

/// The fully assembled document, ready for serialization.
///
/// Sections appear in original block order. Serialization via
/// [`to_bytes`](Self::to_bytes) is deterministic: the same document always
/// produces the same bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledDocument {
    pub sections: Vec<Section>,
    /// Bounding box for diagram images, in pixels.
    pub image_box: (u32, u32),
}

impl AssembledDocument {
    /// Number of image sections.
    #[must_use]
    pub fn image_count(&self) -> usize {
        self.sections
            .iter()
            .filter(|s| matches!(s, Section::Image(_)))
            .count()
    }

    /// Number of failure placeholders.
    #[must_use]
    pub fn placeholder_count(&self) -> usize {
        self.sections
            .iter()
            .filter(|s| matches!(s, Section::Placeholder { .. }))
            .count()
    }
}
