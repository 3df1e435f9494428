//! Markdown segmentation for mdocx.
//!
//! Splits a raw Markdown document into an ordered sequence of [`Block`]s:
//! prose spans and Mermaid diagram code blocks. Segmentation never fails;
//! malformed input degrades to prose or to a diagram block that is flagged
//! for a rendering failure downstream.

mod block;
mod segmenter;

pub use block::{Block, BlockKind, DiagramSyntax};
pub use segmenter::segment;
