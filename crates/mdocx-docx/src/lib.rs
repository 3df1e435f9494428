//! DOCX assembly.
//!
//! Turns segmented markdown blocks plus per-diagram render results into a
//! WordprocessingML package. Prose is translated with a fixed event walk;
//! diagrams become centered images or visible failure placeholders.

mod assemble;
mod error;
mod package;
mod section;
mod translate;
mod xml;

pub use assemble::assemble;
pub use error::DocxError;
pub use section::{AssembledDocument, Section, StyledRun, TableRow};
pub use translate::translate_prose;
