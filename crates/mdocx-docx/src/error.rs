//! Document-level serialization errors.
//!
//! Diagram failures never surface here; they degrade to placeholders during
//! assembly. This error covers only the packaging of the final artifact.

#[derive(Debug, thiserror::Error)]
pub enum DocxError {
    #[error("could not write document archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("could not write document archive: {0}")]
    Io(#[from] std::io::Error),
}
