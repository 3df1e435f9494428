//! Structured rendering failures.
//!
//! Failures are block-local and recoverable at the document level: they
//! degrade one diagram to a placeholder rather than aborting the conversion.

/// Why a render attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// The attempt exceeded its timeout or the conversion deadline expired.
    Timeout,
    /// The external process exited non-zero or produced no output.
    ProcessError,
    /// Connection failure or non-success HTTP status.
    NetworkError,
    /// A payload that could not be decoded or rasterized.
    DecodeError,
    /// The service rejected the requested output format.
    UnsupportedFormat,
}

impl FailureReason {
    /// Identifier used in logs and placeholders.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::ProcessError => "process_error",
            Self::NetworkError => "network_error",
            Self::DecodeError => "decode_error",
            Self::UnsupportedFormat => "unsupported_format",
        }
    }
}

/// A failed render attempt with diagnostic detail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}: {detail}", reason.as_str())]
pub struct RenderFailure {
    pub reason: FailureReason,
    pub detail: String,
}

impl RenderFailure {
    pub fn timeout(detail: impl Into<String>) -> Self {
        Self {
            reason: FailureReason::Timeout,
            detail: detail.into(),
        }
    }

    pub fn process(detail: impl Into<String>) -> Self {
        Self {
            reason: FailureReason::ProcessError,
            detail: detail.into(),
        }
    }

    pub fn network(detail: impl Into<String>) -> Self {
        Self {
            reason: FailureReason::NetworkError,
            detail: detail.into(),
        }
    }

    pub fn decode(detail: impl Into<String>) -> Self {
        Self {
            reason: FailureReason::DecodeError,
            detail: detail.into(),
        }
    }
}
