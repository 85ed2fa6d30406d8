//! Error types for decoding persisted scope records and loading settings.

/// Errors that can occur when decoding a persisted record.
///
/// Decoding is all-or-nothing: when any of these is returned, no partially
/// populated value escapes to the caller.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The record was written by a newer, incompatible writer.
    #[error("unsupported record version {found} (this reader supports up to {supported})")]
    VersionMismatch {
        /// Version tag found in the input
        found: u8,
        /// Highest version this reader understands
        supported: u8,
    },

    /// A declared length runs past the end of the input.
    #[error("truncated input: need {needed} bytes, {remaining} remaining")]
    Truncated {
        /// Bytes the decoder needed to read
        needed: usize,
        /// Bytes actually left in the input
        remaining: usize,
    },

    /// The input is structurally invalid.
    #[error("malformed record: {0}")]
    Malformed(String),

    /// The structured text could not be parsed at all.
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
}

impl DecodeError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        DecodeError::Malformed(message.into())
    }
}

/// Errors raised while reading settings from the environment.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The variable is set but is not a recognizable boolean.
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}
