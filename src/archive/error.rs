//! Range request errors
//!
//! Every way a single range request can fail. None of them is fatal to the
//! server and none is shown to the client.

use std::io;

/// Failure of one range request
#[derive(Debug, thiserror::Error)]
pub enum RangeError {
    /// Query text is not `<offset>,<length>` with two 64-bit integers
    #[error("invalid range query '{query}': {reason}")]
    InvalidQuery { query: String, reason: String },

    /// Requested length is above the configured ceiling
    #[error("requested length {length} exceeds the limit of {limit} bytes")]
    LengthExceedsLimit { length: i64, limit: u64 },

    /// Positioned read rejected the range or failed
    #[error("archive read failed: {0}")]
    Io(#[from] io::Error),
}

impl RangeError {
    /// Short label used in log lines
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidQuery { .. } => "invalid_query",
            Self::LengthExceedsLimit { .. } => "length_exceeds_limit",
            Self::Io(_) => "io",
        }
    }
}
