//! Range query parsing
//!
//! The range endpoint takes its whole raw query string as `<offset>,<length>`,
//! e.g. `/zim?12345,2048`. No `key=value` pairs, no URL decoding.

use std::io;
use std::str::FromStr;

use super::error::RangeError;

/// Offset and length requested by one client, still untrusted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeQuery {
    pub offset: i64,
    pub length: i64,
}

impl FromStr for RangeQuery {
    type Err = RangeError;

    /// Parse the first two comma separated segments; anything after is ignored
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut segments = raw.split(',');
        let offset = parse_segment(raw, segments.next(), "offset")?;
        let length = parse_segment(raw, segments.next(), "length")?;
        Ok(Self { offset, length })
    }
}

impl RangeQuery {
    /// Reject lengths above `max_length` before anything is allocated.
    ///
    /// Negative values are left for the read to reject.
    pub fn check_limit(&self, max_length: u64) -> Result<(), RangeError> {
        match u64::try_from(self.length) {
            Ok(length) if length > max_length => Err(RangeError::LengthExceedsLimit {
                length: self.length,
                limit: max_length,
            }),
            _ => Ok(()),
        }
    }

    /// File position and buffer size in the positioned-read domain.
    ///
    /// Negative values cannot be expressed there and fail the same way a
    /// read primitive fails on them: `InvalidInput`.
    pub fn read_args(&self) -> io::Result<(u64, usize)> {
        let offset = u64::try_from(self.offset).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("negative offset {}", self.offset),
            )
        })?;
        let length = usize::try_from(self.length).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid length {}", self.length),
            )
        })?;
        Ok((offset, length))
    }
}

fn parse_segment(raw: &str, segment: Option<&str>, name: &str) -> Result<i64, RangeError> {
    let Some(text) = segment else {
        return Err(RangeError::InvalidQuery {
            query: raw.to_string(),
            reason: format!("missing {name}"),
        });
    };

    text.parse::<i64>().map_err(|e| RangeError::InvalidQuery {
        query: raw.to_string(),
        reason: format!("{name} '{text}': {e}"),
    })
}
