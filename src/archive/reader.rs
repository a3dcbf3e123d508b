//! Range reader service
//!
//! Turns one raw `offset,length` query into the matching archive bytes.

use std::io;

use hyper::body::Bytes;

use super::error::RangeError;
use super::query::RangeQuery;
use super::source::ArchiveSource;
use crate::logger;

/// Serves `offset,length` queries from one archive
#[derive(Debug, Clone)]
pub struct RangeReader {
    source: ArchiveSource,
    max_length: u64,
}

impl RangeReader {
    pub const fn new(source: ArchiveSource, max_length: u64) -> Self {
        Self { source, max_length }
    }

    /// Handle one raw query string.
    ///
    /// On success the bytes are at most `length` long; they are shorter when
    /// the archive ends inside the requested range. The blocking read runs on
    /// the blocking pool so only this request waits on it.
    pub async fn handle(&self, raw_query: &str) -> Result<Bytes, RangeError> {
        let query: RangeQuery = raw_query.parse()?;
        logger::log_range_request(query.offset, query.length);

        query.check_limit(self.max_length)?;
        let (offset, length) = query.read_args()?;

        let source = self.source.clone();
        let data = tokio::task::spawn_blocking(move || {
            let mut buf = vec![0u8; length];
            let n = source.read_at(offset, &mut buf)?;
            buf.truncate(n);
            Ok::<_, io::Error>(buf)
        })
        .await
        .map_err(io::Error::other)??;

        Ok(Bytes::from(data))
    }
}
