//! Archive module
//!
//! The byte-range core of the server: the shared archive handle, the
//! `offset,length` query format and the reader that ties them together.

mod error;
mod query;
mod reader;
mod source;

pub use error::RangeError;
pub use reader::RangeReader;
pub use source::ArchiveSource;
