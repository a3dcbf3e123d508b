// Application state module
// Everything a request task needs, shared read-only behind an Arc

use crate::archive::{ArchiveSource, RangeReader};

use super::types::Config;

/// Application state
pub struct AppState {
    pub config: Config,
    /// Range reader over the archive opened at startup
    pub range_reader: RangeReader,
}

impl AppState {
    /// Create `AppState` around an already opened archive
    pub const fn new(config: Config, source: ArchiveSource) -> Self {
        let range_reader = RangeReader::new(source, config.archive.max_range_length);
        Self {
            config,
            range_reader,
        }
    }
}
