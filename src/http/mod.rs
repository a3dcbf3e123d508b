//! HTTP protocol layer module
//!
//! MIME detection and response builders, independent of routing.

pub mod mime;
pub mod response;

// Re-export commonly used builders
pub use response::{
    build_404_response, build_405_response, build_fallthrough_response, build_file_response,
    build_octet_stream_response, build_options_response,
};
