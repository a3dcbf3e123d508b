//! Request handler module
//!
//! Routes each request to the archive range endpoint or the static files.

pub mod range;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
