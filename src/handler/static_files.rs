//! Static file serving module
//!
//! Serves the web assets around the archive (reader UI, scripts, styles)
//! from one directory.

use crate::handler::router::RequestContext;
use crate::http::{self, mime};
use crate::logger;
use http_body_util::Full;
use percent_encoding::percent_decode_str;
use hyper::body::Bytes;
use hyper::Response;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Serve a request path from the static root
pub async fn serve_directory(
    ctx: &RequestContext<'_>,
    root: &str,
    index_files: &[String],
) -> Response<Full<Bytes>> {
    match load_from_directory(Path::new(root), ctx.path, index_files).await {
        Some((content, content_type)) => {
            http::build_file_response(Bytes::from(content), content_type, ctx.is_head)
        }
        None => http::build_404_response(),
    }
}

/// Load a file below `root`, resolving directories to their index file.
///
/// Returns `None` when nothing servable exists or the path escapes `root`.
pub async fn load_from_directory(
    root: &Path,
    path: &str,
    index_files: &[String],
) -> Option<(Vec<u8>, &'static str)> {
    let Ok(decoded) = percent_decode_str(path).decode_utf8() else {
        logger::log_debug(&format!("Static path is not valid UTF-8: {path}"));
        return None;
    };
    // Drop ".." first so no leading slash survives to make the join absolute
    let cleaned = decoded.replace("..", "");
    let relative_path = cleaned.trim_start_matches('/');

    let root_canonical = match root.canonicalize() {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Static directory not found or inaccessible '{}': {e}",
                root.display()
            ));
            return None;
        }
    };

    let mut file_path = root.join(relative_path);

    if relative_path.is_empty() || relative_path.ends_with('/') || file_path.is_dir() {
        file_path = find_index_file(&file_path, index_files)?;
    }

    // File not found is common (404), only worth a debug line
    let Ok(file_canonical) = file_path.canonicalize() else {
        logger::log_debug(&format!("Static file not found: {path}"));
        return None;
    };
    if !file_canonical.starts_with(&root_canonical) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {} -> {}",
            path,
            file_canonical.display()
        ));
        return None;
    }

    let content = match fs::read(&file_canonical).await {
        Ok(c) => c,
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read file '{}': {e}",
                file_canonical.display()
            ));
            return None;
        }
    };

    Some((content, mime::content_type_for(&file_path)))
}

fn find_index_file(dir: &Path, index_files: &[String]) -> Option<PathBuf> {
    index_files
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file())
}
