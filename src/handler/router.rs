//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method validation, dispatch to
//! the range endpoint or the static files, and access logging.

use crate::config::AppState;
use crate::handler::{range, static_files};
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    pub path: &'a str,
    /// Raw, undecoded query string
    pub query: Option<&'a str>,
    pub is_head: bool,
}

/// Main entry point for HTTP request handling
///
/// The request body is never read, so any body type is accepted.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let (parts, _) = req.into_parts();
    let method = &parts.method;
    let uri = &parts.uri;

    let response = if let Some(resp) = check_http_method(method) {
        resp
    } else {
        let ctx = RequestContext {
            path: uri.path(),
            query: uri.query(),
            is_head: *method == Method::HEAD,
        };
        route_request(&ctx, &state).await
    };

    if state.config.logging.access_log {
        let mut entry = AccessLogEntry::new(peer_addr, method, uri, parts.version);
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .body()
            .size_hint()
            .exact()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or_default();
        entry.user_agent = parts
            .headers
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Check HTTP method and return appropriate response for non-GET/HEAD methods
fn check_http_method(method: &Method) -> Option<Response<Full<Bytes>>> {
    match *method {
        Method::GET | Method::HEAD => None,
        Method::OPTIONS => Some(http::build_options_response()),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}

/// Route request based on path and configuration
async fn route_request(ctx: &RequestContext<'_>, state: &Arc<AppState>) -> Response<Full<Bytes>> {
    if ctx.path == state.config.archive.endpoint {
        return range::serve_range(ctx, &state.range_reader).await;
    }

    static_files::serve_directory(
        ctx,
        &state.config.static_files.root,
        &state.config.static_files.index_files,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::ArchiveSource;
    use crate::config::tests::test_config;
    use http_body_util::BodyExt;
    use std::io::Write;

    struct Fixture {
        _archive: tempfile::NamedTempFile,
        _www: tempfile::TempDir,
        state: Arc<AppState>,
    }

    fn fixture() -> Fixture {
        let mut archive = tempfile::NamedTempFile::new().unwrap();
        archive.write_all(&(0..100).collect::<Vec<u8>>()).unwrap();
        archive.flush().unwrap();

        let www = tempfile::tempdir().unwrap();
        std::fs::write(www.path().join("index.html"), "<p>hi</p>").unwrap();

        let mut cfg = test_config();
        cfg.archive.path = archive.path().display().to_string();
        cfg.static_files.root = www.path().display().to_string();

        let source = ArchiveSource::open(archive.path()).unwrap();
        Fixture {
            _archive: archive,
            _www: www,
            state: Arc::new(AppState::new(cfg, source)),
        }
    }

    async fn request(fx: &Fixture, method: Method, uri: &str) -> Response<Full<Bytes>> {
        let req = Request::builder().method(method).uri(uri).body(()).unwrap();
        handle_request(req, Arc::clone(&fx.state), "127.0.0.1:4000".parse().unwrap())
            .await
            .unwrap()
    }

    async fn body(resp: Response<Full<Bytes>>) -> Bytes {
        resp.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn test_range_success() {
        let fx = fixture();
        let resp = request(&fx, Method::GET, "/zim?10,5").await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["Content-Type"], "application/octet-stream");
        assert_eq!(&body(resp).await[..], &[10, 11, 12, 13, 14]);
    }

    #[tokio::test]
    async fn test_range_truncated_at_end() {
        let fx = fixture();
        let resp = request(&fx, Method::GET, "/zim?95,10").await;
        assert_eq!(&body(resp).await[..], &[95, 96, 97, 98, 99]);
    }

    #[tokio::test]
    async fn test_range_failures_fall_through() {
        let fx = fixture();
        for uri in ["/zim?-5,10", "/zim?0,99999999999", "/zim?100,1", "/zim?abc", "/zim"] {
            let resp = request(&fx, Method::GET, uri).await;
            assert_eq!(resp.status(), 200, "{uri}");
            assert!(resp.headers().get("Content-Type").is_none(), "{uri}");
            assert!(body(resp).await.is_empty(), "{uri}");
        }
    }

    #[tokio::test]
    async fn test_range_head_has_no_body() {
        let fx = fixture();
        let resp = request(&fx, Method::HEAD, "/zim?0,10").await;
        assert_eq!(resp.headers()["Content-Type"], "application/octet-stream");
        assert!(body(resp).await.is_empty());
    }

    #[tokio::test]
    async fn test_endpoint_match_is_exact() {
        let fx = fixture();
        let resp = request(&fx, Method::GET, "/zim/x?0,10").await;
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn test_static_index() {
        let fx = fixture();
        let resp = request(&fx, Method::GET, "/").await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["Content-Type"], "text/html; charset=utf-8");
        assert_eq!(&body(resp).await[..], b"<p>hi</p>");
    }

    #[tokio::test]
    async fn test_method_checks() {
        let fx = fixture();
        assert_eq!(request(&fx, Method::POST, "/zim?0,1").await.status(), 405);
        assert_eq!(request(&fx, Method::OPTIONS, "/").await.status(), 204);
    }
}
