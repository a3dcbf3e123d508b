//! Range endpoint
//!
//! Boundary between HTTP and the range reader: success becomes an
//! octet-stream body, any failure becomes the empty default response.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

use crate::archive::RangeReader;
use crate::handler::router::RequestContext;
use crate::http;
use crate::logger;

/// Serve `<endpoint>?<offset>,<length>`
pub async fn serve_range(ctx: &RequestContext<'_>, reader: &RangeReader) -> Response<Full<Bytes>> {
    // A missing query is just another malformed range
    match reader.handle(ctx.query.unwrap_or_default()).await {
        Ok(data) => http::build_octet_stream_response(data, ctx.is_head),
        Err(e) => {
            logger::log_range_failed(&e);
            http::build_fallthrough_response()
        }
    }
}
