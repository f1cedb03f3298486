use std::collections::BTreeMap;

use http::header::HeaderMap;
use http::request::Parts;
use http::{Method, Request, Uri};

use crate::types::HttpContext;

impl HttpContext {
    /// Copy method, URL and headers out of a live request.
    ///
    /// The body is never read here: it may be a stream that the handler still
    /// owns, so `request_body` is always `None`.
    pub fn from_request<B>(req: &Request<B>) -> Self {
        from_components(req.method(), req.uri(), req.headers())
    }

    /// Same as [`HttpContext::from_request`] for a request already split
    /// into parts.
    pub fn from_parts(parts: &Parts) -> Self {
        from_components(&parts.method, &parts.uri, &parts.headers)
    }
}

fn from_components(method: &Method, uri: &Uri, headers: &HeaderMap) -> HttpContext {
    HttpContext {
        request_method: method.as_str().to_string(),
        request_url: uri.to_string(),
        request_headers: copy_headers(headers),
        request_body: None,
    }
}

/// Repeated headers are joined with `", "`. Values that are not visible
/// ASCII are copied lossily instead of being dropped.
fn copy_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for name in headers.keys() {
        let values: Vec<String> = headers
            .get_all(name)
            .iter()
            .map(|value| match value.to_str() {
                Ok(s) => s.to_string(),
                Err(_) => {
                    tracing::warn!(header = %name, "non-ASCII header value copied lossily");
                    String::from_utf8_lossy(value.as_bytes()).into_owned()
                }
            })
            .collect();
        out.insert(name.as_str().to_string(), values.join(", "));
    }
    out
}
