//! The replayable request envelope dispatched against each host attempt.

use bytes::Bytes;
use http::uri::{Authority, Scheme};
use http::{HeaderMap, Method, Request, Uri};

/// A request buffered once and replayed against every attempt.
///
/// The body is read into memory up front (`bytes::Bytes` is cheap to clone,
/// being refcounted) so a failed attempt against one host can be retried
/// against the next without re-reading a stream that may already be
/// partially consumed.
#[derive(Debug, Clone)]
pub struct BufferedRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    original_scheme: Option<Scheme>,
    original_authority: Option<Authority>,
}

impl BufferedRequest {
    /// Buffers an `http::Request` whose body is already in memory.
    pub fn new(request: Request<Bytes>) -> Self {
        let (parts, body) = request.into_parts();
        let original_scheme = parts.uri.scheme().cloned();
        let original_authority = parts.uri.authority().cloned();
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            original_scheme,
            original_authority,
        }
    }

    /// The request path and query, independent of which host is targeted.
    pub fn path_and_query(&self) -> &str {
        self.uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/")
    }

    /// The envelope's current header map, after any configured modifiers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The buffered body's length in bytes.
    pub fn body_len(&self) -> usize {
        self.body.len()
    }

    /// Builds a fresh request targeting `scheme://authority`, leaving this
    /// envelope's own URI untouched until [`BufferedRequest::restore`] or
    /// the next call to this method.
    pub fn for_host(&mut self, scheme: &str, authority: &str) -> Result<Request<Bytes>, http::Error> {
        let mut parts = Uri::builder()
            .scheme(scheme)
            .authority(authority);
        if let Some(pq) = self.uri.path_and_query() {
            parts = parts.path_and_query(pq.clone());
        }
        let uri = parts.build()?;
        self.uri = uri.clone();

        let mut builder = Request::builder().method(self.method.clone()).uri(uri);
        for (name, value) in self.headers.iter() {
            builder = builder.header(name, value.clone());
        }
        builder.body(self.body.clone())
    }

    /// Gives a closure mutable access to the envelope's header map, for
    /// applying configured request modifiers once before any attempt.
    pub fn with_headers_mut<F: FnOnce(&mut HeaderMap)>(&mut self, f: F) {
        f(&mut self.headers);
    }

    /// Restores the envelope's own URI to its original scheme/authority.
    ///
    /// Called once dispatch finishes (success or exhaustion) so that an
    /// envelope inspected or reused afterward never appears pointed at
    /// whichever host happened to be tried last.
    pub fn restore(&mut self) {
        let mut builder = Uri::builder();
        if let Some(scheme) = &self.original_scheme {
            builder = builder.scheme(scheme.clone());
        }
        if let Some(authority) = &self.original_authority {
            builder = builder.authority(authority.clone());
        }
        if let Some(pq) = self.uri.path_and_query() {
            builder = builder.path_and_query(pq.clone());
        }
        if let Ok(uri) = builder.build() {
            self.uri = uri;
        }
    }
}
