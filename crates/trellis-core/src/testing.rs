//! In-memory transport handles and a client for driving an [`Engine`].
//!
//! ```ignore
//! let client = TestClient::new(&engine);
//! let response = client.get("/hello/world?lang=en").send();
//! assert_eq!(response.status(), StatusCode::OK);
//! ```

use std::borrow::Cow;

use crate::engine::Engine;
use crate::request::{Headers, RequestHandle};
use crate::response::{ResponseHandle, StatusCode};

/// A request handle backed by plain in-memory pairs.
///
/// Values are stored as given; no percent-decoding happens here.
#[derive(Debug, Clone, Default)]
pub struct TestRequest {
    query: Vec<(String, String)>,
    form: Vec<(String, String)>,
    headers: Headers,
}

impl TestRequest {
    /// Create an empty request handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add a form value.
    #[must_use]
    pub fn with_form(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.push((key.into(), value.into()));
        self
    }

    /// Add a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }
}

fn first<'a>(pairs: &'a [(String, String)], key: &str) -> Option<Cow<'a, str>> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| Cow::Borrowed(v.as_str()))
}

impl RequestHandle for TestRequest {
    fn query(&self, key: &str) -> Option<Cow<'_, str>> {
        first(&self.query, key)
    }

    fn form_value(&self, key: &str) -> Option<Cow<'_, str>> {
        first(&self.form, key).or_else(|| first(&self.query, key))
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }
}

/// A response handle that records what reached it.
///
/// Behaves like a wire: the first status wins, and headers arriving after
/// it are dropped.
#[derive(Debug, Clone, Default)]
pub struct TestResponse {
    status: Option<StatusCode>,
    headers: Headers,
    body: Vec<u8>,
    status_calls: usize,
}

impl TestResponse {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The status sent, or 200 if none was.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or_default()
    }

    /// Whether a status was sent at all.
    #[must_use]
    pub fn is_committed(&self) -> bool {
        self.status.is_some()
    }

    /// How many times `set_status` was called.
    #[must_use]
    pub fn status_calls(&self) -> usize {
        self.status_calls
    }

    /// A header that reached the wire.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// All headers that reached the wire.
    #[must_use]
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Raw body bytes.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body as text (lossy).
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body parsed as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }

    /// Whether the body (as text) matches `pattern`.
    #[cfg(feature = "regex")]
    pub fn body_matches(&self, pattern: &str) -> Result<bool, regex::Error> {
        Ok(regex::Regex::new(pattern)?.is_match(&self.text()))
    }
}

impl ResponseHandle for TestResponse {
    fn set_status(&mut self, status: StatusCode) {
        self.status_calls += 1;
        if self.status.is_none() {
            self.status = Some(status);
        }
    }

    fn set_header(&mut self, name: &str, value: &str) {
        if self.status.is_none() {
            self.headers.insert(name, value);
        }
    }

    fn write_body(&mut self, bytes: &[u8]) {
        self.body.extend_from_slice(bytes);
    }
}

/// Sends in-memory requests through [`Engine::dispatch`].
#[derive(Debug, Clone, Copy)]
pub struct TestClient<'e> {
    engine: &'e Engine,
}

impl<'e> TestClient<'e> {
    /// Create a client for `engine`.
    #[must_use]
    pub fn new(engine: &'e Engine) -> Self {
        Self { engine }
    }

    /// Start a request with an arbitrary method token.
    #[must_use]
    pub fn request(&self, method: &str, target: &str) -> RequestBuilder<'e> {
        RequestBuilder::new(self.engine, method, target)
    }

    /// Start a GET request.
    #[must_use]
    pub fn get(&self, target: &str) -> RequestBuilder<'e> {
        self.request("GET", target)
    }

    /// Start a POST request.
    #[must_use]
    pub fn post(&self, target: &str) -> RequestBuilder<'e> {
        self.request("POST", target)
    }

    /// Start a PUT request.
    #[must_use]
    pub fn put(&self, target: &str) -> RequestBuilder<'e> {
        self.request("PUT", target)
    }

    /// Start a DELETE request.
    #[must_use]
    pub fn delete(&self, target: &str) -> RequestBuilder<'e> {
        self.request("DELETE", target)
    }
}

/// A request under construction.
#[derive(Debug)]
pub struct RequestBuilder<'e> {
    engine: &'e Engine,
    method: String,
    path: String,
    request: TestRequest,
}

impl<'e> RequestBuilder<'e> {
    fn new(engine: &'e Engine, method: &str, target: &str) -> Self {
        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        let mut request = TestRequest::new();
        for pair in query.split('&').filter(|s| !s.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            request = request.with_query(key, value);
        }
        Self {
            engine,
            method: method.to_owned(),
            path: path.to_owned(),
            request,
        }
    }

    /// Add a query parameter.
    #[must_use]
    pub fn query(mut self, key: &str, value: &str) -> Self {
        self.request = self.request.with_query(key, value);
        self
    }

    /// Add a form value.
    #[must_use]
    pub fn form(mut self, key: &str, value: &str) -> Self {
        self.request = self.request.with_form(key, value);
        self
    }

    /// Add a header.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.request = self.request.with_header(name, value);
        self
    }

    /// Dispatch the request and return what the transport would have seen.
    #[must_use]
    pub fn send(self) -> TestResponse {
        let mut response = TestResponse::new();
        self.engine
            .dispatch(&self.method, &self.path, &self.request, &mut response);
        response
    }
}
