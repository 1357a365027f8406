//! Owned request adapter.

use std::borrow::Cow;

use trellis_core::{Headers, RequestHandle};

use crate::query::QueryString;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// A request as a transport hands it to the engine.
///
/// ```
/// use trellis_http::HttpRequest;
/// use trellis_core::RequestHandle;
///
/// let request = HttpRequest::new("GET", "/search?q=trie+router");
/// assert_eq!(request.path(), "/search");
/// assert_eq!(request.query("q").as_deref(), Some("trie router"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct HttpRequest {
    method: String,
    path: String,
    query: String,
    headers: Headers,
    body: Vec<u8>,
}

impl HttpRequest {
    /// Create a request from a method token and a request target.
    ///
    /// The target is split at the first `?` into path and query string.
    #[must_use]
    pub fn new(method: impl Into<String>, target: &str) -> Self {
        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        Self {
            method: method.into(),
            path: path.to_owned(),
            query: query.to_owned(),
            ..Self::default()
        }
    }

    /// Add a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Set the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Set an urlencoded form body and its content type.
    #[must_use]
    pub fn with_form(self, body: impl Into<Vec<u8>>) -> Self {
        self.with_header("content-type", FORM_CONTENT_TYPE)
            .with_body(body)
    }

    /// The method token.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The path, without the query string.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The raw query string.
    #[must_use]
    pub fn query_string(&self) -> QueryString<'_> {
        QueryString::parse(&self.query)
    }

    /// Request headers.
    #[must_use]
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Raw body bytes.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The body as urlencoded form data, if it is declared and valid UTF-8.
    #[must_use]
    pub fn form(&self) -> Option<QueryString<'_>> {
        let content_type = self.headers.get("content-type")?;
        let essence = content_type.split(';').next().unwrap_or_default().trim();
        if !essence.eq_ignore_ascii_case(FORM_CONTENT_TYPE) {
            return None;
        }
        match std::str::from_utf8(&self.body) {
            Ok(text) => Some(QueryString::parse(text)),
            Err(err) => {
                tracing::debug!(error = %err, "form body is not UTF-8");
                None
            }
        }
    }
}

impl RequestHandle for HttpRequest {
    fn query(&self, key: &str) -> Option<Cow<'_, str>> {
        self.query_string().get_decoded(key)
    }

    fn form_value(&self, key: &str) -> Option<Cow<'_, str>> {
        self.form()
            .and_then(|form| form.get_decoded(key))
            .or_else(|| self.query(key))
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }
}
