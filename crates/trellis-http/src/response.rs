//! Buffered response adapter and HTTP/1.1 serialization.

use trellis_core::{ResponseHandle, StatusCode};

/// A response buffered in memory until the transport writes it out.
///
/// Behaves like a connection: once a status has been sent, or body bytes
/// have been written, the head is fixed and later status or header
/// changes are dropped.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    status: Option<StatusCode>,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl HttpResponse {
    /// Create an empty response.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The status sent, or 200 if none was.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or_default()
    }

    /// Whether the head is fixed.
    #[must_use]
    pub fn is_committed(&self) -> bool {
        self.status.is_some()
    }

    /// A header value (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Headers in the order they were first set.
    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Body bytes written so far.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body as text (lossy).
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

impl ResponseHandle for HttpResponse {
    fn set_status(&mut self, status: StatusCode) {
        if let Some(sent) = self.status {
            tracing::debug!(sent = sent.as_u16(), ignored = status.as_u16(), "status already sent");
            return;
        }
        self.status = Some(status);
    }

    fn set_header(&mut self, name: &str, value: &str) {
        if self.is_committed() {
            tracing::debug!(header = name, "header after commit dropped");
            return;
        }
        match self.headers.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
            Some((_, existing)) => value.clone_into(existing),
            None => self.headers.push((name.to_ascii_lowercase(), value.to_owned())),
        }
    }

    fn write_body(&mut self, bytes: &[u8]) {
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
        self.body.extend_from_slice(bytes);
    }
}

/// Serializes [`HttpResponse`]s as HTTP/1.1 messages.
#[derive(Debug)]
pub struct ResponseWriter {
    buffer: Vec<u8>,
}

impl ResponseWriter {
    /// Create a writer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
        }
    }

    /// Status line, headers, `content-length` and body.
    ///
    /// Any `content-length` or `transfer-encoding` header set by a handler
    /// is replaced by the computed length.
    #[must_use]
    pub fn write(&mut self, response: &HttpResponse) -> Vec<u8> {
        self.buffer.clear();

        let status = response.status();
        self.buffer.extend_from_slice(b"HTTP/1.1 ");
        self.buffer
            .extend_from_slice(status.as_u16().to_string().as_bytes());
        self.buffer.push(b' ');
        self.buffer
            .extend_from_slice(status.canonical_reason().as_bytes());
        self.buffer.extend_from_slice(b"\r\n");

        for (name, value) in response.headers() {
            if is_framing_header(name) {
                continue;
            }
            self.buffer.extend_from_slice(name.as_bytes());
            self.buffer.extend_from_slice(b": ");
            self.buffer.extend_from_slice(value.as_bytes());
            self.buffer.extend_from_slice(b"\r\n");
        }

        let body = response.body();
        self.buffer.extend_from_slice(b"content-length: ");
        self.buffer
            .extend_from_slice(body.len().to_string().as_bytes());
        self.buffer.extend_from_slice(b"\r\n\r\n");
        self.buffer.extend_from_slice(body);

        std::mem::take(&mut self.buffer)
    }
}

impl Default for ResponseWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn is_framing_header(name: &str) -> bool {
    name.eq_ignore_ascii_case("content-length") || name.eq_ignore_ascii_case("transfer-encoding")
}
