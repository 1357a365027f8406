//! Request-side types and the transport's request capabilities.

use std::borrow::Cow;
use std::collections::HashMap;

/// HTTP headers collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    inner: HashMap<String, String>,
}

impl Headers {
    /// Create empty headers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a header value by name (case-insensitive).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Insert a header, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner
            .insert(name.into().to_ascii_lowercase(), value.into());
    }

    /// Check whether a header is present (case-insensitive).
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(&name.to_ascii_lowercase())
    }

    /// Iterate over all headers as (name, value) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Returns the number of headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if there are no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Read access to the inbound request, supplied by the transport.
///
/// The dispatcher never looks inside; handlers reach it through
/// [`Context`](crate::Context) accessors.
pub trait RequestHandle {
    /// First query-string value for `key`, decoded.
    fn query(&self, key: &str) -> Option<Cow<'_, str>>;

    /// Form value for `key`, decoded.
    fn form_value(&self, key: &str) -> Option<Cow<'_, str>>;

    /// Header value by name (case-insensitive).
    fn header(&self, name: &str) -> Option<&str>;
}
