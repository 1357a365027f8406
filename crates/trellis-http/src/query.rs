//! `application/x-www-form-urlencoded` parsing.
//!
//! Query strings and urlencoded form bodies share one grammar:
//! `&`-separated `key=value` pairs, `+` for space, `%XX` escapes.
//!
//! ```
//! use trellis_http::QueryString;
//!
//! let qs = QueryString::parse("tag=a&tag=b&q=hello+world");
//! assert_eq!(qs.get("tag"), Some("a"));
//! assert_eq!(qs.get_all("tag").collect::<Vec<_>>(), vec!["a", "b"]);
//! assert_eq!(qs.get_decoded("q").as_deref(), Some("hello world"));
//! ```

use std::borrow::Cow;

/// A borrowed, lazily parsed urlencoded string.
///
/// Every lookup rescans the input; the strings involved are short.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryString<'a> {
    raw: &'a str,
}

impl<'a> QueryString<'a> {
    /// Wrap `raw` (no leading `?`).
    #[must_use]
    pub fn parse(raw: &'a str) -> Self {
        Self { raw }
    }

    /// The input as given.
    #[must_use]
    pub fn raw(&self) -> &'a str {
        self.raw
    }

    /// Returns true if there is nothing to parse.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Number of pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs().count()
    }

    /// Raw pairs in input order. `flag` alone yields `("flag", "")`.
    pub fn pairs(&self) -> impl Iterator<Item = (&'a str, &'a str)> + use<'a> {
        self.raw
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
    }

    /// First raw value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.pairs().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    /// Every raw value for `key`, in input order.
    pub fn get_all<'k>(&self, key: &'k str) -> impl Iterator<Item = &'a str> + use<'a, 'k> {
        self.pairs().filter(move |(k, _)| *k == key).map(|(_, v)| v)
    }

    /// First value for `key`, percent-decoded.
    #[must_use]
    pub fn get_decoded(&self, key: &str) -> Option<Cow<'a, str>> {
        self.get(key).map(percent_decode)
    }

    /// Whether `key` appears at all.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.pairs().any(|(k, _)| k == key)
    }
}

/// Decode `%XX` escapes and `+` as space.
///
/// Borrows when there is nothing to decode. Malformed escapes pass through
/// unchanged and invalid UTF-8 is replaced lossily.
///
/// ```
/// use trellis_http::percent_decode;
///
/// assert_eq!(percent_decode("caf%C3%A9+au+lait"), "café au lait");
/// assert_eq!(percent_decode("100%"), "100%");
/// ```
#[must_use]
pub fn percent_decode(s: &str) -> Cow<'_, str> {
    if !s.bytes().any(|b| b == b'%' || b == b'+') {
        return Cow::Borrowed(s);
    }

    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut rest = bytes;
    while let Some((&b, tail)) = rest.split_first() {
        rest = tail;
        match b {
            b'+' => out.push(b' '),
            b'%' => match escaped_byte(rest) {
                Some(decoded) => {
                    out.push(decoded);
                    rest = &rest[2..];
                }
                None => out.push(b'%'),
            },
            other => out.push(other),
        }
    }
    Cow::Owned(String::from_utf8_lossy(&out).into_owned())
}

fn escaped_byte(rest: &[u8]) -> Option<u8> {
    match rest {
        [hi, lo, ..] => Some((hex_digit(*hi)? << 4) | hex_digit(*lo)?),
        _ => None,
    }
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
