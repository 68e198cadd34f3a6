//! Text/bytes payloads moved over a link
//!
//! Links carry opaque bytes, but callers talk to modems and line-oriented
//! devices in text as often as in binary. A [`Payload`] keeps both forms:
//! outgoing text is encoded as UTF-8, and incoming bytes are surfaced as text
//! whenever they decode cleanly.

use bytes::Bytes;
use std::fmt;

/// Data written to or read from a link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// UTF-8 text
    Text(String),
    /// Raw bytes that are not (or must not be treated as) text
    Bytes(Bytes),
}

impl Payload {
    /// Build a payload from received bytes
    ///
    /// Returns [`Payload::Text`] when the bytes are valid UTF-8, otherwise
    /// [`Payload::Bytes`]. Binary data that happens to be valid UTF-8 is
    /// returned as text; use [`Payload::Bytes`] directly to avoid that.
    pub fn from_received(data: Bytes) -> Self {
        match std::str::from_utf8(&data) {
            Ok(text) => Payload::Text(text.to_owned()),
            Err(_) => Payload::Bytes(data),
        }
    }

    /// Bytes as they appear on the wire
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Payload::Text(text) => text.as_bytes(),
            Payload::Bytes(bytes) => bytes,
        }
    }

    /// Consume the payload and return its wire bytes
    pub fn into_bytes(self) -> Bytes {
        match self {
            Payload::Text(text) => Bytes::from(text),
            Payload::Bytes(bytes) => bytes,
        }
    }

    /// Text content, if this is a text payload
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(text) => Some(text),
            Payload::Bytes(_) => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Payload::Text(_))
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

/// Render bytes as space-separated uppercase hex pairs, e.g. `06 FF`
pub fn hex_pairs(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 3);
    for (i, byte) in data.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&format!("{:02X}", byte));
    }
    out
}

/// Log rendering: quoted text, or hex pairs for binary data
impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Text(text) => write!(f, "{:?}", text),
            Payload::Bytes(bytes) => f.write_str(&hex_pairs(bytes)),
        }
    }
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Payload::Text(value.to_owned())
    }
}

impl From<String> for Payload {
    fn from(value: String) -> Self {
        Payload::Text(value)
    }
}

impl From<&[u8]> for Payload {
    fn from(value: &[u8]) -> Self {
        Payload::Bytes(Bytes::copy_from_slice(value))
    }
}

impl<const N: usize> From<&[u8; N]> for Payload {
    fn from(value: &[u8; N]) -> Self {
        Payload::Bytes(Bytes::copy_from_slice(value))
    }
}

impl From<Vec<u8>> for Payload {
    fn from(value: Vec<u8>) -> Self {
        Payload::Bytes(Bytes::from(value))
    }
}

impl From<Bytes> for Payload {
    fn from(value: Bytes) -> Self {
        Payload::Bytes(value)
    }
}

impl PartialEq<str> for Payload {
    fn eq(&self, other: &str) -> bool {
        self.as_text() == Some(other)
    }
}

impl PartialEq<&str> for Payload {
    fn eq(&self, other: &&str) -> bool {
        self.as_text() == Some(*other)
    }
}
