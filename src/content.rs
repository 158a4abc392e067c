//! Content codec between caller-facing values and the backend wire format.
//!
//! The wire is always text. Raw reads arrive as base64 and decode into
//! bytes; byte writes leave as base64 with the encoding forced to `base64`;
//! structured values are serialized as indented JSON.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::Value;

use crate::options::Encoding;

/// Encoding name forced onto byte writes.
pub const BASE64_ENCODING: &str = "base64";

/// Contents a caller passes to `writeFile`.
#[derive(Debug, Clone, PartialEq)]
pub enum Contents {
    /// Plain text.
    Text(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// Structured data, serialized before it reaches the backend.
    Structured(Value),
}

impl From<&str> for Contents {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Contents {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<u8>> for Contents {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<Value> for Contents {
    fn from(value: Value) -> Self {
        Self::Structured(value)
    }
}

/// Contents yielded by `readFile`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadContents {
    /// Decoded text.
    Text(String),
    /// Raw bytes (explicit `null` encoding).
    Bytes(Vec<u8>),
    /// The file does not exist.
    Absent,
}

impl ReadContents {
    /// Returns `true` when the file exists.
    #[must_use]
    pub fn is_present(&self) -> bool {
        !matches!(self, Self::Absent)
    }

    /// Returns the text, if these are text contents.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the contents as bytes, if present.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Text(text) => Some(text.as_bytes()),
            Self::Bytes(bytes) => Some(bytes),
            Self::Absent => None,
        }
    }

    /// Short human-readable rendering for command logs.
    #[must_use]
    pub fn preview(&self) -> String {
        match self {
            Self::Text(text) => preview_text(text),
            Self::Bytes(bytes) => format!("<{} bytes>", bytes.len()),
            Self::Absent => "null".to_string(),
        }
    }
}

/// Truncates text to 80 characters for logs and messages.
#[must_use]
pub fn preview_text(text: &str) -> String {
    const MAX: usize = 80;
    if text.chars().count() > MAX {
        let head: String = text.chars().take(MAX).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

/// Text ready for the backend plus the encoding it must be written with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WirePayload {
    /// Wire contents.
    pub contents: String,
    /// Encoding the backend must apply.
    pub encoding: Encoding,
}

/// Why contents could not be encoded for the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidContents {
    /// Rendering of the rejected value.
    pub rendered: String,
}

/// Encodes write contents for the backend.
///
/// # Errors
///
/// Returns [`InvalidContents`] for structured values that are neither
/// strings, objects nor arrays.
pub fn encode(contents: Contents, encoding: Encoding) -> Result<WirePayload, InvalidContents> {
    match contents {
        Contents::Text(text) => Ok(WirePayload { contents: text, encoding }),
        Contents::Bytes(bytes) => Ok(WirePayload {
            contents: STANDARD.encode(bytes),
            encoding: Encoding::Text(BASE64_ENCODING.to_string()),
        }),
        Contents::Structured(Value::String(text)) => Ok(WirePayload { contents: text, encoding }),
        Contents::Structured(value @ (Value::Object(_) | Value::Array(_))) => {
            let contents = serde_json::to_string_pretty(&value)
                .map_err(|_| InvalidContents { rendered: value.to_string() })?;
            Ok(WirePayload { contents, encoding })
        }
        Contents::Structured(other) => Err(InvalidContents { rendered: other.to_string() }),
    }
}

/// Decodes wire contents returned by a read. `None` means the file is absent.
///
/// # Errors
///
/// Returns the decoder's message when a raw read is not valid base64.
pub fn decode(wire: Option<String>, encoding: &Encoding) -> Result<ReadContents, String> {
    match (wire, encoding) {
        (None, _) => Ok(ReadContents::Absent),
        (Some(text), Encoding::Raw) => STANDARD
            .decode(text.as_bytes())
            .map(ReadContents::Bytes)
            .map_err(|e| format!("invalid base64 payload: {e}")),
        (Some(text), Encoding::Text(_)) => Ok(ReadContents::Text(text)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_passes_through_with_caller_encoding() {
        let payload = encode(Contents::from("hello"), Encoding::Text("ascii".into())).unwrap();
        assert_eq!(payload.contents, "hello");
        assert_eq!(payload.encoding, Encoding::Text("ascii".into()));
    }

    #[test]
    fn bytes_force_base64_encoding() {
        let payload = encode(Contents::Bytes(vec![0, 159, 146, 150]), Encoding::utf8()).unwrap();
        assert_eq!(payload.contents, "AJ+Slg==");
        assert_eq!(payload.encoding, Encoding::Text("base64".into()));
    }

    #[test]
    fn structured_values_use_two_space_indent_and_sorted_keys() {
        let payload =
            encode(Contents::Structured(json!({"b": 1, "a": [true]})), Encoding::utf8()).unwrap();
        assert_eq!(payload.contents, "{\n  \"a\": [\n    true\n  ],\n  \"b\": 1\n}");
    }

    #[test]
    fn structured_string_is_sent_as_text() {
        let payload = encode(Contents::Structured(json!("plain")), Encoding::utf8()).unwrap();
        assert_eq!(payload.contents, "plain");
    }

    #[test]
    fn scalars_are_invalid_contents() {
        for value in [json!(42), json!(true), json!(null)] {
            let err = encode(Contents::Structured(value.clone()), Encoding::utf8()).unwrap_err();
            assert_eq!(err.rendered, value.to_string());
        }
    }

    #[test]
    fn decode_absent_stays_absent() {
        assert_eq!(decode(None, &Encoding::Raw).unwrap(), ReadContents::Absent);
        assert_eq!(decode(None, &Encoding::utf8()).unwrap(), ReadContents::Absent);
    }

    #[test]
    fn decode_raw_yields_bytes() {
        let contents = decode(Some("AJ+Slg==".into()), &Encoding::Raw).unwrap();
        assert_eq!(contents, ReadContents::Bytes(vec![0, 159, 146, 150]));
    }

    #[test]
    fn decode_raw_rejects_garbage() {
        let err = decode(Some("not base64!".into()), &Encoding::Raw).unwrap_err();
        assert!(err.contains("invalid base64"));
    }

    #[test]
    fn preview_truncates_long_text() {
        let contents = ReadContents::Text("x".repeat(100));
        assert_eq!(contents.preview().len(), 83);
        assert_eq!(ReadContents::Bytes(vec![1, 2]).preview(), "<2 bytes>");
        assert_eq!(ReadContents::Absent.preview(), "null");
    }
}
