//! Serializer capability used by the coordinator.
//!
//! Storage never looks inside content; it only needs to turn caller
//! values into text and back. [`JsonCodec`] is the default.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to encode value: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode stored content: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Encode values to text and decode them back.
pub trait Codec: Send + Sync {
    /// Encode `value`. `pretty` selects the human-readable layout.
    fn encode<T: Serialize + ?Sized>(&self, value: &T, pretty: bool) -> Result<String, CodecError>;

    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, CodecError>;
}

/// serde_json, compact or pretty. HTML characters are never escaped.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize + ?Sized>(&self, value: &T, pretty: bool) -> Result<String, CodecError> {
        if pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        }
        .map_err(CodecError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, CodecError> {
        serde_json::from_str(text).map_err(CodecError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Book {
        title: String,
    }

    #[test]
    fn test_compact_has_no_whitespace() {
        let text = JsonCodec.encode(&json!({"title": "Foo"}), false).unwrap();
        assert_eq!(text, r#"{"title":"Foo"}"#);
    }

    #[test]
    fn test_pretty_is_multiline() {
        let text = JsonCodec.encode(&json!({"title": "Foo"}), true).unwrap();
        assert!(text.contains('\n'));
        assert!(text.contains("  \"title\": \"Foo\""));
    }

    #[test]
    fn test_html_is_not_escaped() {
        let text = JsonCodec.encode("<b>&</b>", false).unwrap();
        assert_eq!(text, "\"<b>&</b>\"");
    }

    #[test]
    fn test_decode_struct() {
        let book: Book = JsonCodec.decode(r#"{"title":"Dune"}"#).unwrap();
        assert_eq!(book, Book { title: "Dune".to_string() });
    }

    #[test]
    fn test_decode_garbage_is_error() {
        let result: Result<Book, _> = JsonCodec.decode("not json");
        assert!(matches!(result, Err(CodecError::Decode(_))));
    }
}
