use base64ct::{Base64, Encoding};
use serde::{Deserialize, Serialize};

/// Scan-resume position for pagination.
///
/// The token is a reversible, unvalidated encoding of the last row id
/// the previous page's scan evaluated. A malformed or foreign token
/// decodes to `None`, which restarts the scan from the beginning:
/// corrupt pagination state degrades to "start over", never to an
/// error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub last_key: String,
}

impl Cursor {
    pub fn new(last_key: impl Into<String>) -> Self {
        Self {
            last_key: last_key.into(),
        }
    }

    /// Encode to an opaque transport-safe token
    pub fn encode(&self) -> String {
        // A single-string struct always serializes
        let json = serde_json::to_vec(self).unwrap_or_default();
        Base64::encode_string(&json)
    }

    /// Decode a token; anything malformed is treated as "no cursor"
    pub fn decode(token: &str) -> Option<Self> {
        let bytes = Base64::decode_vec(token).ok()?;
        serde_json::from_slice(&bytes).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let cursor = Cursor::new("INC-A7X3K9");
        let token = Cursor::decode(&cursor.encode()).unwrap();
        assert_eq!(token, cursor);
        // Re-encoding the decoded cursor reproduces the token
        assert_eq!(token.encode(), cursor.encode());
    }

    #[test]
    fn test_garbage_decodes_to_none() {
        assert_eq!(Cursor::decode("not-base64!!!"), None);
        assert_eq!(Cursor::decode(""), None);
        // Valid base64, not valid JSON
        assert_eq!(Cursor::decode(&Base64::encode_string(b"hello")), None);
        // Valid JSON, wrong shape
        assert_eq!(Cursor::decode(&Base64::encode_string(b"{\"x\":1}")), None);
    }

    #[test]
    fn test_token_is_transport_safe() {
        let token = Cursor::new("INC-QQQQQQ").encode();
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '='));
    }
}
