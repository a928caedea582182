//! MessagePack struct format. Requires the `msgpack` feature.

use crate::claims::Claims;
use crate::error::{Result, SignatureError};

/// Whether the backend is compiled in.
pub const AVAILABLE: bool = cfg!(feature = "msgpack");

#[cfg(feature = "msgpack")]
pub(super) fn encode(claims: &Claims) -> Result<Vec<u8>> {
    rmp_serde::to_vec(claims).map_err(|e| SignatureError::Misuse(e.to_string()))
}

#[cfg(feature = "msgpack")]
pub(super) fn decode(body: &[u8]) -> Result<Claims> {
    let value: serde_json::Value =
        rmp_serde::from_slice(body).map_err(|e| SignatureError::Deserialization(e.to_string()))?;
    super::into_claims(value)
}

#[cfg(not(feature = "msgpack"))]
pub(super) fn encode(_claims: &Claims) -> Result<Vec<u8>> {
    Err(SignatureError::DependencyUnavailable("rmp-serde"))
}

#[cfg(not(feature = "msgpack"))]
pub(super) fn decode(_body: &[u8]) -> Result<Claims> {
    Err(SignatureError::DependencyUnavailable("rmp-serde"))
}

#[cfg(all(test, feature = "msgpack"))]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_map() {
        // {"result": 6, "b.ua": "UA"}
        let body = b"\x82\xa6result\x06\xa4b.ua\xa2UA";
        let claims = decode(body).unwrap();
        assert_eq!(claims.get("result"), Some(&json!(6)));
        assert_eq!(claims.get("b.ua"), Some(&json!("UA")));
    }

    #[test]
    fn test_encode_decode() {
        let claims = json!({"ipv6.ip": "2001:db8::1", "ipv6.v": 8})
            .as_object()
            .cloned()
            .unwrap();
        assert_eq!(decode(&encode(&claims).unwrap()).unwrap(), claims);
    }

    #[test]
    fn test_decode_truncated() {
        assert!(matches!(decode(b"\x82\xa6res"), Err(SignatureError::Deserialization(_))));
    }

    #[test]
    fn test_decode_non_map() {
        assert!(matches!(decode(b"\x93\x01\x02\x03"), Err(SignatureError::Deserialization(_))));
    }
}
