//! RFC 3986 query string struct format.
//!
//! Decoding is multi-valued: every key maps to an array of string values in
//! the order they appear. Encoding percent-encodes everything outside the
//! RFC 3986 unreserved set and repeats the key for each array element.

use crate::claims::Claims;
use crate::error::{Result, SignatureError};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;

/// Everything except ALPHA / DIGIT / "-" / "." / "_" / "~".
const RFC3986: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

pub(super) fn encode(claims: &Claims) -> Result<Vec<u8>> {
    let mut pairs = Vec::new();
    for (key, value) in claims {
        match value {
            Value::Array(items) => {
                for item in items {
                    pairs.push(pair(key, item)?);
                }
            }
            other => pairs.push(pair(key, other)?),
        }
    }
    Ok(pairs.join("&").into_bytes())
}

fn pair(key: &str, value: &Value) -> Result<String> {
    let value = match value {
        Value::Null => String::new(),
        Value::Bool(b) => (if *b { "1" } else { "0" }).to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => {
            return Err(SignatureError::Misuse(format!(
                "nested value under {key:?} cannot be query-encoded"
            )))
        }
    };
    Ok(format!(
        "{}={}",
        utf8_percent_encode(key, RFC3986),
        utf8_percent_encode(&value, RFC3986)
    ))
}

pub(super) fn decode(body: &[u8]) -> Result<Claims> {
    std::str::from_utf8(body)
        .map_err(|_| SignatureError::Deserialization("query string is not UTF-8".to_string()))?;

    let mut claims = Claims::new();
    for (key, value) in url::form_urlencoded::parse(body) {
        let entry = claims
            .entry(key.into_owned())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(values) = entry {
            values.push(Value::String(value.into_owned()));
        }
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_multi_valued() {
        let claims = decode(b"ipv4.ip=203.0.113.9&b.ua=Mozilla%2F5.0%20%28X11%29&tag=a&tag=b").unwrap();
        assert_eq!(claims.get("ipv4.ip"), Some(&json!(["203.0.113.9"])));
        assert_eq!(claims.get("b.ua"), Some(&json!(["Mozilla/5.0 (X11)"])));
        assert_eq!(claims.get("tag"), Some(&json!(["a", "b"])));
    }

    #[test]
    fn test_decode_empty() {
        assert!(decode(b"").unwrap().is_empty());
    }

    #[test]
    fn test_decode_invalid_utf8() {
        assert!(matches!(decode(b"a=\xff"), Err(SignatureError::Deserialization(_))));
    }

    #[test]
    fn test_encode_reserved_characters() {
        let claims = json!({"b.ua": "Mozilla/5.0 (X11; ~x)", "result": 9})
            .as_object()
            .cloned()
            .unwrap();
        let encoded = String::from_utf8(encode(&claims).unwrap()).unwrap();
        assert_eq!(encoded, "b.ua=Mozilla%2F5.0%20%28X11%3B%20~x%29&result=9");
    }

    #[test]
    fn test_encode_repeats_array_keys() {
        let claims = json!({"tag": ["a", "b&c"]}).as_object().cloned().unwrap();
        assert_eq!(encode(&claims).unwrap(), b"tag=a&tag=b%26c");
        assert_eq!(decode(&encode(&claims).unwrap()).unwrap(), claims);
    }

    #[test]
    fn test_encode_nested_map_rejected() {
        let claims = json!({"b": {"ua": "x"}}).as_object().cloned().unwrap();
        assert!(matches!(encode(&claims), Err(SignatureError::Misuse(_))));
    }
}
