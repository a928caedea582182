//! PHP `serialize()` struct format.
//!
//! Supports the scalar types, arrays and plain objects. Arrays with keys
//! `0..n` in order decode to JSON arrays, everything else to maps with string
//! keys. Objects decode to maps; the class name is dropped.

use super::into_claims;
use crate::claims::Claims;
use crate::error::{Result, SignatureError};
use serde_json::{Map, Number, Value};

/// Nesting limit for arrays and objects.
const MAX_DEPTH: usize = 64;

pub(super) fn encode(claims: &Claims) -> Vec<u8> {
    let mut out = Vec::new();
    write_map(&mut out, claims);
    out
}

pub(super) fn decode(body: &[u8]) -> Result<Claims> {
    let mut parser = Parser { input: body, pos: 0 };
    let value = parser.value(0)?;
    if parser.pos != body.len() {
        return Err(parser.error("trailing data"));
    }
    into_claims(value)
}

fn write_value(out: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Null => out.extend_from_slice(b"N;"),
        Value::Bool(b) => out.extend_from_slice(if *b { b"b:1;" } else { b"b:0;" }),
        Value::Number(n) => {
            if n.is_f64() {
                out.extend_from_slice(format!("d:{};", n).as_bytes());
            } else {
                out.extend_from_slice(format!("i:{};", n).as_bytes());
            }
        }
        Value::String(s) => write_string(out, s),
        Value::Array(items) => {
            out.extend_from_slice(format!("a:{}:{{", items.len()).as_bytes());
            for (index, item) in items.iter().enumerate() {
                out.extend_from_slice(format!("i:{};", index).as_bytes());
                write_value(out, item);
            }
            out.push(b'}');
        }
        Value::Object(map) => write_map(out, map),
    }
}

fn write_map(out: &mut Vec<u8>, map: &Map<String, Value>) {
    out.extend_from_slice(format!("a:{}:{{", map.len()).as_bytes());
    for (key, value) in map {
        write_string(out, key);
        write_value(out, value);
    }
    out.push(b'}');
}

fn write_string(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(format!("s:{}:\"", s.len()).as_bytes());
    out.extend_from_slice(s.as_bytes());
    out.extend_from_slice(b"\";");
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, what: &str) -> SignatureError {
        SignatureError::Deserialization(format!("invalid serialized data at offset {}: {what}", self.pos))
    }

    fn expect(&mut self, byte: u8) -> Result<()> {
        if self.input.get(self.pos) == Some(&byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", char::from(byte))))
        }
    }

    /// Read up to (not including) `end`, consuming the terminator.
    fn until(&mut self, end: u8) -> Result<&'a str> {
        let input = self.input;
        let rest = &input[self.pos..];
        let len = rest
            .iter()
            .position(|b| *b == end)
            .ok_or_else(|| self.error(&format!("missing '{}'", char::from(end))))?;
        let token = std::str::from_utf8(&rest[..len]).map_err(|_| self.error("invalid UTF-8"))?;
        self.pos += len + 1;
        Ok(token)
    }

    fn length(&mut self) -> Result<usize> {
        let token = self.until(b':')?;
        token.parse().map_err(|_| self.error("invalid length"))
    }

    fn value(&mut self, depth: usize) -> Result<Value> {
        let tag = *self.input.get(self.pos).ok_or_else(|| self.error("unexpected end"))?;
        self.pos += 1;

        match tag {
            b'N' => {
                self.expect(b';')?;
                Ok(Value::Null)
            }
            b'b' => {
                self.expect(b':')?;
                match self.until(b';')? {
                    "0" => Ok(Value::Bool(false)),
                    "1" => Ok(Value::Bool(true)),
                    _ => Err(self.error("invalid boolean")),
                }
            }
            b'i' => {
                self.expect(b':')?;
                let token = self.until(b';')?;
                token
                    .parse::<i64>()
                    .map(Value::from)
                    .map_err(|_| self.error("invalid integer"))
            }
            b'd' => {
                self.expect(b':')?;
                let token = self.until(b';')?;
                token
                    .parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(|| self.error("invalid or non-finite float"))
            }
            b's' => {
                self.expect(b':')?;
                let s = self.string()?;
                self.expect(b';')?;
                Ok(Value::String(s))
            }
            b'a' => {
                self.expect(b':')?;
                self.array(depth)
            }
            b'O' => {
                self.expect(b':')?;
                // class name
                self.string()?;
                self.expect(b':')?;
                let value = self.array(depth)?;
                match value {
                    Value::Object(_) => Ok(value),
                    Value::Array(items) => Ok(Value::Object(
                        items
                            .into_iter()
                            .enumerate()
                            .map(|(i, v)| (i.to_string(), v))
                            .collect(),
                    )),
                    _ => Err(self.error("invalid object")),
                }
            }
            _ => Err(self.error("unknown type")),
        }
    }

    /// `<len>:"<bytes>"`
    fn string(&mut self) -> Result<String> {
        let len = self.length()?;
        self.expect(b'"')?;
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.input.len())
            .ok_or_else(|| self.error("string exceeds input"))?;
        let s = std::str::from_utf8(&self.input[self.pos..end])
            .map_err(|_| self.error("invalid UTF-8"))?
            .to_string();
        self.pos = end;
        self.expect(b'"')?;
        Ok(s)
    }

    /// `<count>:{<key><value>...}`
    fn array(&mut self, depth: usize) -> Result<Value> {
        if depth >= MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        let count = self.length()?;
        self.expect(b'{')?;

        let mut entries = Vec::new();
        let mut sequential = true;
        for index in 0..count {
            let key = match self.value(depth + 1)? {
                Value::String(s) => {
                    sequential = false;
                    s
                }
                Value::Number(n) if n.is_i64() => {
                    if n.as_i64() != i64::try_from(index).ok() {
                        sequential = false;
                    }
                    n.to_string()
                }
                _ => return Err(self.error("invalid array key")),
            };
            let value = self.value(depth + 1)?;
            entries.push((key, value));
        }
        self.expect(b'}')?;

        if sequential && count > 0 {
            Ok(Value::Array(entries.into_iter().map(|(_, v)| v).collect()))
        } else {
            Ok(Value::Object(entries.into_iter().collect()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_claims() {
        let body = br#"a:3:{s:7:"ipv4.ip";s:11:"203.0.113.9";s:4:"b.ua";s:4:"UA-X";s:6:"result";i:9;}"#;
        let claims = decode(body).unwrap();
        assert_eq!(claims.get("ipv4.ip"), Some(&json!("203.0.113.9")));
        assert_eq!(claims.get("b.ua"), Some(&json!("UA-X")));
        assert_eq!(claims.get("result"), Some(&json!(9)));
    }

    #[test]
    fn test_decode_scalars_and_lists() {
        let body = br#"a:5:{s:1:"n";N;s:1:"t";b:1;s:1:"f";d:0.5;s:1:"l";a:2:{i:0;s:1:"x";i:1;i:-2;}s:1:"e";a:0:{}}"#;
        let claims = decode(body).unwrap();
        assert_eq!(claims.get("n"), Some(&Value::Null));
        assert_eq!(claims.get("t"), Some(&json!(true)));
        assert_eq!(claims.get("f"), Some(&json!(0.5)));
        assert_eq!(claims.get("l"), Some(&json!(["x", -2])));
        assert_eq!(claims.get("e"), Some(&json!({})));
    }

    #[test]
    fn test_decode_sparse_keys_as_map() {
        let claims = decode(br#"a:2:{i:0;s:1:"a";i:5;s:1:"b";}"#).unwrap();
        assert_eq!(claims.get("0"), Some(&json!("a")));
        assert_eq!(claims.get("5"), Some(&json!("b")));
    }

    #[test]
    fn test_decode_object() {
        let claims = decode(br#"O:8:"stdClass":1:{s:6:"result";i:3;}"#).unwrap();
        assert_eq!(claims.get("result"), Some(&json!(3)));
    }

    #[test]
    fn test_string_length_is_bytes() {
        let claims = decode("a:1:{s:1:\"k\";s:2:\"\u{e9}\";}".as_bytes()).unwrap();
        assert_eq!(claims.get("k"), Some(&json!("\u{e9}")));
    }

    #[test]
    fn test_decode_malformed() {
        for body in [
            &b"a:1:{s:1:\"k\";"[..],
            b"a:1:{s:9:\"k\";i:1;}",
            b"a:1:{s:1:\"k\";i:x;}",
            b"a:1:{s:1:\"k\";i:1;}junk",
            b"q:1;",
            b"",
        ] {
            assert!(
                matches!(decode(body), Err(SignatureError::Deserialization(_))),
                "should reject {:?}",
                String::from_utf8_lossy(body)
            );
        }
    }

    #[test]
    fn test_decode_depth_limit() {
        let mut body = Vec::new();
        for _ in 0..100 {
            body.extend_from_slice(b"a:1:{i:0;");
        }
        body.extend_from_slice(b"N;");
        body.extend(std::iter::repeat(b'}').take(100));
        assert!(matches!(decode(&body), Err(SignatureError::Deserialization(_))));
    }

    #[test]
    fn test_encode_decode() {
        let claims = json!({"ipv4.ip": "10.0.0.1", "ipv4.v": 2, "list": ["a", 1], "ok": false})
            .as_object()
            .cloned()
            .unwrap();
        assert_eq!(decode(&encode(&claims)).unwrap(), claims);
    }
}
