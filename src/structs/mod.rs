//! Structured-data formats for decrypted signature payloads.
//!
//! The first byte of a plaintext is a marker naming the format of the rest.
//! Whatever the format, payloads decode to a [`Claims`] map.

pub mod json;
pub mod msgpack;
pub mod php;
pub mod query;

use crate::claims::Claims;
use crate::error::{Result, SignatureError};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Supported struct formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructFormat {
    /// JSON, marker `J`
    Json,
    /// PHP `serialize()`, marker `S`
    Serialize,
    /// MessagePack, marker `M`
    Msgpack,
    /// RFC 3986 query string, marker `H`
    Rfc3986,
}

impl StructFormat {
    /// All formats, in registry order.
    pub const ALL: [StructFormat; 4] = [
        StructFormat::Json,
        StructFormat::Serialize,
        StructFormat::Msgpack,
        StructFormat::Rfc3986,
    ];

    /// Marker byte.
    pub fn marker(&self) -> u8 {
        match self {
            StructFormat::Json => b'J',
            StructFormat::Serialize => b'S',
            StructFormat::Msgpack => b'M',
            StructFormat::Rfc3986 => b'H',
        }
    }

    /// Look up a format by marker byte.
    pub fn from_marker(marker: u8) -> Result<Self> {
        match marker {
            b'J' => Ok(StructFormat::Json),
            b'S' => Ok(StructFormat::Serialize),
            b'M' => Ok(StructFormat::Msgpack),
            b'H' => Ok(StructFormat::Rfc3986),
            other => Err(SignatureError::UnsupportedFormat(other)),
        }
    }

    /// Select the format named by the first byte of `data`.
    pub fn from_payload(data: &[u8]) -> Result<Self> {
        match data.first() {
            Some(marker) => Self::from_marker(*marker),
            None => Err(SignatureError::Deserialization("empty payload".to_string())),
        }
    }

    /// Name used in configuration and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            StructFormat::Json => "json",
            StructFormat::Serialize => "serialize",
            StructFormat::Msgpack => "msgpack",
            StructFormat::Rfc3986 => "rfc3986",
        }
    }

    /// Whether the backend for this format is compiled in.
    pub fn is_available(&self) -> bool {
        match self {
            StructFormat::Msgpack => msgpack::AVAILABLE,
            _ => true,
        }
    }

    /// Encode claims, marker included.
    pub fn pack(&self, claims: &Claims) -> Result<Vec<u8>> {
        let body = match self {
            StructFormat::Json => json::encode(claims)?,
            StructFormat::Serialize => php::encode(claims),
            StructFormat::Msgpack => msgpack::encode(claims)?,
            StructFormat::Rfc3986 => query::encode(claims)?,
        };
        let mut data = Vec::with_capacity(body.len() + 1);
        data.push(self.marker());
        data.extend(body);
        Ok(data)
    }

    /// Decode claims from marked data.
    pub fn unpack(&self, data: &[u8]) -> Result<Claims> {
        let body = self.strip_marker(data)?;
        match self {
            StructFormat::Json => json::decode(body),
            StructFormat::Serialize => php::decode(body),
            StructFormat::Msgpack => msgpack::decode(body),
            StructFormat::Rfc3986 => query::decode(body),
        }
    }

    fn strip_marker<'a>(&self, data: &'a [u8]) -> Result<&'a [u8]> {
        match data.split_first() {
            Some((marker, body)) if *marker == self.marker() => Ok(body),
            other => Err(SignatureError::FormatMismatch {
                expected: char::from(self.marker()),
                found: other.map(|(marker, _)| char::from(*marker)),
            }),
        }
    }
}

impl fmt::Display for StructFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.as_str(), char::from(self.marker()))
    }
}

impl FromStr for StructFormat {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(StructFormat::Json),
            "serialize" => Ok(StructFormat::Serialize),
            "msgpack" => Ok(StructFormat::Msgpack),
            "rfc3986" => Ok(StructFormat::Rfc3986),
            other => Err(SignatureError::Misuse(format!(
                "unknown struct format name: {other}"
            ))),
        }
    }
}

/// Select the format from the marker byte and decode.
pub fn unpack_payload(data: &[u8]) -> Result<Claims> {
    StructFormat::from_payload(data)?.unpack(data)
}

/// Require a decoded value to be a map.
fn into_claims(value: Value) -> Result<Claims> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(SignatureError::Deserialization(format!(
            "expected a map, found {}",
            value_kind(&other)
        ))),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "map",
    }
}
