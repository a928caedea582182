//! Symmetric decryption of signature payloads.
//!
//! The first two bytes of an encrypted payload are a little-endian method tag
//! selecting one of the ciphers below. Each cipher re-checks the tag before it
//! touches the rest of the payload.

pub mod aead;
pub mod cbc;
pub mod secretbox;

use crate::error::{Result, SignatureError};
use std::fmt;
use std::str::FromStr;

/// Size of the method tag at the start of an encrypted payload.
pub const METHOD_SIZE: usize = 2;

/// Supported encryption methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipherMethod {
    /// AES-256-CBC, method `0x0200`
    OpenSsl,
    /// AES-256-GCM, method `0x0201`
    OpenSslAead,
    /// XSalsa20-Poly1305 secret box, method `0x0101`
    Secretbox,
}

impl CipherMethod {
    /// All methods, in registry order.
    pub const ALL: [CipherMethod; 3] = [
        CipherMethod::OpenSsl,
        CipherMethod::OpenSslAead,
        CipherMethod::Secretbox,
    ];

    /// Wire identifier of the method.
    pub fn id(&self) -> u16 {
        match self {
            CipherMethod::OpenSsl => 0x0200,
            CipherMethod::OpenSslAead => 0x0201,
            CipherMethod::Secretbox => 0x0101,
        }
    }

    /// Look up a method by wire identifier.
    pub fn from_id(id: u16) -> Result<Self> {
        match id {
            0x0200 => Ok(CipherMethod::OpenSsl),
            0x0201 => Ok(CipherMethod::OpenSslAead),
            0x0101 => Ok(CipherMethod::Secretbox),
            other => Err(SignatureError::UnsupportedCipher(other)),
        }
    }

    /// Select the method named by the tag at the start of `payload`.
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        Self::from_id(read_method(payload)?)
    }

    /// Name used in configuration and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            CipherMethod::OpenSsl => "openssl",
            CipherMethod::OpenSslAead => "opensslaead",
            CipherMethod::Secretbox => "secretbox",
        }
    }

    /// Whether the backend for this method is compiled in.
    pub fn is_available(&self) -> bool {
        match self {
            CipherMethod::OpenSsl | CipherMethod::OpenSslAead => true,
            CipherMethod::Secretbox => secretbox::AVAILABLE,
        }
    }

    /// Decrypt a full encrypted payload (tag included) with `key`.
    pub fn decrypt(&self, payload: &[u8], key: &[u8]) -> Result<Vec<u8>> {
        match self {
            CipherMethod::OpenSsl => cbc::decrypt(payload, key),
            CipherMethod::OpenSslAead => aead::decrypt(payload, key),
            CipherMethod::Secretbox => secretbox::decrypt(payload, key),
        }
    }
}

impl fmt::Display for CipherMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:04x})", self.as_str(), self.id())
    }
}

impl FromStr for CipherMethod {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openssl" => Ok(CipherMethod::OpenSsl),
            "opensslaead" => Ok(CipherMethod::OpenSslAead),
            "secretbox" => Ok(CipherMethod::Secretbox),
            other => Err(SignatureError::Misuse(format!(
                "unknown encryption method name: {other}"
            ))),
        }
    }
}

/// Select the method from the payload tag and decrypt.
pub fn decrypt_payload(payload: &[u8], key: &[u8]) -> Result<Vec<u8>> {
    CipherMethod::from_payload(payload)?.decrypt(payload, key)
}

fn read_method(payload: &[u8]) -> Result<u16> {
    match payload {
        [lo, hi, ..] => Ok(u16::from_le_bytes([*lo, *hi])),
        _ => Err(SignatureError::Decryption(
            "payload too short for method tag".to_string(),
        )),
    }
}

/// Check that `payload` carries the tag for `method` and return what follows it.
fn strip_method(payload: &[u8], method: CipherMethod) -> Result<&[u8]> {
    if read_method(payload)? != method.id() {
        return Err(SignatureError::Decryption(
            "unexpected encryption method".to_string(),
        ));
    }
    Ok(&payload[METHOD_SIZE..])
}

/// Split `len` framing bytes off the front of `body`.
fn split_framing<'a>(body: &'a [u8], len: usize, what: &str) -> Result<(&'a [u8], &'a [u8])> {
    if body.len() < len {
        return Err(SignatureError::Decryption(format!("payload too short for {what}")));
    }
    Ok(body.split_at(len))
}
