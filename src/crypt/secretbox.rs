//! XSalsa20-Poly1305 secret box payloads.
//!
//! Layout after the method tag: `[nonce:24][tag || ciphertext]`, the combined
//! form used by NaCl's `crypto_secretbox`. Requires the `secretbox` feature.

use super::{split_framing, strip_method, CipherMethod};
use crate::error::{Result, SignatureError};

/// Secret box nonce size.
pub const NONCE_SIZE: usize = 24;

/// Whether the backend is compiled in.
pub const AVAILABLE: bool = cfg!(feature = "secretbox");

/// Decrypt and authenticate an `0x0101` payload.
pub fn decrypt(payload: &[u8], key: &[u8]) -> Result<Vec<u8>> {
    let body = strip_method(payload, CipherMethod::Secretbox)?;
    let (nonce, sealed) = split_framing(body, NONCE_SIZE, "nonce")?;
    open(nonce, sealed, key)
}

#[cfg(feature = "secretbox")]
fn open(nonce: &[u8], sealed: &[u8], key: &[u8]) -> Result<Vec<u8>> {
    use crypto_secretbox::aead::generic_array::GenericArray;
    use crypto_secretbox::aead::{Aead, KeyInit};
    use crypto_secretbox::XSalsa20Poly1305;

    let cipher = XSalsa20Poly1305::new_from_slice(key)
        .map_err(|_| SignatureError::Decryption(format!("invalid key length {}", key.len())))?;

    cipher
        .decrypt(GenericArray::from_slice(nonce), sealed)
        .map_err(|_| SignatureError::Decryption("authentication failed".to_string()))
}

#[cfg(not(feature = "secretbox"))]
fn open(_nonce: &[u8], _sealed: &[u8], _key: &[u8]) -> Result<Vec<u8>> {
    Err(SignatureError::DependencyUnavailable("crypto_secretbox"))
}
