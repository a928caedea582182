//! AES-256-GCM payloads.
//!
//! Layout after the method tag: `[nonce:16][tag:16][ciphertext]`. The nonce is
//! 16 bytes rather than the usual 12, so the cipher is instantiated with a
//! custom nonce size.

use super::{split_framing, strip_method, CipherMethod};
use crate::error::{Result, SignatureError};
use aes_gcm::aead::consts::U16;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::AesGcm;

type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// Nonce size.
pub const NONCE_SIZE: usize = 16;

/// Authentication tag size.
pub const TAG_SIZE: usize = 16;

/// Decrypt and authenticate an `0x0201` payload.
pub fn decrypt(payload: &[u8], key: &[u8]) -> Result<Vec<u8>> {
    let body = strip_method(payload, CipherMethod::OpenSslAead)?;
    let (nonce, rest) = split_framing(body, NONCE_SIZE, "nonce")?;
    let (tag, ciphertext) = split_framing(rest, TAG_SIZE, "authentication tag")?;

    let cipher = Aes256Gcm16::new_from_slice(key)
        .map_err(|_| SignatureError::Decryption(format!("invalid key length {}", key.len())))?;

    let mut buffer = ciphertext.to_vec();
    cipher
        .decrypt_in_place_detached(
            GenericArray::from_slice(nonce),
            b"",
            &mut buffer,
            GenericArray::from_slice(tag),
        )
        .map_err(|_| SignatureError::Decryption("authentication failed".to_string()))?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; 32] = [0x11; 32];
    const NONCE: [u8; 16] = [0x22; 16];

    fn seal(plaintext: &[u8]) -> Vec<u8> {
        let cipher = Aes256Gcm16::new_from_slice(&KEY).unwrap();
        let mut buffer = plaintext.to_vec();
        let tag = cipher
            .encrypt_in_place_detached(GenericArray::from_slice(&NONCE), b"", &mut buffer)
            .unwrap();

        let mut payload = CipherMethod::OpenSslAead.id().to_le_bytes().to_vec();
        payload.extend_from_slice(&NONCE);
        payload.extend_from_slice(&tag);
        payload.extend(buffer);
        payload
    }

    #[test]
    fn test_decrypt() {
        let payload = seal(b"M\x80");
        assert_eq!(decrypt(&payload, &KEY).unwrap(), b"M\x80");
    }

    #[test]
    fn test_flipped_tag_bit_is_rejected() {
        let mut payload = seal(b"J{\"result\":9}");
        payload[2 + NONCE_SIZE] ^= 0x01;
        let err = decrypt(&payload, &KEY).unwrap_err();
        assert!(matches!(err, SignatureError::Decryption(_)));
    }

    #[test]
    fn test_flipped_ciphertext_bit_is_rejected() {
        let mut payload = seal(b"J{\"result\":9}");
        let last = payload.len() - 1;
        payload[last] ^= 0x80;
        assert!(decrypt(&payload, &KEY).is_err());
    }

    #[test]
    fn test_wrong_key() {
        let payload = seal(b"J{}");
        assert!(matches!(decrypt(&payload, &[0x12; 32]), Err(SignatureError::Decryption(_))));
    }

    #[test]
    fn test_missing_tag() {
        let mut payload = CipherMethod::OpenSslAead.id().to_le_bytes().to_vec();
        payload.extend_from_slice(&NONCE);
        payload.extend_from_slice(&[0u8; 4]);
        assert!(matches!(decrypt(&payload, &KEY), Err(SignatureError::Decryption(_))));
    }
}
