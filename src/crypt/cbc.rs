//! AES-256-CBC payloads.
//!
//! Layout after the method tag: `[iv:16][ciphertext]`. Ciphertext is PKCS#7
//! padded to the block size.

use super::{split_framing, strip_method, CipherMethod};
use crate::error::{Result, SignatureError};
use aes::Aes256;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, KeyIvInit};

type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// AES block size, also the IV size.
pub const BLOCK_SIZE: usize = 16;

/// Decrypt an `0x0200` payload.
pub fn decrypt(payload: &[u8], key: &[u8]) -> Result<Vec<u8>> {
    let body = strip_method(payload, CipherMethod::OpenSsl)?;
    let (iv, ciphertext) = split_framing(body, BLOCK_SIZE, "initialization vector")?;

    if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(SignatureError::Decryption(
            "ciphertext is not a whole number of blocks".to_string(),
        ));
    }

    let decryptor = Aes256CbcDec::new_from_slices(key, iv)
        .map_err(|_| SignatureError::Decryption(format!("invalid key length {}", key.len())))?;

    decryptor
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| SignatureError::Decryption("invalid padding".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cbc::cipher::BlockEncryptMut;

    type Aes256CbcEnc = cbc::Encryptor<Aes256>;

    const KEY: [u8; 32] = [0x42; 32];
    const IV: [u8; 16] = [0x07; 16];

    fn seal(plaintext: &[u8]) -> Vec<u8> {
        let mut payload = CipherMethod::OpenSsl.id().to_le_bytes().to_vec();
        payload.extend_from_slice(&IV);
        payload.extend(
            Aes256CbcEnc::new(&KEY.into(), &IV.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        );
        payload
    }

    #[test]
    fn test_decrypt() {
        let payload = seal(b"J{\"result\":0}");
        assert_eq!(decrypt(&payload, &KEY).unwrap(), b"J{\"result\":0}");
    }

    #[test]
    fn test_wrong_key_fails_closed() {
        let payload = seal(b"J{\"result\":0}");
        // Wrong key yields garbage padding, which must not be returned
        let result = decrypt(&payload, &[0x43; 32]);
        if let Ok(plaintext) = result {
            assert_ne!(plaintext, b"J{\"result\":0}");
        }
    }

    #[test]
    fn test_invalid_key_length() {
        let payload = seal(b"J{}");
        let err = decrypt(&payload, b"short").unwrap_err();
        assert!(matches!(err, SignatureError::Decryption(_)));
    }

    #[test]
    fn test_truncated_framing() {
        let mut payload = CipherMethod::OpenSsl.id().to_le_bytes().to_vec();
        payload.extend_from_slice(&IV[..8]);
        assert!(matches!(decrypt(&payload, &KEY), Err(SignatureError::Decryption(_))));

        let mut payload = seal(b"J{}");
        payload.pop();
        assert!(matches!(decrypt(&payload, &KEY), Err(SignatureError::Decryption(_))));
    }

    #[test]
    fn test_rejects_foreign_tag() {
        let mut payload = seal(b"J{}");
        payload[0] = 0x01;
        assert!(matches!(decrypt(&payload, &KEY), Err(SignatureError::Decryption(_))));
    }
}
