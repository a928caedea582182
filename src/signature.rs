//! Version 5 signatures.
//!
//! Wire format after text decoding:
//!
//! ```text
//! [version:u8][length:u16][zone_id:u64]   big-endian header, 11 bytes
//! [method:u16 LE][cipher framing][ciphertext]
//! ```
//!
//! The ciphertext decrypts to `[format marker][encoded claims]`.

use crate::claims::{ClaimVerifier, Claims};
use crate::crypt::CipherMethod;
use crate::error::{Result, SignatureError};
use crate::formatter::{Base64Formatter, Formatter};
use crate::judge::Judgement;
use crate::key::KeySource;
use crate::structs::StructFormat;
use std::net::IpAddr;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

/// Supported signature generation.
pub const VERSION: u8 = 5;

/// Header size in bytes.
pub const HEADER_LENGTH: usize = 11;

/// Fixed signature header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Signature generation
    pub version: u8,
    /// Minimum length of the encrypted payload
    pub length: u16,
    /// Zone the signature was issued for
    pub zone_id: u64,
}

impl SignatureHeader {
    /// Split decoded signature bytes into header and encrypted payload.
    ///
    /// Fails if there is nothing after the header, if the version is not
    /// [`VERSION`], or if the payload is shorter than the declared length.
    pub fn parse(data: &[u8]) -> Result<(Self, &[u8])> {
        if data.len() <= HEADER_LENGTH {
            return Err(SignatureError::Malformed);
        }
        let (header, payload) = data.split_at(HEADER_LENGTH);

        let version = header[0];
        if version != VERSION {
            return Err(SignatureError::Version { found: version, expected: VERSION });
        }

        let length = u16::from_be_bytes([header[1], header[2]]);
        let mut zone = [0u8; 8];
        zone.copy_from_slice(&header[3..HEADER_LENGTH]);
        let zone_id = u64::from_be_bytes(zone);

        if payload.len() < usize::from(length) {
            return Err(SignatureError::Truncated {
                declared: usize::from(length),
                actual: payload.len(),
            });
        }

        Ok((Self { version, length, zone_id }, payload))
    }

    /// Encode the header.
    pub fn to_bytes(&self) -> [u8; HEADER_LENGTH] {
        let mut out = [0u8; HEADER_LENGTH];
        out[0] = self.version;
        out[1..3].copy_from_slice(&self.length.to_be_bytes());
        out[3..].copy_from_slice(&self.zone_id.to_be_bytes());
        out
    }
}

/// A version 5 signature: decoded claims plus verification state.
#[derive(Debug, Clone, Default)]
pub struct Signature5 {
    zone_id: Option<u64>,
    payload: Option<Claims>,
    result: Option<i64>,
    matched_ip: Option<IpAddr>,
}

impl Signature5 {
    /// Create an unverified signature.
    pub fn new(zone_id: Option<u64>, payload: Option<Claims>) -> Self {
        Self {
            zone_id,
            payload,
            result: None,
            matched_ip: None,
        }
    }

    /// Decode, decrypt and verify a signature in one step.
    pub fn create_from_request<S: AsRef<str>>(
        signature: &str,
        ip_addresses: &[S],
        user_agent: &str,
        keys: &KeySource,
        formatter: Option<&dyn Formatter>,
    ) -> Result<Self> {
        let mut obj = Self::default();
        obj.parse(signature, keys, formatter)?;
        obj.verify(ip_addresses, user_agent)?;
        Ok(obj)
    }

    /// Zone id from the header.
    pub fn zone_id(&self) -> Option<u64> {
        self.zone_id
    }

    /// Set the zone id.
    pub fn set_zone_id(&mut self, zone_id: u64) {
        self.zone_id = Some(zone_id);
    }

    /// Decoded claims.
    pub fn payload(&self) -> Option<&Claims> {
        self.payload.as_ref()
    }

    /// Replace the claims. Any previous verification is discarded.
    pub fn set_payload(&mut self, payload: Claims) {
        self.payload = Some(payload);
        self.reset_verification();
    }

    /// Verdict code. Only available after a successful [`verify`](Self::verify).
    pub fn result(&self) -> Result<i64> {
        self.result.ok_or(SignatureError::ResultUnavailable)
    }

    /// Verdict looked up in the verdict table. `None` for codes outside it.
    pub fn judgement(&self) -> Result<Option<Judgement>> {
        self.result().map(Judgement::from_result)
    }

    /// Candidate address that satisfied the IP check.
    pub fn matched_ip(&self) -> Option<IpAddr> {
        self.matched_ip
    }

    /// Returns true after a successful verification.
    pub fn is_verified(&self) -> bool {
        self.result.is_some()
    }

    /// Decode and decrypt a signature, replacing this object's claims.
    ///
    /// Uses the default formatter (URL-safe, unpadded, strict) when none is given.
    pub fn parse(
        &mut self,
        signature: &str,
        keys: &KeySource,
        formatter: Option<&dyn Formatter>,
    ) -> Result<()> {
        self.reset_verification();
        self.zone_id = None;
        self.payload = None;

        let data = match formatter {
            Some(formatter) => formatter.parse(signature)?,
            None => Base64Formatter::default().parse(signature)?,
        };

        let (header, encrypted) = SignatureHeader::parse(&data)?;
        debug!(
            zone_id = header.zone_id,
            declared_length = header.length,
            payload_length = encrypted.len(),
            "Signature header parsed"
        );

        let key = keys.resolve(header.zone_id)?;

        let method = CipherMethod::from_payload(encrypted)?;
        debug!(zone_id = header.zone_id, method = %method, "Decrypting signature payload");
        let plaintext = Zeroizing::new(method.decrypt(encrypted, &key)?);

        let format = StructFormat::from_payload(&plaintext)?;
        debug!(zone_id = header.zone_id, format = %format, "Decoding signature payload");
        let payload = format.unpack(&plaintext)?;

        self.zone_id = Some(header.zone_id);
        self.payload = Some(payload);
        Ok(())
    }

    /// Check the claims against the request's candidate IPs and user agent.
    ///
    /// On success the verdict becomes available through [`result`](Self::result).
    pub fn verify<S: AsRef<str>>(&mut self, ip_addresses: &[S], user_agent: &str) -> Result<()> {
        self.reset_verification();

        let payload = self
            .payload
            .as_ref()
            .ok_or_else(|| SignatureError::Misuse("signature has no payload to verify".to_string()))?;

        match ClaimVerifier::new(payload).verify(ip_addresses, user_agent) {
            Ok(verification) => {
                info!(
                    zone_id = ?self.zone_id,
                    matched_ip = %verification.matched_ip,
                    result = verification.result,
                    "Signature verified"
                );
                self.result = Some(verification.result);
                self.matched_ip = Some(verification.matched_ip);
                Ok(())
            }
            Err(err) => {
                warn!(
                    zone_id = ?self.zone_id,
                    error = err.kind(),
                    "Signature verification failed"
                );
                Err(err)
            }
        }
    }

    fn reset_verification(&mut self) {
        self.result = None;
        self.matched_ip = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn header_bytes(version: u8, length: u16, zone_id: u64) -> Vec<u8> {
        SignatureHeader { version, length, zone_id }.to_bytes().to_vec()
    }

    #[test]
    fn test_header_layout() {
        let bytes = header_bytes(5, 0x0102, 42);
        assert_eq!(bytes, vec![5, 0x01, 0x02, 0, 0, 0, 0, 0, 0, 0, 42]);
    }

    #[test]
    fn test_header_parse() {
        let mut data = header_bytes(5, 3, 0x0102_0304_0506_0708);
        data.extend_from_slice(&[9, 9, 9, 9]);
        let (header, payload) = SignatureHeader::parse(&data).unwrap();
        assert_eq!(header.zone_id, 0x0102_0304_0506_0708);
        assert_eq!(header.length, 3);
        assert_eq!(payload, &[9, 9, 9, 9]);
    }

    #[test]
    fn test_header_too_short() {
        assert!(matches!(SignatureHeader::parse(&[5; 5]), Err(SignatureError::Malformed)));
        // Header alone, no payload
        let data = header_bytes(5, 0, 1);
        assert!(matches!(SignatureHeader::parse(&data), Err(SignatureError::Malformed)));
    }

    #[test]
    fn test_header_wrong_version() {
        let mut data = header_bytes(4, 1, 1);
        data.push(0);
        assert!(matches!(
            SignatureHeader::parse(&data),
            Err(SignatureError::Version { found: 4, expected: 5 })
        ));
    }

    #[test]
    fn test_header_truncated() {
        let mut data = header_bytes(5, 100, 1);
        data.extend_from_slice(&[0; 99]);
        assert!(matches!(
            SignatureHeader::parse(&data),
            Err(SignatureError::Truncated { declared: 100, actual: 99 })
        ));
    }

    #[test]
    fn test_result_unavailable_before_verify() {
        let signature = Signature5::new(Some(1), None);
        assert!(matches!(signature.result(), Err(SignatureError::ResultUnavailable)));
        assert!(!signature.is_verified());
    }

    #[test]
    fn test_verify_without_payload() {
        let mut signature = Signature5::default();
        assert!(matches!(
            signature.verify(&["127.0.0.1"], "UA"),
            Err(SignatureError::Misuse(_))
        ));
    }

    #[test]
    fn test_verify_sets_and_clears_result() {
        let claims = json!({"ipv4.ip": "192.0.2.1", "b.ua": "UA", "result": 3})
            .as_object()
            .cloned()
            .unwrap();
        let mut signature = Signature5::new(Some(7), Some(claims));

        signature.verify(&["192.0.2.1"], "UA").unwrap();
        assert_eq!(signature.result().unwrap(), 3);
        assert_eq!(signature.judgement().unwrap(), Some(Judgement::Junk));
        assert_eq!(signature.matched_ip(), Some("192.0.2.1".parse().unwrap()));

        assert!(signature.verify(&["192.0.2.1"], "other").is_err());
        assert!(matches!(signature.result(), Err(SignatureError::ResultUnavailable)));
        assert_eq!(signature.matched_ip(), None);
    }

    #[test]
    fn test_set_payload_discards_verification() {
        let claims = json!({"ipv4.ip": "192.0.2.1", "b.ua": "UA", "result": 0})
            .as_object()
            .cloned()
            .unwrap();
        let mut signature = Signature5::new(None, Some(claims.clone()));
        signature.verify(&["192.0.2.1"], "UA").unwrap();

        signature.set_payload(claims);
        assert!(!signature.is_verified());
    }

    #[test]
    fn test_parse_bad_encoding() {
        let claims = json!({"ipv4.ip": "192.0.2.1", "b.ua": "UA", "result": 0});
        let mut signature = Signature5::new(Some(1), claims.as_object().cloned());
        let keys = KeySource::constant(vec![0u8; 32]);
        assert!(matches!(
            signature.parse("not base64!", &keys, None),
            Err(SignatureError::Encoding(_))
        ));
        assert_eq!(signature.payload(), None);
        assert_eq!(signature.zone_id(), None);
        assert!(matches!(
            signature.verify(&["192.0.2.1"], "UA"),
            Err(SignatureError::Misuse(_))
        ));
        assert!(!signature.is_verified());
    }
}
