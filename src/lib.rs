//! Adscore signature verification for Zentinel
//!
//! Verifies version 5 signatures carrying the bot-detection verdict of the
//! Adscore scoring service. A signature is decoded from its text form,
//! decrypted with the zone's key, deserialized into claims, and checked
//! against the request's candidate IPs and user agent.
//!
//! # Features
//!
//! - Base64 text formats (standard/URL-safe, padded/unpadded)
//! - AES-256-CBC, AES-256-GCM and secret-box (XSalsa20-Poly1305) payloads
//! - JSON, PHP `serialize()`, MessagePack and RFC 3986 query-string claims
//! - Byte-prefix IP matching and exact user-agent matching
//!
//! Optional backends: `secretbox` and `msgpack` (both on by default).
//!
//! # Example
//!
//! ```ignore
//! use zentinel_adscore_signature::{Judgement, KeySource, Signature5};
//!
//! let keys = KeySource::constant(key_bytes);
//! let signature = Signature5::create_from_request(
//!     token,
//!     &["203.0.113.9"],
//!     "Mozilla/5.0 ...",
//!     &keys,
//!     None,
//! )?;
//! let verdict = signature.judgement()?;
//! ```

pub mod claims;
pub mod config;
pub mod crypt;
pub mod error;
pub mod formatter;
pub mod judge;
pub mod key;
pub mod signature;
pub mod structs;

pub use claims::{ClaimVerifier, Claims};
pub use config::VerifierConfig;
pub use crypt::CipherMethod;
pub use error::{Result, SignatureError};
pub use formatter::{Base64Formatter, Base64Variant, Formatter};
pub use judge::Judgement;
pub use key::{KeyResolver, KeySource, ZoneKeyring};
pub use signature::{Signature5, SignatureHeader};
pub use structs::StructFormat;
