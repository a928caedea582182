//! Text formatters mapping signature bytes to and from their wire text.

use crate::error::{Result, SignatureError};
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Reversible mapping between raw bytes and a text representation.
pub trait Formatter: Send + Sync {
    /// Encode bytes as text.
    fn format(&self, value: &[u8]) -> String;

    /// Decode text back to bytes.
    fn parse(&self, value: &str) -> Result<Vec<u8>>;
}

/// Base64 flavours, numbered as in libsodium.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Base64Variant {
    /// `+/` alphabet with `=` padding
    Original,
    /// `+/` alphabet, padding stripped
    OriginalNoPadding,
    /// `-_` alphabet with `=` padding
    UrlSafe,
    /// `-_` alphabet, padding stripped
    #[default]
    UrlSafeNoPadding,
}

impl Base64Variant {
    /// Numeric variant identifier.
    pub fn code(&self) -> u8 {
        match self {
            Base64Variant::Original => 1,
            Base64Variant::OriginalNoPadding => 3,
            Base64Variant::UrlSafe => 5,
            Base64Variant::UrlSafeNoPadding => 7,
        }
    }

    fn is_url_safe(&self) -> bool {
        matches!(self, Base64Variant::UrlSafe | Base64Variant::UrlSafeNoPadding)
    }

    fn is_padded(&self) -> bool {
        matches!(self, Base64Variant::Original | Base64Variant::UrlSafe)
    }

    fn in_alphabet(&self, c: char) -> bool {
        match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '=' => true,
            '-' | '_' => self.is_url_safe(),
            '+' | '/' => !self.is_url_safe(),
            _ => false,
        }
    }
}

/// Base64 formatter.
///
/// Output honours the variant's padding. Input padding is optional but must be
/// canonical when present. In strict mode characters outside the alphabet are
/// rejected; otherwise they are discarded before decoding.
#[derive(Debug, Clone)]
pub struct Base64Formatter {
    variant: Base64Variant,
    strict: bool,
    engine: GeneralPurpose,
    padded: GeneralPurpose,
    unpadded: GeneralPurpose,
}

impl Base64Formatter {
    /// Create a formatter for the given variant.
    pub fn new(variant: Base64Variant, strict: bool) -> Self {
        let alphabet = if variant.is_url_safe() {
            &alphabet::URL_SAFE
        } else {
            &alphabet::STANDARD
        };
        let config = GeneralPurposeConfig::new()
            .with_encode_padding(variant.is_padded())
            .with_decode_padding_mode(DecodePaddingMode::Indifferent)
            .with_decode_allow_trailing_bits(!strict);
        let padded = config.with_decode_padding_mode(DecodePaddingMode::RequireCanonical);
        let unpadded = config.with_decode_padding_mode(DecodePaddingMode::RequireNone);

        Self {
            variant,
            strict,
            engine: GeneralPurpose::new(alphabet, config),
            padded: GeneralPurpose::new(alphabet, padded),
            unpadded: GeneralPurpose::new(alphabet, unpadded),
        }
    }

    /// Get the variant.
    pub fn variant(&self) -> Base64Variant {
        self.variant
    }

    /// Whether parsing is strict.
    pub fn is_strict(&self) -> bool {
        self.strict
    }
}

impl Default for Base64Formatter {
    /// URL-safe, unpadded, strict.
    fn default() -> Self {
        Self::new(Base64Variant::UrlSafeNoPadding, true)
    }
}

impl Formatter for Base64Formatter {
    fn format(&self, value: &[u8]) -> String {
        self.engine.encode(value)
    }

    fn parse(&self, value: &str) -> Result<Vec<u8>> {
        let decoded = if self.strict {
            // Padding is optional, but when present it must be exactly right.
            if value.contains('=') {
                self.padded.decode(value)
            } else {
                self.unpadded.decode(value)
            }
        } else {
            let filtered: String = value.chars().filter(|c| self.variant.in_alphabet(*c)).collect();
            self.engine.decode(filtered)
        };
        decoded.map_err(|e| SignatureError::Encoding(e.to_string()))
    }
}
