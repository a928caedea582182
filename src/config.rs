//! Configuration types for the signature verifier.

use crate::error::{Result, SignatureError};
use crate::formatter::{Base64Formatter, Base64Variant};
use crate::key::{KeySource, ZoneKeyring};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Main configuration for the signature verifier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Signature text encoding
    pub formatter: FormatterConfig,

    /// Decryption keys
    pub keys: KeyConfig,
}

impl VerifierConfig {
    /// Load configuration from a JSON or YAML file.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = if path.extension().is_some_and(|e| e == "yaml" || e == "yml") {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };
        Ok(config)
    }

    /// Build the configured formatter.
    pub fn formatter(&self) -> Base64Formatter {
        Base64Formatter::new(self.formatter.variant, self.formatter.strict)
    }

    /// Build the key source. A lone default key becomes a constant source.
    pub fn key_source(&self) -> Result<KeySource> {
        let keys = &self.keys;
        if keys.zones.is_empty() {
            return match &keys.default_key {
                Some(key) => Ok(KeySource::constant(keys.encoding.decode(key)?)),
                None => Err(SignatureError::Misuse("no keys configured".to_string())),
            };
        }

        let mut keyring = ZoneKeyring::new();
        for (zone_id, key) in &keys.zones {
            keyring = keyring.with_zone(*zone_id, keys.encoding.decode(key)?);
        }
        if let Some(key) = &keys.default_key {
            keyring = keyring.with_fallback(keys.encoding.decode(key)?);
        }
        Ok(KeySource::resolver(keyring))
    }
}

/// Text encoding of signatures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatterConfig {
    /// Base64 variant
    pub variant: Base64Variant,

    /// Reject characters outside the alphabet
    pub strict: bool,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            variant: Base64Variant::UrlSafeNoPadding,
            strict: true,
        }
    }
}

/// Key configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyConfig {
    /// Key for zones without their own
    pub default_key: Option<String>,

    /// Per-zone keys
    pub zones: BTreeMap<u64, String>,

    /// How the keys above are written
    pub encoding: KeyEncoding,
}

/// Encoding of configured keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyEncoding {
    /// Standard padded base64
    #[default]
    Base64,
    /// Hexadecimal
    Hex,
    /// Key bytes taken as-is
    Raw,
}

impl KeyEncoding {
    /// Decode a configured key.
    pub fn decode(&self, value: &str) -> Result<Vec<u8>> {
        match self {
            KeyEncoding::Base64 => BASE64
                .decode(value.trim())
                .map_err(|e| SignatureError::Misuse(format!("invalid base64 key: {e}"))),
            KeyEncoding::Hex => hex::decode(value.trim())
                .map_err(|e| SignatureError::Misuse(format!("invalid hex key: {e}"))),
            KeyEncoding::Raw => Ok(value.as_bytes().to_vec()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = VerifierConfig::default();
        assert_eq!(config.formatter.variant, Base64Variant::UrlSafeNoPadding);
        assert!(config.formatter.strict);
        assert!(config.keys.zones.is_empty());
        assert_eq!(config.keys.encoding, KeyEncoding::Base64);
    }

    #[test]
    fn test_config_serialization() {
        let config = VerifierConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: VerifierConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.formatter.variant, config.formatter.variant);
    }

    #[test]
    fn test_key_encodings() {
        assert_eq!(KeyEncoding::Base64.decode("AAEC").unwrap(), vec![0, 1, 2]);
        assert_eq!(KeyEncoding::Hex.decode("000102").unwrap(), vec![0, 1, 2]);
        assert_eq!(KeyEncoding::Raw.decode("abc").unwrap(), b"abc".to_vec());
        assert!(KeyEncoding::Hex.decode("zz").is_err());
    }

    #[test]
    fn test_constant_key_source() {
        let mut config = VerifierConfig::default();
        config.keys.default_key = Some("AAEC".to_string());
        let source = config.key_source().unwrap();
        assert!(matches!(source, KeySource::Constant(_)));
        assert_eq!(source.resolve(99).unwrap().as_slice(), &[0, 1, 2]);
    }

    #[test]
    fn test_zone_key_source() {
        let yaml = r#"
keys:
  encoding: hex
  default_key: "ff"
  zones:
    42: "2a2a"
"#;
        let config: VerifierConfig = serde_yaml::from_str(yaml).unwrap();
        let source = config.key_source().unwrap();
        assert_eq!(source.resolve(42).unwrap().as_slice(), &[0x2a, 0x2a]);
        assert_eq!(source.resolve(1).unwrap().as_slice(), &[0xff]);
    }

    #[test]
    fn test_no_keys() {
        assert!(matches!(
            VerifierConfig::default().key_source(),
            Err(SignatureError::Misuse(_))
        ));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"formatter": {{"variant": "original", "strict": false}}, "keys": {{"default_key": "AAEC"}}}}"#
        )
        .unwrap();

        let config = VerifierConfig::from_path(file.path()).unwrap();
        assert_eq!(config.formatter.variant, Base64Variant::Original);
        assert!(!config.formatter().is_strict());
    }
}
