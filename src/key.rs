//! Key resolution for signature decryption.
//!
//! A key is looked up by the zone id found in the signature header. Resolvers
//! may block (for example on a remote key store); the constant case never does.

use crate::error::{Result, SignatureError};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use zeroize::Zeroizing;

/// Resolves the decryption key for a zone.
pub trait KeyResolver: Send + Sync {
    /// Get the key for `zone_id`.
    fn resolve(&self, zone_id: u64) -> Result<Zeroizing<Vec<u8>>>;
}

impl<F> KeyResolver for F
where
    F: Fn(u64) -> Result<Vec<u8>> + Send + Sync,
{
    fn resolve(&self, zone_id: u64) -> Result<Zeroizing<Vec<u8>>> {
        self(zone_id).map(Zeroizing::new)
    }
}

/// Where decryption keys come from.
#[derive(Clone)]
pub enum KeySource {
    /// Same key for every zone
    Constant(Zeroizing<Vec<u8>>),
    /// Per-zone lookup
    Resolver(Arc<dyn KeyResolver>),
}

impl KeySource {
    /// Use one key for every zone.
    pub fn constant(key: impl Into<Vec<u8>>) -> Self {
        KeySource::Constant(Zeroizing::new(key.into()))
    }

    /// Use a resolver.
    pub fn resolver(resolver: impl KeyResolver + 'static) -> Self {
        KeySource::Resolver(Arc::new(resolver))
    }

    /// Get the key for `zone_id`. Empty keys are rejected.
    pub fn resolve(&self, zone_id: u64) -> Result<Zeroizing<Vec<u8>>> {
        let key = match self {
            KeySource::Constant(key) => key.clone(),
            KeySource::Resolver(resolver) => resolver.resolve(zone_id)?,
        };
        if key.is_empty() {
            return Err(SignatureError::Misuse(format!("empty key for zone {zone_id}")));
        }
        Ok(key)
    }
}

impl fmt::Debug for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySource::Constant(_) => f.write_str("KeySource::Constant(..)"),
            KeySource::Resolver(_) => f.write_str("KeySource::Resolver(..)"),
        }
    }
}

impl From<Vec<u8>> for KeySource {
    fn from(key: Vec<u8>) -> Self {
        KeySource::constant(key)
    }
}

impl From<&[u8]> for KeySource {
    fn from(key: &[u8]) -> Self {
        KeySource::constant(key)
    }
}

/// In-memory per-zone keys with an optional fallback.
#[derive(Default)]
pub struct ZoneKeyring {
    zones: HashMap<u64, Zeroizing<Vec<u8>>>,
    fallback: Option<Zeroizing<Vec<u8>>>,
}

impl ZoneKeyring {
    /// Create an empty keyring.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the key for a zone.
    pub fn with_zone(mut self, zone_id: u64, key: impl Into<Vec<u8>>) -> Self {
        self.zones.insert(zone_id, Zeroizing::new(key.into()));
        self
    }

    /// Set the key used for zones without their own.
    pub fn with_fallback(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.fallback = Some(Zeroizing::new(key.into()));
        self
    }

    /// Number of zones with their own key.
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// Returns true if no zone has its own key.
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

impl KeyResolver for ZoneKeyring {
    fn resolve(&self, zone_id: u64) -> Result<Zeroizing<Vec<u8>>> {
        self.zones
            .get(&zone_id)
            .or(self.fallback.as_ref())
            .cloned()
            .ok_or_else(|| SignatureError::KeyResolution(format!("no key for zone {zone_id}")))
    }
}
