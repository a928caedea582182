//! JSON struct format.

use super::into_claims;
use crate::claims::Claims;
use crate::error::{Result, SignatureError};
use serde_json::Value;

pub(super) fn encode(claims: &Claims) -> Result<Vec<u8>> {
    serde_json::to_vec(claims).map_err(|e| SignatureError::Misuse(e.to_string()))
}

pub(super) fn decode(body: &[u8]) -> Result<Claims> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| SignatureError::Deserialization(e.to_string()))?;
    into_claims(value)
}
