//! Error types for signature decoding and verification.
//!
//! Every failure is terminal for the call that produced it. Callers should treat
//! any of these as "signature rejected" and use [`SignatureError::kind`] to tell
//! the categories apart in logs and metrics.

/// Errors raised while decoding or verifying a signature.
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    /// Token text could not be decoded to bytes.
    #[error("invalid signature encoding: {0}")]
    Encoding(String),

    /// Decoded bytes are too short to hold a header.
    #[error("malformed signature")]
    Malformed,

    /// Header carries an unsupported signature generation.
    #[error("invalid signature version: expected {expected}, found {found}")]
    Version { found: u8, expected: u8 },

    /// Encrypted payload is shorter than the header declares.
    #[error("truncated signature payload: declared {declared} bytes, got {actual}")]
    Truncated { declared: usize, actual: usize },

    /// Cipher tag not known to the registry.
    #[error("unsupported encryption method 0x{0:04x}")]
    UnsupportedCipher(u16),

    /// Cipher-specific failure, including authentication tag mismatch.
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// Plaintext marker not known to the registry.
    #[error("unsupported struct format {0:#04x}")]
    UnsupportedFormat(u8),

    /// Plaintext marker does not match the codec it was handed to.
    #[error("unexpected struct format: expected {expected:?}, found {found:?}")]
    FormatMismatch { expected: char, found: Option<char> },

    /// Codec payload is not valid input for its encoding.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// No candidate IP matches the address embedded in the signature.
    #[error("signature IP mismatch")]
    IpMismatch,

    /// Signature carries no user agent.
    #[error("signature user agent missing")]
    UserAgentMissing,

    /// Signature user agent differs from the request's.
    #[error("signature user agent mismatch")]
    UserAgentMismatch,

    /// Verdict requested before a successful verification.
    #[error("result unavailable for unverified signature")]
    ResultUnavailable,

    /// Key resolver could not produce a key for the zone.
    #[error("key resolution failed: {0}")]
    KeyResolution(String),

    /// Backend for the selected method was not compiled in.
    #[error("required dependency {0} not available")]
    DependencyUnavailable(&'static str),

    /// API used with invalid arguments.
    #[error("invalid usage: {0}")]
    Misuse(String),
}

impl SignatureError {
    /// Stable label for the error category.
    pub fn kind(&self) -> &'static str {
        match self {
            SignatureError::Encoding(_) => "encoding",
            SignatureError::Malformed => "malformed",
            SignatureError::Version { .. } => "version",
            SignatureError::Truncated { .. } => "truncated",
            SignatureError::UnsupportedCipher(_) => "unsupported_cipher",
            SignatureError::Decryption(_) => "decryption",
            SignatureError::UnsupportedFormat(_) | SignatureError::FormatMismatch { .. } => {
                "unsupported_format"
            }
            SignatureError::Deserialization(_) => "deserialization",
            SignatureError::IpMismatch => "ip_mismatch",
            SignatureError::UserAgentMissing => "user_agent_missing",
            SignatureError::UserAgentMismatch => "user_agent_mismatch",
            SignatureError::ResultUnavailable => "misuse",
            SignatureError::KeyResolution(_) => "key_resolution",
            SignatureError::DependencyUnavailable(_) => "dependency_unavailable",
            SignatureError::Misuse(_) => "misuse",
        }
    }

    /// Returns true if the error came from checking claims against the request.
    pub fn is_verification_failure(&self) -> bool {
        matches!(
            self,
            SignatureError::IpMismatch
                | SignatureError::UserAgentMissing
                | SignatureError::UserAgentMismatch
        )
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SignatureError>;
