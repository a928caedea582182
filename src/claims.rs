//! Signature claims and their verification against the current request.

use crate::error::{Result, SignatureError};
use serde_json::{Map, Value};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use subtle::ConstantTimeEq;
use tracing::debug;

/// Decoded signature payload.
pub type Claims = Map<String, Value>;

/// IPv4 address the signature was issued for.
pub const IPV4_IP: &str = "ipv4.ip";
/// Number of leading IPv4 bytes to compare.
pub const IPV4_PREFIX: &str = "ipv4.v";
/// IPv6 address the signature was issued for.
pub const IPV6_IP: &str = "ipv6.ip";
/// Number of leading IPv6 bytes to compare.
pub const IPV6_PREFIX: &str = "ipv6.v";
/// User agent the signature was issued for.
pub const USER_AGENT: &str = "b.ua";
/// Verdict code.
pub const RESULT: &str = "result";

/// Get a string claim. Single-element arrays (query strings) are unwrapped.
pub fn claim_str<'a>(claims: &'a Claims, key: &str) -> Option<&'a str> {
    match single(claims.get(key)?) {
        Value::String(s) => Some(s.as_str()),
        _ => None,
    }
}

/// Get an integer claim, accepting numbers and decimal strings.
pub fn claim_int(claims: &Claims, key: &str) -> Option<i64> {
    match single(claims.get(key)?) {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn single(value: &Value) -> &Value {
    match value {
        Value::Array(items) if items.len() == 1 => &items[0],
        other => other,
    }
}

/// Address embedded in the claims with the number of leading bytes to compare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressClaim {
    octets: Vec<u8>,
    prefix: usize,
}

impl AddressClaim {
    /// Read the IPv4 claim. Absent or empty address means no expectation.
    pub fn ipv4(claims: &Claims) -> Option<Self> {
        let addr: Ipv4Addr = Self::address(claims, IPV4_IP)?;
        Self::new(addr.octets().to_vec(), claim_int(claims, IPV4_PREFIX).unwrap_or(4))
    }

    /// Read the IPv6 claim. Absent or empty address means no expectation.
    pub fn ipv6(claims: &Claims) -> Option<Self> {
        let addr: Ipv6Addr = Self::address(claims, IPV6_IP)?;
        Self::new(addr.octets().to_vec(), claim_int(claims, IPV6_PREFIX).unwrap_or(16))
    }

    fn address<A: std::str::FromStr>(claims: &Claims, key: &str) -> Option<A> {
        let text = claim_str(claims, key).filter(|s| !s.is_empty())?;
        match text.parse() {
            Ok(addr) => Some(addr),
            Err(_) => {
                debug!(claim = key, "Unparseable address claim ignored");
                None
            }
        }
    }

    /// Prefix lengths are whole bytes. Zero or negative lengths would match any
    /// address and are refused; lengths past the address are capped.
    fn new(octets: Vec<u8>, prefix: i64) -> Option<Self> {
        if prefix < 1 {
            debug!(prefix, "Non-positive address prefix ignored");
            return None;
        }
        let prefix = usize::try_from(prefix).map_or(octets.len(), |p| p.min(octets.len()));
        Some(Self { octets, prefix })
    }

    /// Number of leading bytes compared.
    pub fn prefix(&self) -> usize {
        self.prefix
    }

    /// Compare the leading `prefix` bytes of `candidate`.
    pub fn matches(&self, candidate: &[u8]) -> bool {
        if candidate.len() != self.octets.len() {
            return false;
        }
        bool::from(self.octets[..self.prefix].ct_eq(&candidate[..self.prefix]))
    }
}

/// Outcome of a successful claim verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    /// Verdict code from the `result` claim
    pub result: i64,
    /// First candidate address that matched
    pub matched_ip: IpAddr,
}

/// Checks claims against the request's candidate IPs and user agent.
#[derive(Debug)]
pub struct ClaimVerifier<'a> {
    claims: &'a Claims,
}

impl<'a> ClaimVerifier<'a> {
    /// Create a verifier over decoded claims.
    pub fn new(claims: &'a Claims) -> Self {
        Self { claims }
    }

    /// Verify IP and user agent, then extract the verdict.
    pub fn verify<S: AsRef<str>>(&self, ip_addresses: &[S], user_agent: &str) -> Result<Verification> {
        let matched_ip = self.verify_ip(ip_addresses)?;
        self.verify_user_agent(user_agent)?;

        let result = claim_int(self.claims, RESULT)
            .ok_or_else(|| SignatureError::Deserialization("missing result claim".to_string()))?;

        Ok(Verification { result, matched_ip })
    }

    /// Return the first candidate matching the embedded address of its family.
    pub fn verify_ip<S: AsRef<str>>(&self, ip_addresses: &[S]) -> Result<IpAddr> {
        let v4 = AddressClaim::ipv4(self.claims);
        let v6 = AddressClaim::ipv6(self.claims);

        for candidate in ip_addresses {
            let candidate = candidate.as_ref().trim();
            if let Ok(addr) = candidate.parse::<Ipv4Addr>() {
                if v4.as_ref().is_some_and(|claim| claim.matches(&addr.octets())) {
                    return Ok(IpAddr::V4(addr));
                }
            } else if let Ok(addr) = candidate.parse::<Ipv6Addr>() {
                if v6.as_ref().is_some_and(|claim| claim.matches(&addr.octets())) {
                    return Ok(IpAddr::V6(addr));
                }
            }
        }

        Err(SignatureError::IpMismatch)
    }

    /// Require the embedded user agent to equal `user_agent` exactly.
    pub fn verify_user_agent(&self, user_agent: &str) -> Result<()> {
        let expected = claim_str(self.claims, USER_AGENT).ok_or(SignatureError::UserAgentMissing)?;
        if bool::from(expected.as_bytes().ct_eq(user_agent.as_bytes())) {
            Ok(())
        } else {
            Err(SignatureError::UserAgentMismatch)
        }
    }
}
