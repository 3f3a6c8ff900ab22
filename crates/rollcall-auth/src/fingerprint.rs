//! Device fingerprint derivation.
//!
//! A fingerprint is a keyed SHA-256 hash over the normalized client network
//! address, the normalized agent string, and the owning user id. Identical
//! device+user inputs always produce the same value; the server-held secret
//! prevents a client from forging a fingerprint matching another device.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};
use uuid::Uuid;

// Volatile browser version tokens. Routine auto-updates bump these, and a
// version bump must not change a device's identity.
static UA_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(Chromium|Chrome|Firefox|Safari|EdgA|Edge|Edg|OPR|Opera|Version)/[0-9][0-9.]*")
        .expect("static regex")
});

/// Normalizes a raw client address.
///
/// Loopback IPv6 and IPv4-mapped IPv6 forms collapse to their IPv4
/// equivalent so the same host seen through different stacks fingerprints
/// identically. Unparsable input passes through trimmed.
pub fn normalize_ip(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.parse::<IpAddr>() {
        Ok(IpAddr::V6(v6)) => {
            if v6 == Ipv6Addr::LOCALHOST {
                return Ipv4Addr::LOCALHOST.to_string();
            }
            if let Some(v4) = v6.to_ipv4_mapped() {
                return v4.to_string();
            }
            v6.to_string()
        }
        Ok(addr) => addr.to_string(),
        Err(_) => trimmed.to_string(),
    }
}

/// Strips volatile version substrings from a client agent string.
pub fn normalize_user_agent(raw: &str) -> String {
    UA_VERSION.replace_all(raw.trim(), "$1").into_owned()
}

/// Derives the stable device fingerprint for a user.
///
/// Inputs are normalized internally, so callers can pass raw header
/// values.
pub fn device_fingerprint(secret: &str, ip: &str, user_agent: &str, user_id: Uuid) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(b"|");
    hasher.update(normalize_ip(ip).as_bytes());
    hasher.update(b"|");
    hasher.update(normalize_user_agent(user_agent).as_bytes());
    hasher.update(b"|");
    hasher.update(user_id.to_string().as_bytes());
    hex::encode(hasher.finalize())
}
