//! # Rollcall Auth
//!
//! Credential primitives for the Rollcall session subsystem:
//!
//! - [`claims`]: access token claim structure
//! - [`jwt`]: signed access token creation and verification
//! - [`fingerprint`]: device fingerprint derivation from normalized
//!   network address and agent string
//! - [`token`]: opaque high-entropy refresh token generation
//!
//! The access token is the only self-contained credential; refresh tokens
//! are opaque values whose meaning lives entirely in the session store.

pub mod claims;
pub mod fingerprint;
pub mod jwt;
pub mod token;

// Re-export commonly used items at crate root
pub use claims::AccessClaims;
pub use fingerprint::{device_fingerprint, normalize_ip, normalize_user_agent};
pub use jwt::{TOKEN_ISSUER, create_access_token, verify_access_token};
pub use token::generate_refresh_token;
