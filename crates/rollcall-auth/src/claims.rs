//! Access token claim structure.

use serde::{Deserialize, Serialize};

/// Claims embedded in a signed access token.
///
/// A valid signature on these claims is necessary but not sufficient to
/// authenticate a request: callers must still re-fetch the live identity
/// and reject inactive accounts.
///
/// # Fields
///
/// - `sub`: user ID (subject)
/// - `role`: role name at issuance time
/// - `iss`: issuing service, pinned during verification
/// - `exp` / `iat`: Unix timestamps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    pub role: String,
    pub iss: String,
    pub exp: usize,
    pub iat: usize,
}
