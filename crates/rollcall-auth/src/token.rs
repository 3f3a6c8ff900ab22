//! Opaque refresh token generation.

use rand::{Rng, distributions::Alphanumeric};

/// Length of generated refresh tokens. 64 alphanumeric characters carry
/// roughly 380 bits of entropy, which makes collision with any stored
/// token value negligible.
pub const REFRESH_TOKEN_LEN: usize = 64;

/// Generates a fresh opaque refresh token.
pub fn generate_refresh_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(REFRESH_TOKEN_LEN)
        .map(char::from)
        .collect()
}
