//! Signed access token creation and verification.
//!
//! Access tokens are short-lived HS256 JWTs carrying the subject id and
//! role. Verification is stateless: signature, expiry, and issuer are
//! checked without touching the session store.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use rollcall_config::SessionConfig;
use rollcall_core::AppError;

use crate::claims::AccessClaims;

/// Issuer pinned into every access token and required during verification.
pub const TOKEN_ISSUER: &str = "rollcall";

/// Creates a signed access token for the given user and role.
///
/// The token lifetime comes from `config.access_token_expiry` (seconds)
/// and is independent of the refresh token lifetime.
pub fn create_access_token(
    user_id: Uuid,
    role: &str,
    config: &SessionConfig,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp() as usize;
    let exp = now + config.access_token_expiry as usize;

    let claims = AccessClaims {
        sub: user_id.to_string(),
        role: role.to_string(),
        iss: TOKEN_ISSUER.to_string(),
        exp,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to create access token: {}", e)))
}

/// Verifies an access token and returns its claims.
///
/// Every failure mode (bad signature, expired, malformed, wrong issuer)
/// collapses to [`AppError::TokenInvalid`]; the distinction is never
/// surfaced to the caller.
pub fn verify_access_token(token: &str, config: &SessionConfig) -> Result<AccessClaims, AppError> {
    let mut validation = Validation::default();
    validation.set_issuer(&[TOKEN_ISSUER]);

    decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::TokenInvalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollcall_config::CookieSettings;

    fn get_test_config() -> SessionConfig {
        SessionConfig {
            jwt_secret: "test-secret-key-at-least-32-characters-long".to_string(),
            fingerprint_secret: "test-fingerprint-secret".to_string(),
            access_token_expiry: 900,
            refresh_token_days: 30,
            panel_strict_binding: false,
            cookie: CookieSettings {
                secure: false,
                same_site_strict: false,
                domain: None,
            },
        }
    }

    #[test]
    fn test_create_and_verify_round_trip() {
        let config = get_test_config();
        let user_id = Uuid::new_v4();

        let token = create_access_token(user_id, "student", &config).unwrap();
        let claims = verify_access_token(&token, &config).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.role, "student");
        assert_eq!(claims.iss, TOKEN_ISSUER);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let config = get_test_config();
        assert!(matches!(
            verify_access_token("not.a.token", &config),
            Err(AppError::TokenInvalid)
        ));
        assert!(matches!(
            verify_access_token("", &config),
            Err(AppError::TokenInvalid)
        ));
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let config = get_test_config();
        let token = create_access_token(Uuid::new_v4(), "admin", &config).unwrap();

        let mut other = get_test_config();
        other.jwt_secret = "a-completely-different-secret-value-here".to_string();

        assert!(matches!(
            verify_access_token(&token, &other),
            Err(AppError::TokenInvalid)
        ));
    }

    #[test]
    fn test_verify_pins_issuer() {
        let config = get_test_config();
        let now = Utc::now().timestamp() as usize;
        let claims = AccessClaims {
            sub: Uuid::new_v4().to_string(),
            role: "admin".to_string(),
            iss: "someone-else".to_string(),
            exp: now + 900,
            iat: now,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            verify_access_token(&token, &config),
            Err(AppError::TokenInvalid)
        ));
    }
}
