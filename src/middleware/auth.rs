//! Stateless access-token authentication.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use uuid::Uuid;

use rollcall_auth::verify_access_token;
use rollcall_core::AppError;

use crate::modules::users::model::UserRole;
use crate::modules::users::service::UserService;
use crate::state::AppState;

/// Extractor for the ordinary bearer-token path.
///
/// A verified signature alone is not enough: the live identity is
/// re-fetched on every request so a deactivated or deleted account is
/// rejected even while its token is still cryptographically valid.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AppError::TokenMissing)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::TokenMissing)?;

        let claims = verify_access_token(token, &state.session_config)?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::TokenInvalid)?;

        let identity = UserService::find_identity(&state.db, user_id)
            .await?
            .ok_or(AppError::AccountInactive)?;

        if !identity.is_usable() {
            return Err(AppError::AccountInactive);
        }

        Ok(AuthUser {
            id: identity.id,
            email: identity.email,
            role: identity.role,
        })
    }
}
