//! Per-request stateful session validation for the control-panel surface.
//!
//! Unlike the bearer-token path, every panel request is checked directly
//! against the session store using the raw session cookie; there is no
//! separate signed token. Successful validation refreshes the session's
//! `last_activity`.

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use uuid::Uuid;

use rollcall_auth::{normalize_ip, normalize_user_agent};
use rollcall_core::AppError;

use crate::middleware::client::ClientInfo;
use crate::modules::audit;
use crate::modules::sessions::model::RevokedReason;
use crate::modules::sessions::policy;
use crate::modules::sessions::repository::SessionRepository;
use crate::modules::users::model::UserRole;
use crate::modules::users::service::UserService;
use crate::state::AppState;
use crate::utils::cookies::REFRESH_COOKIE;

/// Identity attached to a panel request after stateful validation.
#[derive(Debug, Clone)]
pub struct PanelUser {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub session_id: Uuid,
}

impl FromRequestParts<AppState> for PanelUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        validate_panel_session(parts, state).await
    }
}

/// Low-sensitivity panel routes take `Option<PanelUser>` and continue
/// unauthenticated when no usable session is attached. Security failures
/// (binding mismatch, blocked account, disallowed role) still reject.
impl OptionalFromRequestParts<AppState> for PanelUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        match validate_panel_session(parts, state).await {
            Ok(user) => Ok(Some(user)),
            Err(AppError::TokenMissing | AppError::SessionInvalidOrExpired) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

async fn validate_panel_session(
    parts: &mut Parts,
    state: &AppState,
) -> Result<PanelUser, AppError> {
    let jar = CookieJar::from_headers(&parts.headers);
    let token = jar
        .get(REFRESH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .ok_or(AppError::TokenMissing)?;

    let session = SessionRepository::find_valid_by_token(&state.db, &token)
        .await?
        .ok_or(AppError::SessionInvalidOrExpired)?;

    if session.expires_at <= Utc::now() {
        SessionRepository::expire_if_past_due(&state.db, session.id).await?;
        return Err(AppError::SessionInvalidOrExpired);
    }

    let client = ClientInfo::from_parts(parts);

    if state.session_config.panel_strict_binding {
        let ip = normalize_ip(&client.ip);
        let user_agent = normalize_user_agent(&client.user_agent);

        if ip != session.ip || user_agent != session.user_agent {
            SessionRepository::invalidate_by_id(
                &state.db,
                session.id,
                RevokedReason::SecurityViolation,
            )
            .await?;
            audit::security_event(
                &state.db,
                Some(session.user_id),
                "panel-binding-mismatch",
                "stored device context did not match the request",
                &ip,
            )
            .await;
            return Err(AppError::SecurityViolation);
        }
    }

    let identity = UserService::find_identity(&state.db, session.user_id)
        .await?
        .ok_or(AppError::AccountInactive)?;

    if !identity.is_usable() {
        return Err(AppError::AccountInactive);
    }

    if !policy::panel_allows(identity.role) {
        return Err(AppError::Forbidden);
    }

    SessionRepository::touch(&state.db, session.id).await?;

    Ok(PanelUser {
        id: identity.id,
        email: identity.email,
        role: identity.role,
        session_id: session.id,
    })
}
