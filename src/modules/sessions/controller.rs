use axum::extract::{Query, State};
use axum::{Json, http::StatusCode};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use tracing::instrument;
use utoipa::ToSchema;

use rollcall_core::AppError;

use crate::middleware::auth::AuthUser;
use crate::middleware::client::ClientInfo;
use crate::middleware::panel::PanelUser;
use crate::modules::audit;
use crate::modules::users::model::PublicUser;
use crate::modules::users::service::UserService;
use crate::state::AppState;
use crate::utils::cookies::{REFRESH_COOKIE, clear_refresh_cookie, refresh_cookie};
use crate::validator::ValidatedJson;

use super::model::{
    ChangePasswordRequest, LoginRequest, LoginResponse, MessageResponse, RevokeAllRequest,
    RevokeAllResponse, RevokedReason, SessionListQuery, SessionSummary,
};
use super::policy;
use super::service::SessionService;

#[derive(ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Identity attached to an authenticated request.
#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub id: uuid::Uuid,
    pub email: String,
    pub role: String,
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful, refresh cookie set", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 403, description = "Account is not active", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Sessions"
)]
#[instrument(skip(state, jar, dto))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    client: ClientInfo,
    ValidatedJson(dto): ValidatedJson<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    let identity = UserService::verify_credentials(&state.db, &dto.email, &dto.password).await?;

    if !identity.is_usable() {
        return Err(AppError::AccountInactive);
    }

    let issued = SessionService::issue(&state.db, &state.session_config, &identity, &client).await?;

    let ttl_days = policy::refresh_ttl_days(identity.role, state.session_config.refresh_token_days);
    let jar = jar.add(refresh_cookie(
        issued.refresh_token,
        ttl_days,
        &state.session_config.cookie,
    ));

    Ok((
        jar,
        Json(LoginResponse {
            access_token: issued.access_token,
            user: PublicUser::from(&identity),
        }),
    ))
}

/// Exchange the refresh cookie for a new token pair
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    responses(
        (status = 200, description = "Rotation successful, new refresh cookie set", body = LoginResponse),
        (status = 401, description = "Missing, invalid, or expired session token", body = ErrorResponse),
        (status = 403, description = "Reuse detected or account not active", body = ErrorResponse)
    ),
    tag = "Sessions"
)]
#[instrument(skip(state, jar))]
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    client: ClientInfo,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    let presented = jar
        .get(REFRESH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .ok_or(AppError::TokenMissing)?;

    let (issued, identity) =
        SessionService::refresh(&state.db, &state.session_config, &presented, &client).await?;

    let ttl_days = policy::refresh_ttl_days(identity.role, state.session_config.refresh_token_days);
    let jar = jar.add(refresh_cookie(
        issued.refresh_token,
        ttl_days,
        &state.session_config.cookie,
    ));

    Ok((
        jar,
        Json(LoginResponse {
            access_token: issued.access_token,
            user: PublicUser::from(&identity),
        }),
    ))
}

/// Log out and revoke the current session
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Session revoked, cookie cleared", body = MessageResponse)
    ),
    tag = "Sessions"
)]
#[instrument(skip(state, jar))]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<MessageResponse>), AppError> {
    if let Some(cookie) = jar.get(REFRESH_COOKIE) {
        SessionService::revoke_one(&state.db, cookie.value()).await?;
    }

    let jar = jar.add(clear_refresh_cookie(&state.session_config.cookie));

    Ok((
        jar,
        Json(MessageResponse {
            message: "Logged out successfully.".to_string(),
        }),
    ))
}

/// Return the authenticated identity (stateless path)
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Authenticated identity", body = MeResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Account is not active", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Sessions"
)]
#[instrument(skip(auth))]
pub async fn me(auth: AuthUser) -> Json<MeResponse> {
    Json(MeResponse {
        id: auth.id,
        email: auth.email,
        role: auth.role.as_str().to_string(),
    })
}

/// Change password and revoke all sessions
#[utoipa::path(
    post,
    path = "/api/auth/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed, all sessions revoked", body = MessageResponse),
        (status = 401, description = "Current password incorrect", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Sessions"
)]
#[instrument(skip(state, auth, jar, dto))]
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    jar: CookieJar,
    ValidatedJson(dto): ValidatedJson<ChangePasswordRequest>,
) -> Result<(CookieJar, Json<MessageResponse>), AppError> {
    UserService::change_password(&state.db, auth.id, &dto.current_password, &dto.new_password)
        .await?;

    SessionService::revoke_all(&state.db, auth.id, RevokedReason::ManualRevoke).await?;

    let jar = jar.add(clear_refresh_cookie(&state.session_config.cookie));

    Ok((
        jar,
        Json(MessageResponse {
            message: "Password changed. Please log in again.".to_string(),
        }),
    ))
}

/// Return the panel identity (stateful path)
#[utoipa::path(
    get,
    path = "/api/panel/me",
    responses(
        (status = 200, description = "Validated panel identity", body = MeResponse),
        (status = 401, description = "No usable session", body = ErrorResponse),
        (status = 403, description = "Binding mismatch or role not allowed", body = ErrorResponse)
    ),
    tag = "Panel"
)]
#[instrument(skip(panel))]
pub async fn panel_me(panel: PanelUser) -> Json<MeResponse> {
    Json(MeResponse {
        id: panel.id,
        email: panel.email,
        role: panel.role.as_str().to_string(),
    })
}

/// List a user's active sessions
#[utoipa::path(
    get,
    path = "/api/panel/sessions",
    params(SessionListQuery),
    responses(
        (status = 200, description = "Active sessions, most recently active first", body = [SessionSummary]),
        (status = 401, description = "No usable session", body = ErrorResponse),
        (status = 403, description = "Role not allowed on this surface", body = ErrorResponse)
    ),
    tag = "Panel"
)]
#[instrument(skip(state, panel))]
pub async fn list_sessions(
    State(state): State<AppState>,
    panel: PanelUser,
    Query(query): Query<SessionListQuery>,
) -> Result<Json<Vec<SessionSummary>>, AppError> {
    let user_id = query.user_id.unwrap_or(panel.id);

    let sessions =
        super::repository::SessionRepository::list_valid_for_user(&state.db, user_id).await?;

    Ok(Json(sessions.iter().map(SessionSummary::from).collect()))
}

/// Revoke every session of a user
#[utoipa::path(
    post,
    path = "/api/panel/sessions/revoke-all",
    request_body = RevokeAllRequest,
    responses(
        (status = 200, description = "Sessions revoked", body = RevokeAllResponse),
        (status = 400, description = "Unknown revocation reason", body = ErrorResponse),
        (status = 401, description = "No usable session", body = ErrorResponse),
        (status = 403, description = "Role not allowed on this surface", body = ErrorResponse)
    ),
    tag = "Panel"
)]
#[instrument(skip(state, panel, dto))]
pub async fn revoke_all(
    State(state): State<AppState>,
    panel: PanelUser,
    client: ClientInfo,
    ValidatedJson(dto): ValidatedJson<RevokeAllRequest>,
) -> Result<(StatusCode, Json<RevokeAllResponse>), AppError> {
    let reason = match dto.reason.as_deref() {
        None => RevokedReason::ManualRevoke,
        Some(raw) => RevokedReason::parse(raw)
            .ok_or_else(|| AppError::BadRequest(format!("unknown revocation reason: {raw}")))?,
    };

    let revoked = SessionService::revoke_all(&state.db, dto.user_id, reason).await?;

    audit::security_event(
        &state.db,
        Some(dto.user_id),
        "admin-revoke-all",
        &format!("revoked {revoked} sessions (by {})", panel.id),
        &client.ip,
    )
    .await;

    Ok((StatusCode::OK, Json(RevokeAllResponse { revoked })))
}
