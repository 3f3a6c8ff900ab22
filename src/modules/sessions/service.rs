//! Credential issuance, rotation, and revocation.

use chrono::{Duration, Utc};
use sqlx::PgPool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use rollcall_auth::{
    create_access_token, device_fingerprint, generate_refresh_token, normalize_ip,
    normalize_user_agent,
};
use rollcall_config::SessionConfig;
use rollcall_core::AppError;

use crate::middleware::client::ClientInfo;
use crate::modules::audit;
use crate::modules::users::model::Identity;
use crate::modules::users::service::UserService;

use super::model::{RefreshState, RevokedReason, Session, classify};
use super::policy;
use super::repository::SessionRepository;

/// A freshly issued access/refresh pair together with the backing record.
#[derive(Debug)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub session: Session,
}

pub struct SessionService;

impl SessionService {
    /// Issues an access/refresh pair at login.
    ///
    /// Any session previously valid for the same device fingerprint is
    /// superseded with reason `new-session-created` before the new record
    /// exists. Privileged roles additionally lose every other session
    /// first, so a privileged account never has two live sessions.
    ///
    /// A login racing a refresh on the same fingerprint can interleave in
    /// undefined order; the conditional rotation still admits at most one
    /// winner per presented token, so this stays a benign race.
    #[instrument(skip(db, config, identity, client), fields(user_id = %identity.id))]
    pub async fn issue(
        db: &PgPool,
        config: &SessionConfig,
        identity: &Identity,
        client: &ClientInfo,
    ) -> Result<IssuedTokens, AppError> {
        let ip = normalize_ip(&client.ip);
        let user_agent = normalize_user_agent(&client.user_agent);
        let fingerprint = device_fingerprint(
            &config.fingerprint_secret,
            &client.ip,
            &client.user_agent,
            identity.id,
        );

        let superseded = SessionRepository::invalidate_for_device(
            db,
            identity.id,
            &fingerprint,
            RevokedReason::NewSessionCreated,
        )
        .await?;
        if superseded > 0 {
            info!(superseded, "superseded prior session on this device");
        }

        if policy::single_session_enforced(identity.role) {
            let revoked = SessionRepository::invalidate_all_for_user(
                db,
                identity.id,
                RevokedReason::SingleDeviceSession,
            )
            .await?;
            if revoked > 0 {
                info!(revoked, "enforced single session for privileged login");
            }
        }

        let ttl_days = policy::refresh_ttl_days(identity.role, config.refresh_token_days);
        let expires_at = Utc::now() + Duration::days(ttl_days);
        let refresh_token = generate_refresh_token();

        let session = SessionRepository::create(
            db,
            identity.id,
            &refresh_token,
            &fingerprint,
            &ip,
            &user_agent,
            expires_at,
        )
        .await?;

        let access_token = create_access_token(identity.id, identity.role.as_str(), config)?;

        Ok(IssuedTokens {
            access_token,
            refresh_token,
            session,
        })
    }

    /// Exchanges a presented refresh token for a new pair.
    ///
    /// State machine:
    /// - valid and unexpired: rotate the record in place and return a new
    ///   pair
    /// - valid but past expiry: mark `expired`, reject
    /// - superseded by a login on the same device within the reuse
    ///   window: revoke every session of the user (`reuse-detected`) and
    ///   reject
    /// - anything else: reject with no side effects
    #[instrument(skip(db, config, presented_token, client))]
    pub async fn refresh(
        db: &PgPool,
        config: &SessionConfig,
        presented_token: &str,
        client: &ClientInfo,
    ) -> Result<(IssuedTokens, Identity), AppError> {
        let now = Utc::now();

        let Some(session) = SessionRepository::find_by_token(db, presented_token).await? else {
            return Err(AppError::SessionInvalidOrExpired);
        };

        match classify(Some(&session), now) {
            RefreshState::Valid => {
                let identity = UserService::find_identity(db, session.user_id)
                    .await?
                    .ok_or(AppError::AccountInactive)?;
                if !identity.is_usable() {
                    return Err(AppError::AccountInactive);
                }

                let ip = normalize_ip(&client.ip);
                let user_agent = normalize_user_agent(&client.user_agent);
                let fingerprint = device_fingerprint(
                    &config.fingerprint_secret,
                    &client.ip,
                    &client.user_agent,
                    identity.id,
                );
                let ttl_days = policy::refresh_ttl_days(identity.role, config.refresh_token_days);
                let new_token = generate_refresh_token();

                let rotated = SessionRepository::rotate(
                    db,
                    presented_token,
                    &new_token,
                    &fingerprint,
                    &ip,
                    &user_agent,
                    now + Duration::days(ttl_days),
                )
                .await?
                // A concurrent refresh or revocation won the
                // match-and-replace; this caller's token is stale.
                .ok_or(AppError::SessionInvalidOrExpired)?;

                let access_token =
                    create_access_token(identity.id, identity.role.as_str(), config)?;

                Ok((
                    IssuedTokens {
                        access_token,
                        refresh_token: new_token,
                        session: rotated,
                    },
                    identity,
                ))
            }
            RefreshState::Expired => {
                SessionRepository::invalidate_by_id(db, session.id, RevokedReason::Expired)
                    .await?;
                Err(AppError::SessionInvalidOrExpired)
            }
            RefreshState::ReusedRecently => {
                let revoked = SessionRepository::invalidate_all_for_user(
                    db,
                    session.user_id,
                    RevokedReason::ReuseDetected,
                )
                .await?;
                warn!(
                    user_id = %session.user_id,
                    revoked,
                    "superseded refresh token replayed inside reuse window"
                );
                audit::security_event(
                    db,
                    Some(session.user_id),
                    "refresh-token-reuse",
                    &format!("revoked {revoked} sessions after stale token replay"),
                    &normalize_ip(&client.ip),
                )
                .await;
                Err(AppError::ReuseDetected)
            }
            RefreshState::Unknown => Err(AppError::SessionInvalidOrExpired),
        }
    }

    /// Logout: invalidates the session carrying this token. Succeeds even
    /// when the token no longer matches anything.
    #[instrument(skip(db, token))]
    pub async fn revoke_one(db: &PgPool, token: &str) -> Result<(), AppError> {
        SessionRepository::invalidate_by_token(db, token, RevokedReason::Logout).await?;
        Ok(())
    }

    /// Invalidates every valid session of a user. Used by password
    /// changes, admin revocation, and violation handling.
    #[instrument(skip(db))]
    pub async fn revoke_all(
        db: &PgPool,
        user_id: Uuid,
        reason: RevokedReason,
    ) -> Result<u64, AppError> {
        let revoked = SessionRepository::invalidate_all_for_user(db, user_id, reason).await?;
        info!(user_id = %user_id, revoked, reason = reason.as_str(), "revoked all sessions");
        Ok(revoked)
    }
}
