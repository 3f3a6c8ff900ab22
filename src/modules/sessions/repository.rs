//! Session store operations.
//!
//! All coordination between concurrent requests happens through these
//! queries; there is no in-process locking. [`SessionRepository::rotate`]
//! is the single conditional statement that makes rotation linearizable
//! per session.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use rollcall_core::AppError;

use super::model::{RevokedReason, Session};

const SESSION_COLUMNS: &str = "id, user_id, refresh_token, fingerprint, ip, user_agent, \
     last_activity, expires_at, rotated_at, is_valid, revoked_at, revoked_reason, created_at";

pub struct SessionRepository;

impl SessionRepository {
    /// Inserts a fresh session. New records are always valid with a future
    /// expiry.
    pub async fn create(
        db: &PgPool,
        user_id: Uuid,
        refresh_token: &str,
        fingerprint: &str,
        ip: &str,
        user_agent: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Session, AppError> {
        let session = sqlx::query_as::<_, Session>(&format!(
            "INSERT INTO sessions (user_id, refresh_token, fingerprint, ip, user_agent, expires_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {SESSION_COLUMNS}"
        ))
        .bind(user_id)
        .bind(refresh_token)
        .bind(fingerprint)
        .bind(ip)
        .bind(user_agent)
        .bind(expires_at)
        .fetch_one(db)
        .await?;

        Ok(session)
    }

    /// Finds the record a presented token belongs to, valid or not. Token
    /// values are high-entropy, so at most one row matches in practice;
    /// the newest wins if history ever collides.
    pub async fn find_by_token(db: &PgPool, token: &str) -> Result<Option<Session>, AppError> {
        let session = sqlx::query_as::<_, Session>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions
             WHERE refresh_token = $1
             ORDER BY created_at DESC
             LIMIT 1"
        ))
        .bind(token)
        .fetch_optional(db)
        .await?;

        Ok(session)
    }

    /// Finds the currently valid session carrying this token.
    pub async fn find_valid_by_token(
        db: &PgPool,
        token: &str,
    ) -> Result<Option<Session>, AppError> {
        let session = sqlx::query_as::<_, Session>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions
             WHERE refresh_token = $1 AND is_valid = TRUE
             LIMIT 1"
        ))
        .bind(token)
        .fetch_optional(db)
        .await?;

        Ok(session)
    }

    /// Atomically replaces a still-valid, unexpired session's token and
    /// device context in place.
    ///
    /// The match-and-replace runs as one statement keyed on the presented
    /// token, so of two racing refresh calls only one gets a row back; the
    /// loser sees `None`.
    #[allow(clippy::too_many_arguments)]
    pub async fn rotate(
        db: &PgPool,
        old_token: &str,
        new_token: &str,
        fingerprint: &str,
        ip: &str,
        user_agent: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<Session>, AppError> {
        let session = sqlx::query_as::<_, Session>(&format!(
            "UPDATE sessions
             SET refresh_token = $2, fingerprint = $3, ip = $4, user_agent = $5,
                 expires_at = $6, rotated_at = now(), last_activity = now()
             WHERE refresh_token = $1 AND is_valid = TRUE AND expires_at > now()
             RETURNING {SESSION_COLUMNS}"
        ))
        .bind(old_token)
        .bind(new_token)
        .bind(fingerprint)
        .bind(ip)
        .bind(user_agent)
        .bind(expires_at)
        .fetch_optional(db)
        .await?;

        Ok(session)
    }

    /// Invalidates a single session by record id.
    pub async fn invalidate_by_id(
        db: &PgPool,
        id: Uuid,
        reason: RevokedReason,
    ) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE sessions SET is_valid = FALSE, revoked_at = now(), revoked_reason = $2
             WHERE id = $1 AND is_valid = TRUE",
        )
        .bind(id)
        .bind(reason.as_str())
        .execute(db)
        .await?;

        Ok(())
    }

    /// Invalidates the session carrying this token, if any. Returns the
    /// number of affected rows.
    pub async fn invalidate_by_token(
        db: &PgPool,
        token: &str,
        reason: RevokedReason,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE sessions SET is_valid = FALSE, revoked_at = now(), revoked_reason = $2
             WHERE refresh_token = $1 AND is_valid = TRUE",
        )
        .bind(token)
        .bind(reason.as_str())
        .execute(db)
        .await?;

        Ok(result.rows_affected())
    }

    /// Invalidates any valid session bound to this user/device pair. Keeps
    /// the at-most-one-valid-session-per-device invariant at issuance.
    pub async fn invalidate_for_device(
        db: &PgPool,
        user_id: Uuid,
        fingerprint: &str,
        reason: RevokedReason,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE sessions SET is_valid = FALSE, revoked_at = now(), revoked_reason = $3
             WHERE user_id = $1 AND fingerprint = $2 AND is_valid = TRUE",
        )
        .bind(user_id)
        .bind(fingerprint)
        .bind(reason.as_str())
        .execute(db)
        .await?;

        Ok(result.rows_affected())
    }

    /// Invalidates every valid session of a user.
    pub async fn invalidate_all_for_user(
        db: &PgPool,
        user_id: Uuid,
        reason: RevokedReason,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE sessions SET is_valid = FALSE, revoked_at = now(), revoked_reason = $2
             WHERE user_id = $1 AND is_valid = TRUE",
        )
        .bind(user_id)
        .bind(reason.as_str())
        .execute(db)
        .await?;

        Ok(result.rows_affected())
    }

    /// Refreshes `last_activity` after a successful stateful validation.
    pub async fn touch(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE sessions SET last_activity = now() WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        Ok(())
    }

    /// Lazily invalidates a session whose expiry has passed. Returns true
    /// when this call performed the transition.
    pub async fn expire_if_past_due(db: &PgPool, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE sessions SET is_valid = FALSE, revoked_at = now(), revoked_reason = $2
             WHERE id = $1 AND is_valid = TRUE AND expires_at <= now()",
        )
        .bind(id)
        .bind(RevokedReason::Expired.as_str())
        .execute(db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists a user's currently valid sessions, most recently active
    /// first.
    pub async fn list_valid_for_user(
        db: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<Session>, AppError> {
        let sessions = sqlx::query_as::<_, Session>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions
             WHERE user_id = $1 AND is_valid = TRUE
             ORDER BY last_activity DESC"
        ))
        .bind(user_id)
        .fetch_all(db)
        .await?;

        Ok(sessions)
    }
}
