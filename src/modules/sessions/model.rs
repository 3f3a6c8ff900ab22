//! Session records, revocation reasons, and the refresh-state machine.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::modules::users::model::PublicUser;

/// Replay window after a session is superseded by a fresh login on the
/// same device. Presenting the old token inside this window is treated as
/// a credential-theft signal; outside it, the token is merely unknown.
pub const REUSE_WINDOW_SECS: i64 = 5;

/// Enumerated cause recorded whenever a session transitions to invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevokedReason {
    Logout,
    Expired,
    FingerprintMismatch,
    SingleDeviceSession,
    ManualRevoke,
    ReuseDetected,
    SecurityViolation,
    NewSessionCreated,
}

impl RevokedReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Logout => "logout",
            Self::Expired => "expired",
            Self::FingerprintMismatch => "fingerprint-mismatch",
            Self::SingleDeviceSession => "single-device-session",
            Self::ManualRevoke => "manual-revoke",
            Self::ReuseDetected => "reuse-detected",
            Self::SecurityViolation => "security-violation",
            Self::NewSessionCreated => "new-session-created",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "logout" => Some(Self::Logout),
            "expired" => Some(Self::Expired),
            "fingerprint-mismatch" => Some(Self::FingerprintMismatch),
            "single-device-session" => Some(Self::SingleDeviceSession),
            "manual-revoke" => Some(Self::ManualRevoke),
            "reuse-detected" => Some(Self::ReuseDetected),
            "security-violation" => Some(Self::SecurityViolation),
            "new-session-created" => Some(Self::NewSessionCreated),
            _ => None,
        }
    }
}

/// A session record.
///
/// `id` is stable across rotations of the same logical session; rotation
/// rewrites `refresh_token`, `fingerprint`, `ip`, `user_agent`,
/// `expires_at`, `rotated_at`, and `last_activity` in place. `ip` and
/// `user_agent` always hold the last-seen normalized values.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub refresh_token: String,
    pub fingerprint: String,
    pub ip: String,
    pub user_agent: String,
    pub last_activity: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub rotated_at: Option<DateTime<Utc>>,
    pub is_valid: bool,
    pub revoked_at: Option<DateTime<Utc>>,
    pub revoked_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn reason(&self) -> Option<RevokedReason> {
        self.revoked_reason.as_deref().and_then(RevokedReason::parse)
    }
}

/// Classification of a presented refresh token from the rotation engine's
/// point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    /// Matching record, still valid and unexpired.
    Valid,
    /// Matching valid record whose expiry has lapsed.
    Expired,
    /// The token was superseded by a fresh login on the same device within
    /// the reuse window.
    ReusedRecently,
    /// No usable interpretation of the token.
    Unknown,
}

/// Classifies a presented refresh token against the record it matched (if
/// any). Pure function; every store side effect is decided by the caller.
pub fn classify(session: Option<&Session>, now: DateTime<Utc>) -> RefreshState {
    let Some(session) = session else {
        return RefreshState::Unknown;
    };

    if session.is_valid {
        return if now < session.expires_at {
            RefreshState::Valid
        } else {
            RefreshState::Expired
        };
    }

    let superseded_recently = session.reason() == Some(RevokedReason::NewSessionCreated)
        && session
            .revoked_at
            .is_some_and(|at| now - at <= Duration::seconds(REUSE_WINDOW_SECS));

    if superseded_recently {
        RefreshState::ReusedRecently
    } else {
        RefreshState::Unknown
    }
}

// Request/response DTOs

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: PublicUser,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1))]
    pub current_password: String,
    #[validate(length(min = 8))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RevokeAllRequest {
    pub user_id: Uuid,
    /// Revocation reason to record; defaults to `manual-revoke`.
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RevokeAllResponse {
    pub revoked: u64,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SessionListQuery {
    /// Defaults to the requesting user.
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Session shape exposed on the panel surface. The token itself is never
/// returned.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionSummary {
    pub id: Uuid,
    pub user_id: Uuid,
    pub ip: String,
    pub user_agent: String,
    pub last_activity: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub rotated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&Session> for SessionSummary {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id,
            user_id: session.user_id,
            ip: session.ip.clone(),
            user_agent: session.user_agent.clone(),
            last_activity: session.last_activity,
            expires_at: session.expires_at,
            rotated_at: session.rotated_at,
            created_at: session.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_session(now: DateTime<Utc>) -> Session {
        Session {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            refresh_token: "token".to_string(),
            fingerprint: "fp".to_string(),
            ip: "1.2.3.4".to_string(),
            user_agent: "agent".to_string(),
            last_activity: now,
            expires_at: now + Duration::days(30),
            rotated_at: None,
            is_valid: true,
            revoked_at: None,
            revoked_reason: None,
            created_at: now,
        }
    }

    #[test]
    fn test_classify_missing_record_is_unknown() {
        assert_eq!(classify(None, Utc::now()), RefreshState::Unknown);
    }

    #[test]
    fn test_classify_valid() {
        let now = Utc::now();
        let session = make_session(now);
        assert_eq!(classify(Some(&session), now), RefreshState::Valid);
    }

    #[test]
    fn test_classify_expired() {
        let now = Utc::now();
        let mut session = make_session(now);
        session.expires_at = now - Duration::seconds(1);
        assert_eq!(classify(Some(&session), now), RefreshState::Expired);
    }

    #[test]
    fn test_classify_reused_within_window() {
        let now = Utc::now();
        let mut session = make_session(now);
        session.is_valid = false;
        session.revoked_at = Some(now - Duration::seconds(2));
        session.revoked_reason = Some("new-session-created".to_string());
        assert_eq!(classify(Some(&session), now), RefreshState::ReusedRecently);
    }

    #[test]
    fn test_classify_reuse_window_closes() {
        let now = Utc::now();
        let mut session = make_session(now);
        session.is_valid = false;
        session.revoked_at = Some(now - Duration::seconds(10));
        session.revoked_reason = Some("new-session-created".to_string());
        assert_eq!(classify(Some(&session), now), RefreshState::Unknown);
    }

    #[test]
    fn test_classify_other_revocations_are_unknown() {
        let now = Utc::now();
        let mut session = make_session(now);
        session.is_valid = false;
        session.revoked_at = Some(now - Duration::seconds(1));
        // Revoked just now, but not by a superseding login.
        session.revoked_reason = Some("logout".to_string());
        assert_eq!(classify(Some(&session), now), RefreshState::Unknown);
    }

    #[test]
    fn test_reason_round_trip() {
        for reason in [
            RevokedReason::Logout,
            RevokedReason::Expired,
            RevokedReason::FingerprintMismatch,
            RevokedReason::SingleDeviceSession,
            RevokedReason::ManualRevoke,
            RevokedReason::ReuseDetected,
            RevokedReason::SecurityViolation,
            RevokedReason::NewSessionCreated,
        ] {
            assert_eq!(RevokedReason::parse(reason.as_str()), Some(reason));
        }
        assert_eq!(RevokedReason::parse("unplugged"), None);
    }
}
