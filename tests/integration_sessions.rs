mod common;

use common::{create_test_user, generate_unique_email, test_config};
use sqlx::PgPool;

use rollcall::middleware::client::ClientInfo;
use rollcall::modules::sessions::repository::SessionRepository;
use rollcall::modules::sessions::service::SessionService;
use rollcall::modules::users::model::Identity;
use rollcall::modules::users::service::UserService;
use rollcall::rollcall_core::AppError;

fn desktop_client() -> ClientInfo {
    ClientInfo {
        ip: "203.0.113.5".to_string(),
        user_agent: "Mozilla/5.0 (X11; Linux x86_64) Chrome/120.0.0.0".to_string(),
    }
}

fn phone_client() -> ClientInfo {
    ClientInfo {
        ip: "198.51.100.7".to_string(),
        user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) Safari/604.1"
            .to_string(),
    }
}

async fn setup_identity(pool: &PgPool, role: &str) -> Identity {
    let user = create_test_user(pool, &generate_unique_email(), "testpass123", role, "active").await;
    UserService::find_identity(pool, user.id)
        .await
        .unwrap()
        .unwrap()
}

async fn revoked_reason(pool: &PgPool, session_id: uuid::Uuid) -> Option<String> {
    sqlx::query_scalar("SELECT revoked_reason FROM sessions WHERE id = $1")
        .bind(session_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[sqlx::test(migrations = "./migrations")]
async fn test_issue_creates_valid_session(pool: PgPool) {
    let config = test_config(false);
    let identity = setup_identity(&pool, "student").await;

    let issued = SessionService::issue(&pool, &config, &identity, &desktop_client())
        .await
        .unwrap();

    assert_eq!(issued.refresh_token.len(), 64);
    assert!(issued.session.is_valid);
    assert!(issued.session.expires_at > chrono::Utc::now());
    assert!(!issued.access_token.is_empty());

    let valid = SessionRepository::list_valid_for_user(&pool, identity.id)
        .await
        .unwrap();
    assert_eq!(valid.len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_second_login_supersedes_same_device(pool: PgPool) {
    let config = test_config(false);
    let identity = setup_identity(&pool, "student").await;

    let first = SessionService::issue(&pool, &config, &identity, &desktop_client())
        .await
        .unwrap();
    let second = SessionService::issue(&pool, &config, &identity, &desktop_client())
        .await
        .unwrap();

    assert_ne!(first.refresh_token, second.refresh_token);

    let reason = revoked_reason(&pool, first.session.id).await;
    assert_eq!(reason.as_deref(), Some("new-session-created"));

    let valid = SessionRepository::list_valid_for_user(&pool, identity.id)
        .await
        .unwrap();
    assert_eq!(valid.len(), 1);
    assert_eq!(valid[0].id, second.session.id);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_logins_from_different_devices_coexist(pool: PgPool) {
    let config = test_config(false);
    let identity = setup_identity(&pool, "student").await;

    SessionService::issue(&pool, &config, &identity, &desktop_client())
        .await
        .unwrap();
    SessionService::issue(&pool, &config, &identity, &phone_client())
        .await
        .unwrap();

    let valid = SessionRepository::list_valid_for_user(&pool, identity.id)
        .await
        .unwrap();
    assert_eq!(valid.len(), 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_privileged_login_enforces_single_session(pool: PgPool) {
    let config = test_config(false);
    let identity = setup_identity(&pool, "admin").await;

    let desktop = SessionService::issue(&pool, &config, &identity, &desktop_client())
        .await
        .unwrap();
    let phone = SessionService::issue(&pool, &config, &identity, &phone_client())
        .await
        .unwrap();

    let reason = revoked_reason(&pool, desktop.session.id).await;
    assert_eq!(reason.as_deref(), Some("single-device-session"));

    let valid = SessionRepository::list_valid_for_user(&pool, identity.id)
        .await
        .unwrap();
    assert_eq!(valid.len(), 1);
    assert_eq!(valid[0].id, phone.session.id);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_refresh_rotates_in_place(pool: PgPool) {
    let config = test_config(false);
    let identity = setup_identity(&pool, "student").await;

    let issued = SessionService::issue(&pool, &config, &identity, &desktop_client())
        .await
        .unwrap();

    let (rotated, _) =
        SessionService::refresh(&pool, &config, &issued.refresh_token, &desktop_client())
            .await
            .unwrap();

    // Same logical session, new token, rotation recorded.
    assert_eq!(rotated.session.id, issued.session.id);
    assert_ne!(rotated.refresh_token, issued.refresh_token);
    assert!(rotated.session.rotated_at.is_some());
    assert!(rotated.session.last_activity >= issued.session.last_activity);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_rotated_out_token_is_rejected(pool: PgPool) {
    let config = test_config(false);
    let identity = setup_identity(&pool, "student").await;

    let issued = SessionService::issue(&pool, &config, &identity, &desktop_client())
        .await
        .unwrap();

    SessionService::refresh(&pool, &config, &issued.refresh_token, &desktop_client())
        .await
        .unwrap();

    // Rotation rewrote the token in place; the old value matches nothing.
    let err = SessionService::refresh(&pool, &config, &issued.refresh_token, &desktop_client())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::SessionInvalidOrExpired));

    let valid = SessionRepository::list_valid_for_user(&pool, identity.id)
        .await
        .unwrap();
    assert_eq!(valid.len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_refresh_of_expired_session_marks_it_expired(pool: PgPool) {
    let config = test_config(false);
    let identity = setup_identity(&pool, "student").await;

    let issued = SessionService::issue(&pool, &config, &identity, &desktop_client())
        .await
        .unwrap();

    sqlx::query("UPDATE sessions SET expires_at = now() - interval '1 second' WHERE id = $1")
        .bind(issued.session.id)
        .execute(&pool)
        .await
        .unwrap();

    let err = SessionService::refresh(&pool, &config, &issued.refresh_token, &desktop_client())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::SessionInvalidOrExpired));

    let reason = revoked_reason(&pool, issued.session.id).await;
    assert_eq!(reason.as_deref(), Some("expired"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_reuse_inside_window_revokes_everything(pool: PgPool) {
    let config = test_config(false);
    let identity = setup_identity(&pool, "student").await;

    let stale = SessionService::issue(&pool, &config, &identity, &desktop_client())
        .await
        .unwrap();
    // Fresh login on the same device supersedes the first session.
    SessionService::issue(&pool, &config, &identity, &desktop_client())
        .await
        .unwrap();
    // Unrelated session on another device, collateral of the cascade.
    SessionService::issue(&pool, &config, &identity, &phone_client())
        .await
        .unwrap();

    let err = SessionService::refresh(&pool, &config, &stale.refresh_token, &desktop_client())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ReuseDetected));

    let valid = SessionRepository::list_valid_for_user(&pool, identity.id)
        .await
        .unwrap();
    assert!(valid.is_empty());

    let events: i64 =
        sqlx::query_scalar("SELECT count(*) FROM security_events WHERE user_id = $1 AND event = $2")
            .bind(identity.id)
            .bind("refresh-token-reuse")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(events, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_reuse_after_window_is_just_unknown(pool: PgPool) {
    let config = test_config(false);
    let identity = setup_identity(&pool, "student").await;

    let stale = SessionService::issue(&pool, &config, &identity, &desktop_client())
        .await
        .unwrap();
    let fresh = SessionService::issue(&pool, &config, &identity, &desktop_client())
        .await
        .unwrap();

    // Age the supersession past the reuse window.
    sqlx::query("UPDATE sessions SET revoked_at = now() - interval '11 seconds' WHERE id = $1")
        .bind(stale.session.id)
        .execute(&pool)
        .await
        .unwrap();

    let err = SessionService::refresh(&pool, &config, &stale.refresh_token, &desktop_client())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::SessionInvalidOrExpired));

    // No cascade: the live session survives.
    let valid = SessionRepository::list_valid_for_user(&pool, identity.id)
        .await
        .unwrap();
    assert_eq!(valid.len(), 1);
    assert_eq!(valid[0].id, fresh.session.id);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_refresh_blocked_for_suspended_account(pool: PgPool) {
    let config = test_config(false);
    let identity = setup_identity(&pool, "student").await;

    let issued = SessionService::issue(&pool, &config, &identity, &desktop_client())
        .await
        .unwrap();

    sqlx::query("UPDATE users SET status = 'suspended' WHERE id = $1")
        .bind(identity.id)
        .execute(&pool)
        .await
        .unwrap();

    let err = SessionService::refresh(&pool, &config, &issued.refresh_token, &desktop_client())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AccountInactive));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_revoke_one_is_idempotent(pool: PgPool) {
    let config = test_config(false);
    let identity = setup_identity(&pool, "student").await;

    let issued = SessionService::issue(&pool, &config, &identity, &desktop_client())
        .await
        .unwrap();

    SessionService::revoke_one(&pool, &issued.refresh_token)
        .await
        .unwrap();
    // Replaying logout with the same token still succeeds.
    SessionService::revoke_one(&pool, &issued.refresh_token)
        .await
        .unwrap();

    let reason = revoked_reason(&pool, issued.session.id).await;
    assert_eq!(reason.as_deref(), Some("logout"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_revoke_all_counts_and_clears(pool: PgPool) {
    let config = test_config(false);
    let identity = setup_identity(&pool, "student").await;

    SessionService::issue(&pool, &config, &identity, &desktop_client())
        .await
        .unwrap();
    SessionService::issue(&pool, &config, &identity, &phone_client())
        .await
        .unwrap();

    let revoked = SessionService::revoke_all(
        &pool,
        identity.id,
        rollcall::modules::sessions::model::RevokedReason::ManualRevoke,
    )
    .await
    .unwrap();
    assert_eq!(revoked, 2);

    let valid = SessionRepository::list_valid_for_user(&pool, identity.id)
        .await
        .unwrap();
    assert!(valid.is_empty());
}
