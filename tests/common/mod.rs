use rollcall::rollcall_config::{CookieSettings, SessionConfig};
use rollcall::rollcall_core::hash_password;
use sqlx::PgPool;
use uuid::Uuid;

#[allow(dead_code)]
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub password: String,
}

/// Create a test user with the given role and status.
/// role should be one of: "system_admin", "admin", "teacher", "student"
pub async fn create_test_user(
    pool: &PgPool,
    email: &str,
    password: &str,
    role: &str,
    status: &str,
) -> TestUser {
    let hashed = hash_password(password).unwrap();

    let (id,): (Uuid,) = sqlx::query_as(
        "INSERT INTO users (first_name, last_name, email, password, role, status)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING id",
    )
    .bind("Test")
    .bind("User")
    .bind(email)
    .bind(hashed)
    .bind(role)
    .bind(status)
    .fetch_one(pool)
    .await
    .unwrap();

    TestUser {
        id,
        email: email.to_string(),
        password: password.to_string(),
    }
}

pub fn generate_unique_email() -> String {
    format!("test-{}@test.com", Uuid::new_v4())
}

/// Deterministic config so tests never depend on ambient environment.
pub fn test_config(panel_strict_binding: bool) -> SessionConfig {
    SessionConfig {
        jwt_secret: "test-jwt-secret".to_string(),
        fingerprint_secret: "test-fingerprint-secret".to_string(),
        access_token_expiry: 900,
        refresh_token_days: 30,
        panel_strict_binding,
        cookie: CookieSettings {
            secure: false,
            same_site_strict: false,
            domain: None,
        },
    }
}
