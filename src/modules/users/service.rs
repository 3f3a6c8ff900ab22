use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use rollcall_core::{AppError, hash_password, verify_password};

use super::model::{AccountStatus, Identity, UserRole, UserRow};

/// Narrow identity collaborator consumed by the session subsystem.
pub struct UserService;

impl UserService {
    /// Checks an email/password pair and returns the matching identity.
    /// A missing account and a wrong password are indistinguishable to the
    /// caller.
    #[instrument(skip(db, password))]
    pub async fn verify_credentials(
        db: &PgPool,
        email: &str,
        password: &str,
    ) -> Result<Identity, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, first_name, last_name, email, password, role, status, deleted_at
             FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(password, &row.password)? {
            return Err(AppError::InvalidCredentials);
        }

        identity_from_row(row)
    }

    /// Fetches the live identity for a user id, or `None` when the user no
    /// longer exists.
    #[instrument(skip(db))]
    pub async fn find_identity(db: &PgPool, user_id: Uuid) -> Result<Option<Identity>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, first_name, last_name, email, password, role, status, deleted_at
             FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(db)
        .await?;

        row.map(identity_from_row).transpose()
    }

    /// Replaces a user's password after verifying the current one.
    /// Revoking the user's sessions is the caller's responsibility.
    #[instrument(skip(db, current_password, new_password))]
    pub async fn change_password(
        db: &PgPool,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, first_name, last_name, email, password, role, status, deleted_at
             FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(current_password, &row.password)? {
            return Err(AppError::InvalidCredentials);
        }

        let hashed = hash_password(new_password)?;

        sqlx::query("UPDATE users SET password = $2 WHERE id = $1")
            .bind(user_id)
            .bind(&hashed)
            .execute(db)
            .await?;

        Ok(())
    }
}

fn identity_from_row(row: UserRow) -> Result<Identity, AppError> {
    let role = UserRole::parse(&row.role)
        .ok_or_else(|| AppError::Internal(format!("user {} has unknown role", row.id)))?;
    let status = AccountStatus::parse(&row.status)
        .ok_or_else(|| AppError::Internal(format!("user {} has unknown status", row.id)))?;

    Ok(Identity {
        id: row.id,
        first_name: row.first_name,
        last_name: row.last_name,
        email: row.email,
        role,
        status,
        deleted: row.deleted_at.is_some(),
    })
}
