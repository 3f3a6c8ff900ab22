//! User identity models.
//!
//! The session subsystem consumes a deliberately narrow view of the user
//! entity: id, name, role, and account status. Everything else about users
//! (profiles, school scoping, enrollment) is owned elsewhere.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// System role of a user, stored as a plain string column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserRole {
    SystemAdmin,
    Admin,
    Teacher,
    Student,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SystemAdmin => "system_admin",
            Self::Admin => "admin",
            Self::Teacher => "teacher",
            Self::Student => "student",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "system_admin" => Some(Self::SystemAdmin),
            "admin" => Some(Self::Admin),
            "teacher" => Some(Self::Teacher),
            "student" => Some(Self::Student),
            _ => None,
        }
    }
}

/// Account status of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountStatus {
    Active,
    Inactive,
    Suspended,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Suspended => "suspended",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            "suspended" => Some(Self::Suspended),
            _ => None,
        }
    }
}

/// Raw user row as persisted.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub status: String,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Typed identity view handed to the session subsystem.
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: UserRole,
    pub status: AccountStatus,
    pub deleted: bool,
}

impl Identity {
    /// Whether this account may authenticate right now. Inactive,
    /// suspended, and soft-deleted accounts all fail, even when their
    /// access token is still cryptographically valid.
    pub fn is_usable(&self) -> bool {
        self.status == AccountStatus::Active && !self.deleted
    }
}

/// User shape returned to clients after login.
#[derive(Debug, Serialize, ToSchema)]
pub struct PublicUser {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
}

impl From<&Identity> for PublicUser {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id,
            first_name: identity.first_name.clone(),
            last_name: identity.last_name.clone(),
            email: identity.email.clone(),
            role: identity.role.as_str().to_string(),
        }
    }
}
