//! # Rollcall Core
//!
//! Core types and utilities for the Rollcall API.
//!
//! This crate provides foundational pieces used throughout the application:
//!
//! - [`errors`]: the application error taxonomy with HTTP response conversion
//! - [`password`]: secure password hashing and verification

pub mod errors;
pub mod password;

// Re-export commonly used types at crate root
pub use errors::AppError;
pub use password::{hash_password, verify_password};
