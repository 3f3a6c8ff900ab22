//! # Rollcall Config
//!
//! Configuration types for the Rollcall API, loaded from environment
//! variables and validated before the process serves any traffic.
//!
//! - [`session`]: secrets, token lifetimes, and cookie settings for the
//!   session subsystem

pub mod session;

// Re-export commonly used types at crate root
pub use session::{ConfigError, CookieSettings, SessionConfig};
