//! Session subsystem configuration.
//!
//! All security-critical values are required and validated at startup; a
//! missing or unparsable value is fatal and the process must not serve
//! traffic.
//!
//! # Environment Variables
//!
//! Required:
//!
//! - `JWT_SECRET`: signing secret for access tokens
//! - `FINGERPRINT_SECRET`: keyed-hash secret for device fingerprints
//! - `JWT_ACCESS_EXPIRY`: access token lifetime in seconds
//! - `REFRESH_TOKEN_DAYS`: default refresh token lifetime in days
//!
//! Optional:
//!
//! - `APP_ENV`: `production` enables `Secure` + `SameSite=Strict` cookies
//! - `PANEL_STRICT_BINDING`: `true`/`1` enables per-request device binding
//!   checks on the control-panel surface
//! - `COOKIE_DOMAIN`: shared cookie domain for multi-subdomain deployments

use std::env;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("environment variable {0} has an invalid value")]
    Invalid(&'static str),
}

/// Refresh cookie attributes derived from the deployment environment.
#[derive(Clone, Debug)]
pub struct CookieSettings {
    pub secure: bool,
    pub same_site_strict: bool,
    pub domain: Option<String>,
}

/// Immutable configuration for the session subsystem.
///
/// Constructed once at startup and passed by reference; never read from
/// ambient globals after that.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub jwt_secret: String,
    pub fingerprint_secret: String,
    /// Access token lifetime in seconds.
    pub access_token_expiry: i64,
    /// Default refresh token lifetime in days for non-privileged roles.
    pub refresh_token_days: i64,
    /// Hardened-deployment mode: compare stored and recomputed IP/agent on
    /// every control-panel request.
    pub panel_strict_binding: bool,
    pub cookie: CookieSettings,
}

impl SessionConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = require("JWT_SECRET")?;
        let fingerprint_secret = require("FINGERPRINT_SECRET")?;
        let access_token_expiry = require_parsed("JWT_ACCESS_EXPIRY")?;
        let refresh_token_days = require_parsed("REFRESH_TOKEN_DAYS")?;

        let production = env::var("APP_ENV").is_ok_and(|v| v == "production");
        let panel_strict_binding =
            env::var("PANEL_STRICT_BINDING").is_ok_and(|v| v == "true" || v == "1");

        Ok(Self {
            jwt_secret,
            fingerprint_secret,
            access_token_expiry,
            refresh_token_days,
            panel_strict_binding,
            cookie: CookieSettings {
                secure: production,
                same_site_strict: production,
                domain: env::var("COOKIE_DOMAIN").ok().filter(|d| !d.is_empty()),
            },
        })
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn require_parsed(name: &'static str) -> Result<i64, ConfigError> {
    let value = require(name)?
        .parse::<i64>()
        .map_err(|_| ConfigError::Invalid(name))?;
    if value <= 0 {
        return Err(ConfigError::Invalid(name));
    }
    Ok(value)
}
