//! Refresh token cookie construction.
//!
//! The refresh token travels only in an HTTP-only cookie: `Secure` and
//! `SameSite=Strict` in production, `Lax` in development, path `/`, and
//! an optional shared domain for multi-subdomain deployments.

use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

use rollcall_config::CookieSettings;

pub const REFRESH_COOKIE: &str = "refresh_token";

/// Builds the refresh cookie with the role-appropriate lifetime in days.
pub fn refresh_cookie(token: String, ttl_days: i64, settings: &CookieSettings) -> Cookie<'static> {
    let mut cookie = Cookie::new(REFRESH_COOKIE, token);
    apply_settings(&mut cookie, settings);
    cookie.set_max_age(Duration::days(ttl_days));
    cookie
}

/// Builds the immediate-expiry cookie sent on logout.
pub fn clear_refresh_cookie(settings: &CookieSettings) -> Cookie<'static> {
    let mut cookie = Cookie::new(REFRESH_COOKIE, "");
    apply_settings(&mut cookie, settings);
    cookie.set_max_age(Duration::ZERO);
    cookie
}

fn apply_settings(cookie: &mut Cookie<'static>, settings: &CookieSettings) {
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookie.set_secure(settings.secure);
    cookie.set_same_site(if settings.same_site_strict {
        SameSite::Strict
    } else {
        SameSite::Lax
    });
    if let Some(domain) = &settings.domain {
        cookie.set_domain(domain.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dev_settings() -> CookieSettings {
        CookieSettings {
            secure: false,
            same_site_strict: false,
            domain: None,
        }
    }

    fn prod_settings() -> CookieSettings {
        CookieSettings {
            secure: true,
            same_site_strict: true,
            domain: Some("school.example".to_string()),
        }
    }

    #[test]
    fn test_development_cookie_attributes() {
        let cookie = refresh_cookie("tok".to_string(), 30, &dev_settings());
        assert_eq!(cookie.name(), REFRESH_COOKIE);
        assert_eq!(cookie.value(), "tok");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(false));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(Duration::days(30)));
        assert_eq!(cookie.domain(), None);
    }

    #[test]
    fn test_production_cookie_attributes() {
        let cookie = refresh_cookie("tok".to_string(), 365, &prod_settings());
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.domain(), Some("school.example"));
        assert_eq!(cookie.max_age(), Some(Duration::days(365)));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let cookie = clear_refresh_cookie(&dev_settings());
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
    }
}
