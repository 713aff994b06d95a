//! Refresh-token cookie

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

pub const REFRESH_COOKIE_NAME: &str = "refresh_token";

/// Attributes of the refresh cookie
#[derive(Debug, Clone)]
pub struct RefreshCookie {
    /// Only sent over HTTPS; enabled in production
    pub secure: bool,
    pub max_age: chrono::Duration,
}

impl RefreshCookie {
    pub fn new(secure: bool, max_age: chrono::Duration) -> Self {
        Self { secure, max_age }
    }

    /// Store `token` in the jar, replacing any previous refresh cookie
    pub fn set(&self, jar: CookieJar, token: String) -> CookieJar {
        let cookie = Cookie::build((REFRESH_COOKIE_NAME, token))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Strict)
            .path("/")
            .max_age(time::Duration::seconds(self.max_age.num_seconds()));

        jar.add(cookie)
    }

    /// Expire the refresh cookie on the client
    pub fn clear(&self, jar: CookieJar) -> CookieJar {
        jar.remove(Cookie::build(REFRESH_COOKIE_NAME).path("/"))
    }
}

/// Read the presented refresh token, if any
pub fn refresh_token_from(jar: &CookieJar) -> Option<String> {
    jar.get(REFRESH_COOKIE_NAME)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}
