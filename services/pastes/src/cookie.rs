//! Session cookie handling

use axum::http::HeaderMap;
use axum_extra::extract::CookieJar;

use crate::session::SessionPolicy;

/// Name of the session cookie and of the header fallback
pub const SESSION_COOKIE: &str = "session_id";

/// Session cookie attributes
#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub name: String,
    pub secure: bool,
    pub http_only: bool,
    pub path: String,
    pub max_age_secs: u64,
}

impl CookieConfig {
    /// Cookie that lives as long as a session under `policy`
    pub fn for_session(policy: &SessionPolicy, secure: bool) -> Self {
        Self {
            name: SESSION_COOKIE.to_string(),
            secure,
            http_only: true,
            path: "/".to_string(),
            max_age_secs: policy.ttl.as_secs(),
        }
    }

    /// Build the Set-Cookie header value carrying `session_id`
    pub fn build_set_cookie(&self, session_id: &str) -> String {
        self.build(session_id, self.max_age_secs)
    }

    /// Build the Set-Cookie header value that expires the cookie
    ///
    /// Carries the same attributes as [`build_set_cookie`](Self::build_set_cookie)
    /// so browsers match it against the issued cookie.
    pub fn build_delete_cookie(&self) -> String {
        self.build("", 0)
    }

    fn build(&self, value: &str, max_age_secs: u64) -> String {
        let mut cookie = format!("{}={}", self.name, value);

        if self.http_only {
            cookie.push_str("; HttpOnly");
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str("; SameSite=Lax");
        cookie.push_str(&format!("; Path={}", self.path));
        cookie.push_str(&format!("; Max-Age={}", max_age_secs));

        cookie
    }
}

/// Session token from the cookie, falling back to the `session_id` header
pub fn session_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    headers
        .get(SESSION_COOKIE)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
