//! Application state shared across handlers

use crate::cookie::CookieConfig;
use crate::session::SessionAuthority;

pub struct AppState<S> {
    pub authority: SessionAuthority<S>,
    pub cookie: CookieConfig,
}

impl<S> AppState<S> {
    pub fn new(authority: SessionAuthority<S>, cookie: CookieConfig) -> Self {
        Self { authority, cookie }
    }
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            authority: self.authority.clone(),
            cookie: self.cookie.clone(),
        }
    }
}
