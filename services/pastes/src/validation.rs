//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

use crate::models::{NewPaste, NewUser};

/// Longest accepted username, matching the `users.username` column
pub const MAX_USERNAME_LEN: usize = 50;

/// Longest accepted language tag, matching the `pastes.lang` column
pub const MAX_LANG_LEN: usize = 50;

pub const MAX_EMAIL_LEN: usize = 254;

pub const MAX_PASSWORD_LEN: usize = 128;

/// Rejected request input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(String);

impl ValidationError {
    fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Validate username
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(ValidationError::new("Username is required"));
    }

    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(ValidationError::new(format!(
            "Username must be at most {} characters long",
            MAX_USERNAME_LEN
        )));
    }

    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = USERNAME_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9_.-]+$").expect("Failed to compile username regex")
    });

    if !regex.is_match(username) {
        return Err(ValidationError::new(
            "Username can only contain letters, numbers, dots, dashes and underscores",
        ));
    }

    Ok(())
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::new("Email is required"));
    }

    if email.len() > MAX_EMAIL_LEN {
        return Err(ValidationError::new(format!(
            "Email must be at most {} characters long",
            MAX_EMAIL_LEN
        )));
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err(ValidationError::new("Invalid email format"));
    }

    Ok(())
}

/// Validate password
///
/// Only presence and an upper bound are enforced; strength is up to the user.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::new("Password is required"));
    }

    if password.chars().count() > MAX_PASSWORD_LEN {
        return Err(ValidationError::new(format!(
            "Password must be at most {} characters long",
            MAX_PASSWORD_LEN
        )));
    }

    Ok(())
}

/// Validate a registration payload
pub fn validate_new_user(new_user: &NewUser) -> Result<(), ValidationError> {
    validate_username(&new_user.username)?;
    validate_email(&new_user.email)?;
    validate_password(&new_user.password)
}

/// Validate a paste payload
pub fn validate_paste(new_paste: &NewPaste) -> Result<(), ValidationError> {
    if new_paste.content.trim().is_empty() {
        return Err(ValidationError::new("Paste content is required"));
    }

    let lang = new_paste.lang.trim();
    if lang.is_empty() {
        return Err(ValidationError::new("Paste language is required"));
    }

    if lang.chars().count() > MAX_LANG_LEN {
        return Err(ValidationError::new(format!(
            "Language must be at most {} characters long",
            MAX_LANG_LEN
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usernames() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("a").is_ok());
        assert!(validate_username("first.last-2_x").is_ok());
        assert!(validate_username(&"a".repeat(MAX_USERNAME_LEN)).is_ok());

        assert!(validate_username("").is_err());
        assert!(validate_username(&"a".repeat(MAX_USERNAME_LEN + 1)).is_err());
        assert!(validate_username("alice smith").is_err());
        assert!(validate_username("alice/../bob").is_err());
    }

    #[test]
    fn test_emails() {
        assert!(validate_email("a@x.com").is_ok());
        assert!(validate_email("first.last+tag@example.co.uk").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("a@x").is_err());
    }

    #[test]
    fn test_passwords() {
        assert!(validate_password("pw123").is_ok());
        assert!(validate_password(&"x".repeat(MAX_PASSWORD_LEN)).is_ok());

        assert_eq!(
            validate_password("").unwrap_err().to_string(),
            "Password is required"
        );
        assert!(validate_password(&"x".repeat(MAX_PASSWORD_LEN + 1)).is_err());
    }

    #[test]
    fn test_new_user_reports_first_failure() {
        let err = validate_new_user(&NewUser::new("", "bad", "")).unwrap_err();
        assert_eq!(err.to_string(), "Username is required");

        assert!(validate_new_user(&NewUser::new("alice", "a@x.com", "pw123")).is_ok());
    }

    #[test]
    fn test_pastes() {
        assert!(validate_paste(&NewPaste::new("fn main() {}", "rust")).is_ok());

        assert!(validate_paste(&NewPaste::new("", "rust")).is_err());
        assert!(validate_paste(&NewPaste::new("   \n", "rust")).is_err());
        assert!(validate_paste(&NewPaste::new("x", "")).is_err());
        assert!(validate_paste(&NewPaste::new("x", "l".repeat(MAX_LANG_LEN + 1))).is_err());
    }
}
