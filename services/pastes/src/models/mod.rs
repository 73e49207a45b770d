//! Pastebin models

pub mod paste;
pub mod session;
pub mod user;

// Re-export for convenience
pub use paste::{NewPaste, Paste};
pub use session::Session;
pub use user::{LoginCredentials, NewUser, User};
