//! Random identifiers for sessions and pastes

use rand::Rng;
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;

/// Length of a session identifier
pub const SESSION_ID_LEN: usize = 25;

/// Length of a paste identifier
pub const PASTE_ID_LEN: usize = 10;

/// Characters a token is drawn from
pub const ALPHABET: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate `length` characters uniformly from [`ALPHABET`] using the OS CSPRNG
pub fn random_token(length: usize) -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}
