//! Persistence gateway for users, sessions and pastes
//!
//! [`Store`] is the capability every backend provides. [`PgStore`] is the
//! production backend; [`MemoryStore`] enforces the same constraints in
//! process memory for tests and local runs.

use std::future::Future;

use common::error::DatabaseError;
use thiserror::Error;
use tracing::warn;

use crate::credential::HashError;
use crate::models::{NewPaste, NewUser, Paste, Session, User};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// How many identifiers are generated for one insert before giving up
pub const MAX_ID_ATTEMPTS: usize = 3;

/// Errors returned by the persistence gateway
#[derive(Error, Debug)]
pub enum StoreError {
    /// Username or email is already registered
    #[error("User already exists")]
    DuplicateUser,

    /// The referenced user does not exist
    #[error("Referenced user does not exist")]
    ForeignKeyViolation,

    /// No row matched the lookup
    #[error("Record not found")]
    NotFound,

    /// Every generated identifier collided with an existing row
    #[error("Could not generate a unique identifier after {} attempts", MAX_ID_ATTEMPTS)]
    IdCollision,

    /// Password hashing failed
    #[error(transparent)]
    Hashing(#[from] HashError),

    /// Underlying store failure
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(DatabaseError::Query(err))
    }
}

/// Type alias for Result with StoreError
pub type StoreResult<T> = Result<T, StoreError>;

/// Storage capability for the pastebin core
#[trait_variant::make(Store: Send)]
pub trait LocalStore {
    /// Create the tables if they do not exist yet; safe on every start
    async fn initialize(&self) -> StoreResult<()>;

    /// Hash the password and insert a new user
    async fn create_user(&self, new_user: &NewUser) -> StoreResult<()>;

    /// Insert a session for `username` and return its identifier
    async fn create_session(&self, username: &str) -> StoreResult<String>;

    /// Insert a paste owned by `username` and return its identifier
    async fn create_paste(&self, username: &str, new_paste: &NewPaste) -> StoreResult<String>;

    /// Every paste, in no particular order
    async fn get_all_pastes(&self) -> StoreResult<Vec<Paste>>;

    /// Pastes owned by `username`; empty when there are none
    async fn get_pastes_by_user(&self, username: &str) -> StoreResult<Vec<Paste>>;

    async fn get_user(&self, username: &str) -> StoreResult<User>;

    async fn get_user_password_hash(&self, username: &str) -> StoreResult<String>;

    /// Owner of a session, ignoring its validity flag and age
    async fn get_session_owner(&self, session_id: &str) -> StoreResult<String>;

    /// Full session row, used when lifecycle checks are enforced
    async fn get_session(&self, session_id: &str) -> StoreResult<Session>;

    /// Mark a session invalid
    async fn invalidate_session(&self, session_id: &str) -> StoreResult<()>;
}

/// Run `insert` with fresh identifiers until one does not collide
///
/// `insert` reports a primary-key collision as [`StoreError::IdCollision`];
/// any other error is returned immediately.
pub(crate) async fn insert_with_fresh_id<G, F, Fut>(
    mut next_id: G,
    mut insert: F,
) -> StoreResult<String>
where
    G: FnMut() -> String,
    F: FnMut(String) -> Fut,
    Fut: Future<Output = StoreResult<()>>,
{
    for attempt in 1..=MAX_ID_ATTEMPTS {
        let id = next_id();
        match insert(id.clone()).await {
            Ok(()) => return Ok(id),
            Err(StoreError::IdCollision) => {
                warn!(attempt, "Generated identifier collided with an existing row");
            }
            Err(e) => return Err(e),
        }
    }

    Err(StoreError::IdCollision)
}
