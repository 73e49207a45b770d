//! In-memory persistence gateway
//!
//! Enforces the same uniqueness and foreign-key rules as the relational
//! schema so it can stand in for [`PgStore`](super::PgStore) in tests and
//! single-process runs.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::info;

use super::{Store, StoreError, StoreResult, insert_with_fresh_id};
use crate::credential::hash_password;
use crate::models::{NewPaste, NewUser, Paste, Session, User};
use crate::token::{PASTE_ID_LEN, SESSION_ID_LEN, random_token};

type IdSource = Arc<dyn Fn(usize) -> String + Send + Sync>;

#[derive(Debug)]
struct UserRow {
    user: User,
    password_hash: String,
}

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<String, UserRow>,
    sessions: HashMap<String, Session>,
    pastes: Vec<Paste>,
}

impl Tables {
    fn email_taken(&self, email: &str) -> bool {
        self.users.values().any(|row| row.user.email == email)
    }
}

/// Store holding every table behind one async mutex
#[derive(Clone)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    ids: IdSource,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store with random identifiers
    pub fn new() -> Self {
        Self::with_id_source(random_token)
    }

    /// Create an empty store drawing identifiers from `ids`
    pub fn with_id_source(ids: impl Fn(usize) -> String + Send + Sync + 'static) -> Self {
        Self {
            tables: Arc::new(Mutex::new(Tables::default())),
            ids: Arc::new(ids),
        }
    }

    /// Shift a session's creation time into the past
    #[cfg(test)]
    pub(crate) async fn backdate_session(&self, session_id: &str, by: chrono::TimeDelta) {
        let mut tables = self.tables.lock().await;
        if let Some(session) = tables.sessions.get_mut(session_id) {
            session.created_at -= by;
        }
    }

    #[cfg(test)]
    pub(crate) async fn session_count(&self) -> usize {
        self.tables.lock().await.sessions.len()
    }
}

impl Store for MemoryStore {
    async fn initialize(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn create_user(&self, new_user: &NewUser) -> StoreResult<()> {
        info!("Creating new user: {}", new_user.username);

        let password_hash = hash_password(&new_user.password)?;

        let mut tables = self.tables.lock().await;
        if tables.users.contains_key(&new_user.username) || tables.email_taken(&new_user.email) {
            return Err(StoreError::DuplicateUser);
        }

        let user = User {
            username: new_user.username.clone(),
            email: new_user.email.clone(),
            full_name: None,
            bio: None,
            created_at: Utc::now(),
        };
        tables.users.insert(
            new_user.username.clone(),
            UserRow {
                user,
                password_hash,
            },
        );

        Ok(())
    }

    async fn create_session(&self, username: &str) -> StoreResult<String> {
        let tables = &self.tables;

        let session_id = insert_with_fresh_id(
            || (self.ids)(SESSION_ID_LEN),
            |session_id| async move {
                let mut tables = tables.lock().await;
                if !tables.users.contains_key(username) {
                    return Err(StoreError::ForeignKeyViolation);
                }
                if tables.sessions.contains_key(&session_id) {
                    return Err(StoreError::IdCollision);
                }

                let session = Session {
                    session_id: session_id.clone(),
                    username: username.to_string(),
                    created_at: Utc::now(),
                    valid: true,
                };
                tables.sessions.insert(session_id, session);
                Ok(())
            },
        )
        .await?;

        info!("Created session for user: {}", username);
        Ok(session_id)
    }

    async fn create_paste(&self, username: &str, new_paste: &NewPaste) -> StoreResult<String> {
        let tables = &self.tables;

        let paste_id = insert_with_fresh_id(
            || (self.ids)(PASTE_ID_LEN),
            |paste_id| async move {
                let mut tables = tables.lock().await;
                if !tables.users.contains_key(username) {
                    return Err(StoreError::ForeignKeyViolation);
                }
                if tables.pastes.iter().any(|p| p.paste_id == paste_id) {
                    return Err(StoreError::IdCollision);
                }

                tables.pastes.push(Paste {
                    paste_id,
                    username: username.to_string(),
                    content: new_paste.content.clone(),
                    lang: new_paste.lang.clone(),
                    created_at: Utc::now(),
                });
                Ok(())
            },
        )
        .await?;

        info!("Created paste {} for user: {}", paste_id, username);
        Ok(paste_id)
    }

    async fn get_all_pastes(&self) -> StoreResult<Vec<Paste>> {
        Ok(self.tables.lock().await.pastes.clone())
    }

    async fn get_pastes_by_user(&self, username: &str) -> StoreResult<Vec<Paste>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .pastes
            .iter()
            .filter(|p| p.username == username)
            .cloned()
            .collect())
    }

    async fn get_user(&self, username: &str) -> StoreResult<User> {
        let tables = self.tables.lock().await;
        tables
            .users
            .get(username)
            .map(|row| row.user.clone())
            .ok_or(StoreError::NotFound)
    }

    async fn get_user_password_hash(&self, username: &str) -> StoreResult<String> {
        let tables = self.tables.lock().await;
        tables
            .users
            .get(username)
            .map(|row| row.password_hash.clone())
            .ok_or(StoreError::NotFound)
    }

    async fn get_session_owner(&self, session_id: &str) -> StoreResult<String> {
        let tables = self.tables.lock().await;
        tables
            .sessions
            .get(session_id)
            .map(|s| s.username.clone())
            .ok_or(StoreError::NotFound)
    }

    async fn get_session(&self, session_id: &str) -> StoreResult<Session> {
        let tables = self.tables.lock().await;
        tables
            .sessions
            .get(session_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn invalidate_session(&self, session_id: &str) -> StoreResult<()> {
        let mut tables = self.tables.lock().await;
        let session = tables
            .sessions
            .get_mut(session_id)
            .ok_or(StoreError::NotFound)?;
        session.valid = false;

        info!("Invalidated session");
        Ok(())
    }
}
