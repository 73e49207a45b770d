//! PostgreSQL-backed persistence gateway

use common::error::{ConstraintViolation, DatabaseError};
use sqlx::PgPool;
use tracing::info;

use super::{Store, StoreError, StoreResult, insert_with_fresh_id};
use crate::credential::hash_password;
use crate::models::{NewPaste, NewUser, Paste, Session, User};
use crate::token::{PASTE_ID_LEN, SESSION_ID_LEN, random_token};

const CREATE_USERS: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        username VARCHAR(50) PRIMARY KEY CHECK (username <> ''),
        full_name VARCHAR(225),
        bio TEXT,
        email TEXT UNIQUE NOT NULL CHECK (email <> ''),
        password_hash TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
"#;

const CREATE_SESSIONS: &str = r#"
    CREATE TABLE IF NOT EXISTS sessions (
        session_id VARCHAR(50) PRIMARY KEY,
        username VARCHAR(50) NOT NULL REFERENCES users(username),
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        valid BOOLEAN NOT NULL DEFAULT TRUE
    )
"#;

const CREATE_PASTES: &str = r#"
    CREATE TABLE IF NOT EXISTS pastes (
        paste_id VARCHAR(50) PRIMARY KEY,
        username VARCHAR(50) NOT NULL REFERENCES users(username),
        content TEXT NOT NULL CHECK (content <> ''),
        lang VARCHAR(50) NOT NULL CHECK (lang <> ''),
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
"#;

/// Translate an insert failure, mapping unique violations with `on_unique`
fn map_insert_error(err: sqlx::Error, on_unique: fn() -> StoreError) -> StoreError {
    let err = DatabaseError::Query(err);
    match err.constraint_violation() {
        Some(ConstraintViolation::Unique) => on_unique(),
        Some(ConstraintViolation::ForeignKey) => StoreError::ForeignKeyViolation,
        None => StoreError::Database(err),
    }
}

/// Store backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new store over an initialized pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl Store for PgStore {
    async fn initialize(&self) -> StoreResult<()> {
        info!("Preparing database schema");

        let mut tx = self.pool.begin().await.map_err(DatabaseError::Migration)?;
        for statement in [CREATE_USERS, CREATE_SESSIONS, CREATE_PASTES] {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .map_err(DatabaseError::Migration)?;
        }
        tx.commit().await.map_err(DatabaseError::Migration)?;

        info!("Database schema ready");
        Ok(())
    }

    async fn create_user(&self, new_user: &NewUser) -> StoreResult<()> {
        info!("Creating new user: {}", new_user.username);

        let password_hash = hash_password(&new_user.password)?;

        sqlx::query(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&password_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, || StoreError::DuplicateUser))?;

        Ok(())
    }

    async fn create_session(&self, username: &str) -> StoreResult<String> {
        let pool = &self.pool;

        let session_id = insert_with_fresh_id(
            || random_token(SESSION_ID_LEN),
            |session_id| async move {
                sqlx::query("INSERT INTO sessions (session_id, username) VALUES ($1, $2)")
                    .bind(&session_id)
                    .bind(username)
                    .execute(pool)
                    .await
                    .map_err(|e| map_insert_error(e, || StoreError::IdCollision))?;
                Ok(())
            },
        )
        .await?;

        info!("Created session for user: {}", username);
        Ok(session_id)
    }

    async fn create_paste(&self, username: &str, new_paste: &NewPaste) -> StoreResult<String> {
        let pool = &self.pool;

        let paste_id = insert_with_fresh_id(
            || random_token(PASTE_ID_LEN),
            |paste_id| async move {
                sqlx::query(
                    r#"
                    INSERT INTO pastes (paste_id, username, content, lang)
                    VALUES ($1, $2, $3, $4)
                    "#,
                )
                .bind(&paste_id)
                .bind(username)
                .bind(&new_paste.content)
                .bind(&new_paste.lang)
                .execute(pool)
                .await
                .map_err(|e| map_insert_error(e, || StoreError::IdCollision))?;
                Ok(())
            },
        )
        .await?;

        info!("Created paste {} for user: {}", paste_id, username);
        Ok(paste_id)
    }

    async fn get_all_pastes(&self) -> StoreResult<Vec<Paste>> {
        let pastes = sqlx::query_as::<_, Paste>(
            "SELECT paste_id, username, content, lang, created_at FROM pastes",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(pastes)
    }

    async fn get_pastes_by_user(&self, username: &str) -> StoreResult<Vec<Paste>> {
        let pastes = sqlx::query_as::<_, Paste>(
            r#"
            SELECT paste_id, username, content, lang, created_at
            FROM pastes
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_all(&self.pool)
        .await?;

        Ok(pastes)
    }

    async fn get_user(&self, username: &str) -> StoreResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT username, email, full_name, bio, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn get_user_password_hash(&self, username: &str) -> StoreResult<String> {
        sqlx::query_scalar::<_, String>("SELECT password_hash FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn get_session_owner(&self, session_id: &str) -> StoreResult<String> {
        sqlx::query_scalar::<_, String>("SELECT username FROM sessions WHERE session_id = $1")
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn get_session(&self, session_id: &str) -> StoreResult<Session> {
        sqlx::query_as::<_, Session>(
            r#"
            SELECT session_id, username, created_at, valid
            FROM sessions
            WHERE session_id = $1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn invalidate_session(&self, session_id: &str) -> StoreResult<()> {
        let result = sqlx::query("UPDATE sessions SET valid = FALSE WHERE session_id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        info!("Invalidated session");
        Ok(())
    }
}
