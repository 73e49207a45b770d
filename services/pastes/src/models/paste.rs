//! Paste model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Paste entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Paste {
    pub paste_id: String,
    pub username: String,
    pub content: String,
    pub lang: String,
    pub created_at: DateTime<Utc>,
}

/// New paste creation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPaste {
    pub content: String,
    pub lang: String,
}

impl NewPaste {
    pub fn new(content: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            lang: lang.into(),
        }
    }
}
