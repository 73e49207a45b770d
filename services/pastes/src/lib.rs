//! Pastebin service: users, sessions and pastes behind a JSON API

pub mod config;
pub mod cookie;
pub mod credential;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod session;
pub mod state;
pub mod store;
pub mod token;
pub mod validation;
