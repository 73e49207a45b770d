//! Session authority: login, authorization and logout
//!
//! Sessions are rows in the store keyed by a random token. By default a
//! session authorizes for as long as its row exists, which is how the service
//! has always behaved: the `valid` flag and the TTL are only consulted when
//! [`SessionPolicy::enforce_lifecycle`] is set.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;
use tracing::{info, warn};

use crate::credential::{HashError, hash_password, verify_password};
use crate::models::Session;
use crate::store::{Store, StoreError};

/// Default session lifetime, also used as the cookie `Max-Age`
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(3600);

/// Errors returned by the session authority
#[derive(Error, Debug)]
pub enum AuthError {
    /// Unknown user or wrong password; deliberately indistinguishable
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Missing, unknown or (when enforced) expired or invalidated session
    #[error("Unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Session lifetime rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    /// How long a session lasts after login
    pub ttl: Duration,
    /// Reject invalidated and expired sessions in [`SessionAuthority::authorize`]
    pub enforce_lifecycle: bool,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_SESSION_TTL,
            enforce_lifecycle: false,
        }
    }
}

impl SessionPolicy {
    /// Whether `session` is still usable at `now` under this policy's TTL
    pub fn is_active(&self, session: &Session, now: DateTime<Utc>) -> bool {
        let Ok(ttl) = TimeDelta::from_std(self.ttl) else {
            return session.valid;
        };

        match session.created_at.checked_add_signed(ttl) {
            Some(expires_at) => session.valid && now < expires_at,
            None => session.valid,
        }
    }
}

/// Issues and checks sessions over a [`Store`]
pub struct SessionAuthority<S> {
    store: Arc<S>,
    policy: SessionPolicy,
    /// Checked for unknown users so every login pays for one verification
    dummy_hash: Arc<str>,
}

impl<S> Clone for SessionAuthority<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            policy: self.policy,
            dummy_hash: Arc::clone(&self.dummy_hash),
        }
    }
}

impl<S: Store + Send + Sync> SessionAuthority<S> {
    pub fn new(store: Arc<S>, policy: SessionPolicy) -> Result<Self, HashError> {
        let dummy_hash = hash_password("no-such-user")?;
        Ok(Self {
            store,
            policy,
            dummy_hash: dummy_hash.into(),
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Verify credentials and open a new session
    pub async fn login(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let stored_hash = match self.store.get_user_password_hash(username).await {
            Ok(hash) => Some(hash),
            Err(StoreError::NotFound) => None,
            Err(e) => return Err(e.into()),
        };

        let verified = match &stored_hash {
            Some(hash) => verify_password(password, hash),
            None => {
                verify_password(password, &self.dummy_hash);
                false
            }
        };

        if !verified {
            warn!("Rejected login for user: {}", username);
            return Err(AuthError::InvalidCredentials);
        }

        let session_id = self.store.create_session(username).await?;
        info!("User logged in: {}", username);
        Ok(session_id)
    }

    /// Resolve a session token to the username it authenticates
    pub async fn authorize(&self, session_token: &str) -> Result<String, AuthError> {
        if !self.policy.enforce_lifecycle {
            return match self.store.get_session_owner(session_token).await {
                Ok(username) => Ok(username),
                Err(StoreError::NotFound) => Err(AuthError::Unauthorized),
                Err(e) => Err(e.into()),
            };
        }

        let session = match self.store.get_session(session_token).await {
            Ok(session) => session,
            Err(StoreError::NotFound) => return Err(AuthError::Unauthorized),
            Err(e) => return Err(e.into()),
        };

        if !self.policy.is_active(&session, Utc::now()) {
            return Err(AuthError::Unauthorized);
        }

        Ok(session.username)
    }

    /// Invalidate a session on request
    pub async fn logout(&self, session_token: &str) -> Result<(), AuthError> {
        match self.store.invalidate_session(session_token).await {
            Ok(()) => Ok(()),
            Err(StoreError::NotFound) => Err(AuthError::Unauthorized),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewPaste, NewUser};
    use crate::store::MemoryStore;
    use crate::token::SESSION_ID_LEN;

    async fn authority(policy: SessionPolicy) -> (SessionAuthority<MemoryStore>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        store
            .create_user(&NewUser::new("alice", "a@x.com", "pw123"))
            .await
            .unwrap();
        (SessionAuthority::new(Arc::clone(&store), policy).unwrap(), store)
    }

    fn enforcing() -> SessionPolicy {
        SessionPolicy {
            enforce_lifecycle: true,
            ..SessionPolicy::default()
        }
    }

    #[tokio::test]
    async fn test_register_login_authorize_scenario() {
        let (authority, store) = authority(SessionPolicy::default()).await;

        let token = authority.login("alice", "pw123").await.unwrap();
        assert_eq!(token.len(), SESSION_ID_LEN);
        assert_eq!(authority.authorize(&token).await.unwrap(), "alice");

        let err = authority.login("alice", "wrongpw").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert_eq!(store.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_user_and_wrong_password_look_the_same() {
        let (authority, store) = authority(SessionPolicy::default()).await;

        let unknown = authority.login("mallory", "pw123").await.unwrap_err();
        let wrong = authority.login("alice", "nope").await.unwrap_err();

        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert_eq!(unknown.to_string(), wrong.to_string());
        assert_eq!(store.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_unknown_token_is_unauthorized() {
        let (authority, _) = authority(SessionPolicy::default()).await;

        assert!(matches!(
            authority.authorize("not-a-session").await,
            Err(AuthError::Unauthorized)
        ));
        assert!(matches!(
            authority.authorize("").await,
            Err(AuthError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_each_login_issues_a_new_session() {
        let (authority, _) = authority(SessionPolicy::default()).await;

        let first = authority.login("alice", "pw123").await.unwrap();
        let second = authority.login("alice", "pw123").await.unwrap();

        assert_ne!(first, second);
        assert_eq!(authority.authorize(&first).await.unwrap(), "alice");
        assert_eq!(authority.authorize(&second).await.unwrap(), "alice");
    }

    // Default policy: the stored flag and age are not consulted.
    #[tokio::test]
    async fn test_expired_session_still_authorizes_by_default() {
        let (authority, store) = authority(SessionPolicy::default()).await;
        let token = authority.login("alice", "pw123").await.unwrap();

        store.backdate_session(&token, TimeDelta::hours(48)).await;

        assert_eq!(authority.authorize(&token).await.unwrap(), "alice");
    }

    #[tokio::test]
    async fn test_logged_out_session_still_authorizes_by_default() {
        let (authority, _) = authority(SessionPolicy::default()).await;
        let token = authority.login("alice", "pw123").await.unwrap();

        authority.logout(&token).await.unwrap();

        assert_eq!(authority.authorize(&token).await.unwrap(), "alice");
    }

    #[tokio::test]
    async fn test_enforced_policy_rejects_expired_session() {
        let (authority, store) = authority(enforcing()).await;
        let token = authority.login("alice", "pw123").await.unwrap();
        assert_eq!(authority.authorize(&token).await.unwrap(), "alice");

        store.backdate_session(&token, TimeDelta::seconds(3601)).await;

        assert!(matches!(
            authority.authorize(&token).await,
            Err(AuthError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_enforced_policy_rejects_logged_out_session() {
        let (authority, _) = authority(enforcing()).await;
        let token = authority.login("alice", "pw123").await.unwrap();

        authority.logout(&token).await.unwrap();

        assert!(matches!(
            authority.authorize(&token).await,
            Err(AuthError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_logout_of_unknown_session_is_unauthorized() {
        let (authority, _) = authority(SessionPolicy::default()).await;

        assert!(matches!(
            authority.logout("missing").await,
            Err(AuthError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_authorized_user_owns_created_paste() {
        let (authority, store) = authority(SessionPolicy::default()).await;
        let token = authority.login("alice", "pw123").await.unwrap();

        let owner = authority.authorize(&token).await.unwrap();
        authority
            .store()
            .create_paste(&owner, &NewPaste::new("SELECT 1;", "sql"))
            .await
            .unwrap();

        let pastes = store.get_pastes_by_user("alice").await.unwrap();
        assert_eq!(pastes.len(), 1);
        assert_eq!(pastes[0].content, "SELECT 1;");
        assert_eq!(pastes[0].lang, "sql");
    }

    #[tokio::test]
    async fn test_unknown_user_is_checked_against_a_real_hash() {
        let (authority, _) = authority(SessionPolicy::default()).await;

        assert!(argon2::PasswordHash::new(&authority.dummy_hash).is_ok());
        assert!(!verify_password("pw123", &authority.dummy_hash));
    }

    #[test]
    fn test_policy_activity_window() {
        let policy = SessionPolicy {
            ttl: Duration::from_secs(60),
            enforce_lifecycle: true,
        };
        let created_at = Utc::now();
        let session = Session {
            session_id: "abc".to_string(),
            username: "alice".to_string(),
            created_at,
            valid: true,
        };

        assert!(policy.is_active(&session, created_at + TimeDelta::seconds(59)));
        assert!(!policy.is_active(&session, created_at + TimeDelta::seconds(60)));

        let invalid = Session {
            valid: false,
            ..session
        };
        assert!(!policy.is_active(&invalid, created_at));
    }

    #[test]
    fn test_policy_with_unbounded_ttl_only_checks_validity() {
        let policy = SessionPolicy {
            ttl: Duration::MAX,
            enforce_lifecycle: true,
        };
        let session = Session {
            session_id: "abc".to_string(),
            username: "alice".to_string(),
            created_at: Utc::now() - TimeDelta::days(3650),
            valid: true,
        };

        assert!(policy.is_active(&session, Utc::now()));
    }
}
