//! Authenticated identity plus bearer credential, mirrored into durable storage.

use std::fmt;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::model::User;
use crate::storage::{LocalStore, TOKEN_KEY, USER_KEY};

/// Opaque signed credential issued at login. The value never shows up in debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

impl From<String> for BearerToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Identity and credential borrowed together for an authenticated call.
#[derive(Debug, Clone, Copy)]
pub struct Credentials<'a> {
    pub user: &'a User,
    pub token: &'a BearerToken,
}

#[derive(Debug)]
pub struct SessionState {
    store: LocalStore,
    user: Option<User>,
    token: Option<BearerToken>,
}

impl SessionState {
    /// Start without an identity and without reading storage.
    pub fn anonymous(store: LocalStore) -> Self {
        Self {
            store,
            user: None,
            token: None,
        }
    }

    /// Restore identity and credential from storage. Any missing or unreadable entry
    /// leaves the session unauthenticated.
    pub fn hydrate(store: LocalStore) -> Self {
        let mut session = Self::anonymous(store);
        match read_persisted(&session.store) {
            Ok(Some((token, user))) => {
                info!(username = user.username.as_str(), "session restored");
                session.token = Some(token);
                session.user = Some(user);
            }
            Ok(None) => {}
            Err(err) => warn!(error = %err, "could not restore session; starting signed out"),
        }
        session
    }

    pub fn login(&mut self, token: BearerToken, user: User) -> Result<()> {
        let encoded = serde_json::to_string(&user).context("Failed to encode user identity")?;
        self.store.set(TOKEN_KEY, token.as_str())?;
        if let Err(err) = self.store.set(USER_KEY, &encoded) {
            if let Err(cleanup) = self.store.remove(TOKEN_KEY) {
                warn!(error = %cleanup, "could not discard half-written session");
            }
            return Err(err);
        }
        info!(username = user.username.as_str(), "session started");
        self.token = Some(token);
        self.user = Some(user);
        Ok(())
    }

    pub fn logout(&mut self) -> Result<()> {
        if self.token.is_some() {
            info!("session ended");
        }
        self.token = None;
        self.user = None;
        self.store.remove(TOKEN_KEY)?;
        self.store.remove(USER_KEY)?;
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn token(&self) -> Option<&BearerToken> {
        self.token.as_ref()
    }

    pub fn credentials(&self) -> Option<Credentials<'_>> {
        match (&self.user, &self.token) {
            (Some(user), Some(token)) => Some(Credentials { user, token }),
            _ => None,
        }
    }
}

fn read_persisted(store: &LocalStore) -> Result<Option<(BearerToken, User)>> {
    let token = store.get(TOKEN_KEY)?.filter(|value| !value.is_empty());
    let user = store.get(USER_KEY)?;
    let (Some(token), Some(user)) = (token, user) else {
        return Ok(None);
    };
    let user: User = serde_json::from_str(&user).context("Stored user identity is malformed")?;
    Ok(Some((BearerToken::new(token), user)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UserId;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn store_in_temp_dir() -> (LocalStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalStore::at(temp_dir.path().join("storage.json"));
        (store, temp_dir)
    }

    fn alice() -> User {
        User {
            id: UserId(1),
            name: "Alice".into(),
            username: "alice".into(),
        }
    }

    #[test]
    fn login_persists_and_hydrates() {
        let (store, _guard) = store_in_temp_dir();
        let mut session = SessionState::hydrate(store.clone());
        assert!(!session.is_authenticated());

        session.login(BearerToken::new("signed"), alice()).unwrap();
        assert!(session.is_authenticated());

        let restored = SessionState::hydrate(store);
        assert!(restored.is_authenticated());
        assert_eq!(restored.user(), Some(&alice()));
        assert_eq!(restored.token().map(BearerToken::as_str), Some("signed"));
    }

    #[test]
    fn logout_clears_memory_and_storage() {
        let (store, _guard) = store_in_temp_dir();
        let mut session = SessionState::hydrate(store.clone());
        session.login(BearerToken::new("signed"), alice()).unwrap();
        session.logout().unwrap();

        assert!(!session.is_authenticated());
        assert!(session.credentials().is_none());
        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(store.get(USER_KEY).unwrap(), None);
    }

    #[test]
    fn token_without_user_is_unauthenticated() {
        let (store, _guard) = store_in_temp_dir();
        store.set(TOKEN_KEY, "orphan").unwrap();
        assert!(!SessionState::hydrate(store).is_authenticated());
    }

    #[test]
    fn malformed_user_is_unauthenticated() {
        let (store, _guard) = store_in_temp_dir();
        store.set(TOKEN_KEY, "signed").unwrap();
        store.set(USER_KEY, "{\"id\":").unwrap();
        let session = SessionState::hydrate(store);
        assert!(!session.is_authenticated());
        assert!(session.user().is_none());
    }

    #[test]
    fn failed_persist_leaves_session_signed_out() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("storage.json");
        std::fs::create_dir_all(&path).unwrap();
        let mut session = SessionState::hydrate(LocalStore::at(&path));

        assert!(session.login(BearerToken::new("signed"), alice()).is_err());
        assert!(!session.is_authenticated());
        assert!(session.user().is_none());
        assert!(session.credentials().is_none());
    }

    #[test]
    fn debug_output_hides_token() {
        let token = BearerToken::new("secret-value");
        assert_eq!(format!("{token:?}"), "BearerToken(***)");
    }
}
