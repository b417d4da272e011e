//! Console login session
//!
//! The logged-in principal is persisted under a single key so that separate
//! console invocations share one session. Views other than login require an
//! authenticated session.

pub mod auth;
pub mod store;

use roster_common::models::{LoginCredentials, Principal};
use roster_common::validation::Validate;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{AdminError, AdminResult};

pub use auth::{Authenticator, ConfiguredAuthenticator, INVALID_CREDENTIALS};
pub use store::{FileStore, KeyValueStore, MemoryStore, STORE_FILE};

/// Store key holding the serialized principal
pub const SESSION_KEY: &str = "user";

/// Screens of the console
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Login,
    Home,
    Contacts,
    Documents,
}

impl View {
    pub fn is_protected(self) -> bool {
        !matches!(self, View::Login)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Redirect(View),
}

pub struct Session {
    store: Arc<dyn KeyValueStore>,
    authenticator: Arc<dyn Authenticator>,
    principal: Option<Principal>,
}

impl Session {
    /// Restore the persisted principal
    ///
    /// Never fails: a stored value that cannot be read or deserialized is
    /// discarded and the session starts unauthenticated.
    pub fn init(store: Arc<dyn KeyValueStore>, authenticator: Arc<dyn Authenticator>) -> Self {
        let principal = match store.get(SESSION_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Principal>(&raw) {
                Ok(principal) => Some(principal),
                Err(e) => {
                    warn!(error = %e, "Discarding unreadable stored session");
                    if let Err(e) = store.remove(SESSION_KEY) {
                        warn!(error = %e, "Failed to clear stored session");
                    }
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read stored session");
                None
            }
        };

        Self {
            store,
            authenticator,
            principal,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    pub async fn login(&mut self, credentials: &LoginCredentials) -> AdminResult<&Principal> {
        if let Err(errors) = credentials.validate() {
            let message = errors.first_message().unwrap_or(INVALID_CREDENTIALS);
            return Err(AdminError::Validation(message.to_string()));
        }

        let principal = match self.authenticator.authenticate(credentials).await {
            Ok(principal) => principal,
            Err(e) => {
                warn!(username = %credentials.username, "Login refused");
                self.principal = None;
                return Err(e);
            }
        };

        let raw = serde_json::to_string(&principal).map_err(roster_common::Error::from)?;
        self.store.set(SESSION_KEY, &raw)?;
        info!(username = %principal.username, "Logged in");
        Ok(&*self.principal.insert(principal))
    }

    /// Forget the principal, then clear the persisted copy
    ///
    /// The in-memory session is cleared even when the store cannot be
    /// written; that store error is still returned.
    pub fn logout(&mut self) -> AdminResult<()> {
        if let Some(principal) = self.principal.take() {
            info!(username = %principal.username, "Logged out");
        }
        self.store.remove(SESSION_KEY)
    }

    pub fn access(&self, view: View) -> Access {
        match (view, self.is_authenticated()) {
            (View::Login, true) => Access::Redirect(View::Home),
            (view, false) if view.is_protected() => Access::Redirect(View::Login),
            _ => Access::Allow,
        }
    }

    /// Fail with [`AdminError::NotAuthenticated`] unless `view` is allowed
    pub fn require(&self, view: View) -> AdminResult<()> {
        match self.access(view) {
            Access::Redirect(View::Login) => Err(AdminError::NotAuthenticated),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    /// Reads from memory, refuses every write
    struct ReadOnlyStore(MemoryStore);

    impl ReadOnlyStore {
        fn denied() -> AdminError {
            roster_common::Error::Io(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
                .into()
        }
    }

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, key: &str) -> AdminResult<Option<String>> {
            self.0.get(key)
        }

        fn set(&self, _key: &str, _value: &str) -> AdminResult<()> {
            Err(Self::denied())
        }

        fn remove(&self, _key: &str) -> AdminResult<()> {
            Err(Self::denied())
        }
    }

    /// Every read fails
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> AdminResult<Option<String>> {
            Err(ReadOnlyStore::denied())
        }

        fn set(&self, _key: &str, _value: &str) -> AdminResult<()> {
            Err(ReadOnlyStore::denied())
        }

        fn remove(&self, _key: &str) -> AdminResult<()> {
            Err(ReadOnlyStore::denied())
        }
    }

    fn no_login() -> Arc<dyn Authenticator> {
        Arc::new(ConfiguredAuthenticator::new(None))
    }

    fn session_with(store: MemoryStore) -> Session {
        let auth = ConfiguredAuthenticator::new(Some(LoginCredentials::new("admin", "pw")));
        Session::init(Arc::new(store), Arc::new(auth))
    }

    #[test]
    fn test_restores_stored_principal() {
        let session = session_with(MemoryStore::with_value(SESSION_KEY, r#"{"username":"ops"}"#));
        assert!(session.is_authenticated());
        assert_eq!(session.principal().unwrap().username, "ops");
    }

    #[test]
    fn test_unparseable_principal_is_discarded() {
        let store = Arc::new(MemoryStore::with_value(SESSION_KEY, "not-json"));
        let auth = Arc::new(ConfiguredAuthenticator::new(None));
        let session = Session::init(store.clone(), auth);

        assert!(!session.is_authenticated());
        assert_eq!(store.get(SESSION_KEY).unwrap(), None);
    }

    #[test]
    fn test_access_rules() {
        let session = session_with(MemoryStore::new());
        assert_eq!(session.access(View::Contacts), Access::Redirect(View::Login));
        assert_eq!(session.access(View::Home), Access::Redirect(View::Login));
        assert_eq!(session.access(View::Login), Access::Allow);
        assert!(matches!(
            session.require(View::Documents),
            Err(AdminError::NotAuthenticated)
        ));

        let session = session_with(MemoryStore::with_value(SESSION_KEY, r#"{"username":"a"}"#));
        assert_eq!(session.access(View::Documents), Access::Allow);
        assert_eq!(session.access(View::Login), Access::Redirect(View::Home));
        assert!(session.require(View::Contacts).is_ok());
    }

    #[tokio::test]
    async fn test_blank_fields_rejected_locally() {
        let mut session = session_with(MemoryStore::new());
        let err = session
            .login(&LoginCredentials::new("", "pw"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Username is required");

        let err = session
            .login(&LoginCredentials::new("admin", ""))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Password is required");
    }

    #[test]
    fn test_corrupt_principal_in_read_only_store_starts_logged_out() {
        let store = ReadOnlyStore(MemoryStore::with_value(SESSION_KEY, "not-json"));
        let session = Session::init(Arc::new(store), no_login());
        assert!(!session.is_authenticated());
        assert_eq!(session.access(View::Contacts), Access::Redirect(View::Login));
    }

    #[test]
    fn test_unreadable_store_starts_logged_out() {
        let session = Session::init(Arc::new(BrokenStore), no_login());
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_logout_clears_memory_when_store_refuses() {
        let store = ReadOnlyStore(MemoryStore::with_value(SESSION_KEY, r#"{"username":"ops"}"#));
        let mut session = Session::init(Arc::new(store), no_login());
        assert!(session.is_authenticated());

        let err = session.logout().unwrap_err();
        assert!(err.to_string().contains("read-only"));
        assert!(!session.is_authenticated());
        assert!(matches!(
            session.require(View::Contacts),
            Err(AdminError::NotAuthenticated)
        ));
    }
}
