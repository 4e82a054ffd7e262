//! Authentication session: login, registration, logout and rehydration.

use std::sync::Arc;

use crate::api::ApiClient;
use crate::errors::{ApiError, StorageError, StoreError};
use crate::models::{AuthResponse, Credentials, Registration, Session, UserSummary};
use crate::storage::{SessionStorage, TOKEN_KEY, USER_KEY};
use crate::store::Store;

const LOGIN_FAILED: &str = "Login failed";
const REGISTRATION_FAILED: &str = "Registration failed";

/// Owns the authentication token and current user.
#[derive(Clone)]
pub struct SessionStore {
    store: Store,
    api: Arc<dyn ApiClient>,
    storage: Arc<dyn SessionStorage>,
    logout_on_unauthorized: bool,
}

impl SessionStore {
    pub fn new(store: Store, api: Arc<dyn ApiClient>, storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            store,
            api,
            storage,
            logout_on_unauthorized: false,
        }
    }

    /// Clear the session when an authenticated call is answered with 401.
    pub fn with_logout_on_unauthorized(mut self, enabled: bool) -> Self {
        self.logout_on_unauthorized = enabled;
        self
    }

    /// Read the persisted session once at startup.
    ///
    /// Missing slots, a token without a user (or the reverse) and an unparsable user
    /// all yield the empty session.
    pub fn rehydrate(storage: &dyn SessionStorage) -> Session {
        let token = match storage.get(TOKEN_KEY) {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!("Failed to read persisted token: {}", e);
                None
            }
        };
        let user = match storage.get(USER_KEY) {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!("Failed to read persisted user: {}", e);
                None
            }
        };

        match (token, user) {
            (Some(token), Some(raw_user)) => match serde_json::from_str::<UserSummary>(&raw_user) {
                Ok(user) => {
                    tracing::info!("Rehydrated session for user {}", user.username);
                    Session::new(token, user)
                }
                Err(e) => {
                    tracing::warn!("Discarding corrupt persisted user: {}", e);
                    Session::default()
                }
            },
            (None, None) => Session::default(),
            _ => {
                tracing::warn!("Discarding half-persisted session");
                Session::default()
            }
        }
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<Session, StoreError> {
        let response = self.api.login(credentials).await.map_err(|e| {
            tracing::error!("Login failed for {}: {}", credentials.username, e);
            StoreError::Auth {
                reason: e.reason_or(LOGIN_FAILED),
            }
        })?;
        Ok(self.install(response))
    }

    pub async fn register(&self, registration: &Registration) -> Result<Session, StoreError> {
        let response = self.api.register(registration).await.map_err(|e| {
            tracing::error!("Registration failed for {}: {}", registration.username, e);
            StoreError::Auth {
                reason: e.reason_or(REGISTRATION_FAILED),
            }
        })?;
        Ok(self.install(response))
    }

    /// Clear the session and every piece of derived state. Never touches the network.
    pub fn logout(&self) {
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.storage.remove(key) {
                tracing::warn!("Failed to remove persisted {}: {}", key, e);
            }
        }
        self.store.reset();
        tracing::info!("Logged out");
    }

    pub fn current(&self) -> Session {
        self.store.session()
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.view(|s| s.session.is_authenticated())
    }

    pub fn is_admin(&self) -> bool {
        self.store.view(|s| s.session.is_admin())
    }

    pub fn current_user_id(&self) -> Option<i64> {
        self.store.view(|s| s.session.user().map(|u| u.id))
    }

    /// React to a transport rejection seen by any component.
    pub(crate) fn note_rejection(&self, err: &ApiError) {
        if self.logout_on_unauthorized && err.is_unauthorized() && self.is_authenticated() {
            tracing::warn!("API rejected the session token; logging out");
            self.logout();
        }
    }

    fn install(&self, response: AuthResponse) -> Session {
        let AuthResponse { token, user } = response;
        self.persist(&token, &user);

        tracing::info!("Session established for user {}", user.username);
        let session = Session::new(token, user);
        self.store.install_session(session.clone());
        session
    }

    fn persist(&self, token: &str, user: &UserSummary) {
        if let Err(e) = self.write_slots(token, user) {
            tracing::warn!("Failed to persist session: {}", e);
        }
    }

    fn write_slots(&self, token: &str, user: &UserSummary) -> Result<(), StorageError> {
        let raw_user = serde_json::to_string(user)?;
        self.storage.set(TOKEN_KEY, token)?;
        self.storage.set(USER_KEY, &raw_user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{MockApi, PASSWORD};
    use crate::storage::MemoryStorage;

    fn fixture() -> (SessionStore, Store, Arc<MemoryStorage>, Arc<MockApi>) {
        let store = Store::default();
        let storage = Arc::new(MemoryStorage::new());
        let api = Arc::new(MockApi::new());
        let session = SessionStore::new(store.clone(), api.clone(), storage.clone());
        (session, store, storage, api)
    }

    #[tokio::test]
    async fn test_login_installs_token_and_user_together() {
        let (session, store, storage, _) = fixture();

        let installed = session
            .login(&Credentials::new("admin", PASSWORD))
            .await
            .unwrap();

        assert_eq!(installed.token(), Some("token-admin"));
        assert_eq!(store.session(), installed);
        assert!(session.is_authenticated());
        assert!(session.is_admin());
        assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some("token-admin"));
        assert!(storage.get(USER_KEY).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_failed_login_keeps_prior_session() {
        let (session, store, _, _) = fixture();
        session
            .login(&Credentials::new("ann", PASSWORD))
            .await
            .unwrap();
        let before = store.session();

        let err = session
            .login(&Credentials::new("admin", "wrong"))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            StoreError::Auth {
                reason: "Bad credentials".to_string()
            }
        );
        assert_eq!(store.session(), before);
    }

    #[tokio::test]
    async fn test_login_without_server_message_uses_default_reason() {
        let (session, store, _, api) = fixture();
        api.fail("login", ApiError::with_status(503));

        let err = session
            .login(&Credentials::new("ann", PASSWORD))
            .await
            .unwrap_err();

        assert_eq!(err.message(), "Login failed");
        assert!(!store.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_register_installs_token_and_user_together() {
        let (session, store, storage, api) = fixture();

        let installed = session
            .register(&Registration {
                username: "newcomer".to_string(),
                email: "new@example.com".to_string(),
                password: PASSWORD.to_string(),
            })
            .await
            .unwrap();

        assert_eq!(api.calls_to("register"), vec!["register:newcomer"]);
        assert_eq!(installed.token(), Some("token-newcomer"));
        assert_eq!(installed.user().map(|u| u.username.as_str()), Some("newcomer"));
        assert_eq!(store.session(), installed);
        assert!(session.is_authenticated());
        assert!(!session.is_admin());

        assert_eq!(
            storage.get(TOKEN_KEY).unwrap().as_deref(),
            Some("token-newcomer")
        );
        let persisted: UserSummary =
            serde_json::from_str(&storage.get(USER_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(Some(&persisted), installed.user());
    }

    #[tokio::test]
    async fn test_register_failure_reason() {
        let (session, _, _, _) = fixture();
        let err = session
            .register(&Registration {
                username: "taken".to_string(),
                email: "t@example.com".to_string(),
                password: PASSWORD.to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Username already exists");

        let (session, _, _, api) = fixture();
        api.fail("register", ApiError::network("connection refused"));
        let err = session
            .register(&Registration {
                username: "new".to_string(),
                email: "n@example.com".to_string(),
                password: PASSWORD.to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.message(), "connection refused");
    }

    #[tokio::test]
    async fn test_logout_clears_storage() {
        let (session, store, storage, _) = fixture();
        session
            .login(&Credentials::new("ann", PASSWORD))
            .await
            .unwrap();

        session.logout();

        assert_eq!(store.session(), Session::default());
        assert!(storage.get(TOKEN_KEY).unwrap().is_none());
        assert!(storage.get(USER_KEY).unwrap().is_none());
    }

    #[test]
    fn test_rehydrate_round_trip() {
        let storage = MemoryStorage::new();
        storage.set(TOKEN_KEY, "jwt").unwrap();
        storage
            .set(USER_KEY, r#"{"id": 2, "username": "bo", "roles": ["ADMIN"]}"#)
            .unwrap();

        let session = SessionStore::rehydrate(&storage);
        assert_eq!(session.token(), Some("jwt"));
        assert!(session.is_admin());
    }

    #[test]
    fn test_rehydrate_corrupt_user_yields_empty_session() {
        let storage = MemoryStorage::new();
        storage.set(TOKEN_KEY, "jwt").unwrap();
        storage.set(USER_KEY, "{oops").unwrap();
        assert_eq!(SessionStore::rehydrate(&storage), Session::default());
    }

    #[test]
    fn test_rehydrate_token_without_user_yields_empty_session() {
        let storage = MemoryStorage::new();
        storage.set(TOKEN_KEY, "jwt").unwrap();
        assert_eq!(SessionStore::rehydrate(&storage), Session::default());
    }

    #[tokio::test]
    async fn test_unauthorized_rejection_logs_out_when_enabled() {
        let (session, store, _, _) = fixture();
        let session = session.with_logout_on_unauthorized(true);
        session
            .login(&Credentials::new("ann", PASSWORD))
            .await
            .unwrap();

        session.note_rejection(&ApiError::with_status(403));
        assert!(store.session().is_authenticated());

        session.note_rejection(&ApiError::with_status(401));
        assert!(!store.session().is_authenticated());
    }
}
