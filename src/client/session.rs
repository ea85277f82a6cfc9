use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{
    api::{AuthApi, AuthPayload},
    storage::{SessionStorage, AUTH_TOKEN_KEY, USER_DATA_KEY},
    ClientError,
};
use crate::auth::{roles::role_grants, Permission, Role};

/// User as the client sees it; `role` stays a raw string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(default = "active")]
    pub is_active: bool,
}

fn active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Loading,
    Authenticated { user: SessionUser, token: String },
}

/// Current login, persisted through a [`SessionStorage`].
pub struct SessionContext<S, A> {
    storage: S,
    api: A,
    state: SessionState,
    last_error: Option<String>,
}

impl<S: SessionStorage, A: AuthApi> SessionContext<S, A> {
    pub fn new(storage: S, api: A) -> Self {
        Self {
            storage,
            api,
            state: SessionState::Unauthenticated,
            last_error: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn user(&self) -> Option<&SessionUser> {
        match &self.state {
            SessionState::Authenticated { user, .. } => Some(user),
            _ => None,
        }
    }

    pub fn token(&self) -> Option<&str> {
        match &self.state {
            SessionState::Authenticated { token, .. } => Some(token),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated { .. })
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, SessionState::Loading)
    }

    /// Message of the last failed login or signup.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Reloads a persisted session. Incomplete or unreadable data is wiped;
    /// the context never stays `Loading` once this returns.
    pub fn restore(&mut self) -> Result<&SessionState, ClientError> {
        self.state = SessionState::Loading;
        match self.read_stored() {
            Ok(Some((user, token))) => {
                debug!(user_id = user.id, "session restored");
                self.state = SessionState::Authenticated { user, token };
            }
            Ok(None) => {
                self.state = SessionState::Unauthenticated;
                self.clear_storage()?;
            }
            Err(ClientError::Serialization(e)) => {
                warn!(error = %e, "stored session is unreadable, clearing it");
                self.state = SessionState::Unauthenticated;
                self.clear_storage()?;
            }
            Err(e) => {
                self.state = SessionState::Unauthenticated;
                return Err(e);
            }
        }
        Ok(&self.state)
    }

    fn read_stored(&self) -> Result<Option<(SessionUser, String)>, ClientError> {
        let token = self.storage.get(AUTH_TOKEN_KEY)?;
        let data = self.storage.get(USER_DATA_KEY)?;
        match (token, data) {
            (Some(token), Some(data)) => Ok(Some((serde_json::from_str(&data)?, token))),
            _ => Ok(None),
        }
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<&SessionUser, ClientError> {
        self.state = SessionState::Loading;
        let result = self.api.login(email, password).await;
        self.finish(result)
    }

    pub async fn signup(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<&SessionUser, ClientError> {
        self.state = SessionState::Loading;
        let result = self.api.signup(name, email, password).await;
        self.finish(result)
    }

    fn finish(&mut self, result: Result<AuthPayload, ClientError>) -> Result<&SessionUser, ClientError> {
        let payload = match result {
            Ok(payload) => payload,
            Err(e) => {
                self.last_error = Some(e.to_string());
                self.state = SessionState::Unauthenticated;
                return Err(e);
            }
        };
        if let Err(e) = self.persist(&payload) {
            self.state = SessionState::Unauthenticated;
            // a half-written session must not survive into the next restore
            if let Err(clear) = self.clear_storage() {
                warn!(error = %clear, "could not clear partially persisted session");
            }
            return Err(e);
        }

        self.last_error = None;
        self.state = SessionState::Authenticated {
            user: payload.user,
            token: payload.token,
        };
        self.user()
            .ok_or_else(|| ClientError::Api("Session was not established".into()))
    }

    fn persist(&mut self, payload: &AuthPayload) -> Result<(), ClientError> {
        let data = serde_json::to_string(&payload.user)?;
        self.storage.set(AUTH_TOKEN_KEY, &payload.token)?;
        self.storage.set(USER_DATA_KEY, &data)
    }

    fn clear_storage(&mut self) -> Result<(), ClientError> {
        let token = self.storage.remove(AUTH_TOKEN_KEY);
        let data = self.storage.remove(USER_DATA_KEY);
        token.and(data)
    }

    /// Always ends unauthenticated, even when the storage fails.
    pub fn logout(&mut self) -> Result<(), ClientError> {
        self.state = SessionState::Unauthenticated;
        self.last_error = None;
        self.clear_storage()
    }

    /// Two-level role check: exact match, or the current user is an admin.
    pub fn has_access(&self, role: &str) -> bool {
        self.user().map_or(false, |u| role_grants(&u.role, role))
    }

    pub fn can(&self, permission: Permission) -> bool {
        self.user()
            .and_then(|u| u.role.parse::<Role>().ok())
            .map_or(false, |role| role.can(permission))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::client::storage::{FileStorage, MemoryStorage};

    /// Accepts one fixed password; signup always succeeds as employer.
    pub(crate) struct FakeApi {
        pub role: &'static str,
    }

    pub(crate) fn user(role: &str) -> SessionUser {
        SessionUser {
            id: 7,
            name: "Dana".into(),
            email: "dana@example.com".into(),
            role: role.into(),
            is_active: true,
        }
    }

    #[async_trait]
    impl AuthApi for FakeApi {
        async fn login(&self, _email: &str, password: &str) -> Result<AuthPayload, ClientError> {
            if password != "right" {
                return Err(ClientError::Api("Invalid credentials".into()));
            }
            Ok(AuthPayload {
                token: "tok".into(),
                refresh_token: None,
                user: user(self.role),
            })
        }

        async fn signup(
            &self,
            name: &str,
            email: &str,
            _password: &str,
        ) -> Result<AuthPayload, ClientError> {
            Ok(AuthPayload {
                token: "fresh".into(),
                refresh_token: Some("refresh".into()),
                user: SessionUser {
                    name: name.into(),
                    email: email.into(),
                    ..user("employer")
                },
            })
        }
    }

    fn context(role: &'static str) -> SessionContext<MemoryStorage, FakeApi> {
        SessionContext::new(MemoryStorage::new(), FakeApi { role })
    }

    #[tokio::test]
    async fn login_persists_and_logout_clears() {
        let mut ctx = context("pharmacist");
        let user = ctx.login("dana@example.com", "right").await.unwrap();
        assert_eq!(user.id, 7);
        assert!(ctx.is_authenticated());
        assert_eq!(ctx.storage().get(AUTH_TOKEN_KEY).unwrap().as_deref(), Some("tok"));
        assert!(ctx.storage().get(USER_DATA_KEY).unwrap().is_some());

        ctx.logout().unwrap();
        assert!(!ctx.is_authenticated());
        assert_eq!(ctx.storage().get(AUTH_TOKEN_KEY).unwrap(), None);
        assert_eq!(ctx.storage().get(USER_DATA_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn failed_login_surfaces_server_message() {
        let mut ctx = context("admin");
        let err = ctx.login("dana@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, ClientError::Api(_)));
        assert_eq!(ctx.last_error(), Some("Invalid credentials"));
        assert_eq!(ctx.state(), &SessionState::Unauthenticated);
        assert_eq!(ctx.storage().get(AUTH_TOKEN_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn signup_authenticates_as_employer() {
        let mut ctx = context("admin");
        ctx.signup("Lee", "lee@example.com", "whatever").await.unwrap();
        assert_eq!(ctx.token(), Some("fresh"));
        assert!(ctx.has_access("employer"));
        assert!(!ctx.has_access("admin"));
    }

    #[test]
    fn restore_reads_back_a_saved_session() {
        let mut storage = MemoryStorage::new();
        storage.set(AUTH_TOKEN_KEY, "saved").unwrap();
        storage
            .set(USER_DATA_KEY, &serde_json::to_string(&user("employer")).unwrap())
            .unwrap();

        let mut ctx = SessionContext::new(storage, FakeApi { role: "employer" });
        ctx.restore().unwrap();
        assert_eq!(ctx.token(), Some("saved"));
        assert_eq!(ctx.user().map(|u| u.id), Some(7));
    }

    #[test]
    fn restore_with_bad_user_data_clears_both_keys() {
        let mut storage = MemoryStorage::new();
        storage.set(AUTH_TOKEN_KEY, "saved").unwrap();
        storage.set(USER_DATA_KEY, "{not json").unwrap();

        let mut ctx = SessionContext::new(storage, FakeApi { role: "employer" });
        assert_eq!(ctx.restore().unwrap(), &SessionState::Unauthenticated);
        assert_eq!(ctx.storage().get(AUTH_TOKEN_KEY).unwrap(), None);
        assert_eq!(ctx.storage().get(USER_DATA_KEY).unwrap(), None);
    }

    #[test]
    fn restore_with_missing_token_clears_user_data() {
        let mut storage = MemoryStorage::new();
        storage
            .set(USER_DATA_KEY, &serde_json::to_string(&user("admin")).unwrap())
            .unwrap();

        let mut ctx = SessionContext::new(storage, FakeApi { role: "admin" });
        ctx.restore().unwrap();
        assert!(!ctx.is_authenticated());
        assert_eq!(ctx.storage().get(USER_DATA_KEY).unwrap(), None);
    }

    #[test]
    fn restore_from_corrupt_file_ends_unauthenticated_and_wipes_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{corrupt").unwrap();

        let mut ctx = SessionContext::new(FileStorage::new(&path), FakeApi { role: "admin" });
        assert_eq!(ctx.restore().unwrap(), &SessionState::Unauthenticated);
        assert!(!ctx.is_loading());
        assert_eq!(ctx.storage().get(AUTH_TOKEN_KEY).unwrap(), None);
        assert_eq!(ctx.storage().get(USER_DATA_KEY).unwrap(), None);
    }

    /// Accepts the token but refuses to store user data.
    #[derive(Default)]
    struct NoUserDataStorage {
        inner: MemoryStorage,
    }

    impl SessionStorage for NoUserDataStorage {
        fn get(&self, key: &str) -> Result<Option<String>, ClientError> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), ClientError> {
            if key == USER_DATA_KEY {
                return Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full").into());
            }
            self.inner.set(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<(), ClientError> {
            self.inner.remove(key)
        }
    }

    #[tokio::test]
    async fn failed_persist_leaves_no_token_behind() {
        let mut ctx = SessionContext::new(NoUserDataStorage::default(), FakeApi { role: "admin" });
        assert!(ctx.login("dana@example.com", "right").await.is_err());
        assert_eq!(ctx.state(), &SessionState::Unauthenticated);
        assert_eq!(ctx.storage().get(AUTH_TOKEN_KEY).unwrap(), None);

        ctx.restore().unwrap();
        assert!(!ctx.is_authenticated());
    }

    #[tokio::test]
    async fn has_access_is_two_level_and_case_insensitive() {
        let ctx = context("ADMIN");
        assert!(!ctx.has_access("admin"));

        let mut ctx = context("ADMIN");
        ctx.login("x", "right").await.unwrap();
        for role in ["admin", "employer", "pharmacist", "anything"] {
            assert!(ctx.has_access(role));
        }

        let mut ctx = context("Pharmacist");
        ctx.login("x", "right").await.unwrap();
        assert!(ctx.has_access("pharmacist"));
        assert!(ctx.has_access("PHARMACIST"));
        assert!(!ctx.has_access("employer"));
        assert!(!ctx.has_access("admin"));
    }

    #[tokio::test]
    async fn can_follows_role_permissions() {
        let mut ctx = context("pharmacist");
        assert!(!ctx.can(Permission::ViewInventory));
        ctx.login("x", "right").await.unwrap();
        assert!(ctx.can(Permission::ManageSupplies));
        assert!(!ctx.can(Permission::ManageInventory));
        assert!(!ctx.can(Permission::ManageUsers));
    }
}
