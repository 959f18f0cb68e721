use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::error::{Error, Result};
use super::storage::KeyValueStore;

const SESSION_KEY: &str = "user";

/// The signed-in identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub email: String,
    pub login_time: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    /// Sign in and persist the session.
    ///
    /// Any non-empty password is accepted. There is no credential check
    /// behind this; it only gates which record collection is active.
    pub fn create_session(&self, email: &str, password: &str) -> Result<Session> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(Error::Validation(
                "Please enter both email and password".to_string(),
            ));
        }

        let session = Session {
            email: email.to_string(),
            login_time: Utc::now(),
        };
        let json = serde_json::to_string(&session)?;
        self.storage.set(SESSION_KEY, &json)?;

        info!(email = %session.email, "session created");
        Ok(session)
    }

    /// Restore the persisted session, if any
    pub fn get_session(&self) -> Option<Session> {
        let raw = match self.storage.get(SESSION_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "could not read stored session");
                return None;
            }
        };

        match serde_json::from_str::<Session>(&raw) {
            Ok(session) if !session.email.is_empty() => Some(session),
            Ok(_) => {
                warn!("stored session has an empty email, ignoring it");
                None
            }
            Err(e) => {
                warn!(error = %e, "stored session is malformed, ignoring it");
                None
            }
        }
    }

    pub fn destroy_session(&self) -> Result<()> {
        self.storage.remove(SESSION_KEY)?;
        info!("session destroyed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::storage::MemoryStorage;

    fn create_test_store() -> (Arc<MemoryStorage>, SessionStore) {
        let storage = Arc::new(MemoryStorage::new());
        let store = SessionStore::new(storage.clone());
        (storage, store)
    }

    #[test]
    fn test_create_and_get_session() {
        let (_, store) = create_test_store();
        assert!(store.get_session().is_none());

        let session = store.create_session("a@x.com", "secret").unwrap();
        assert_eq!(session.email, "a@x.com");
        assert_eq!(store.get_session(), Some(session));
    }

    #[test]
    fn test_create_session_requires_credentials() {
        let (_, store) = create_test_store();

        assert!(matches!(
            store.create_session("", "secret"),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            store.create_session("   ", "secret"),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            store.create_session("a@x.com", ""),
            Err(Error::Validation(_))
        ));
        assert!(store.get_session().is_none());
    }

    #[test]
    fn test_any_password_is_accepted() {
        let (_, store) = create_test_store();
        assert!(store.create_session("a@x.com", "x").is_ok());
    }

    #[test]
    fn test_destroy_session_is_idempotent() {
        let (_, store) = create_test_store();
        store.create_session("a@x.com", "secret").unwrap();

        store.destroy_session().unwrap();
        store.destroy_session().unwrap();
        assert!(store.get_session().is_none());
    }

    #[test]
    fn test_session_wire_format() {
        let (storage, store) = create_test_store();
        store.create_session("a@x.com", "secret").unwrap();

        let raw = storage.get("user").unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["email"], "a@x.com");
        assert!(value["loginTime"].is_string());
    }

    #[test]
    fn test_malformed_session_is_absent() {
        let (storage, store) = create_test_store();
        storage.set("user", "{not json").unwrap();
        assert!(store.get_session().is_none());
    }
}
