use std::sync::Arc;

use tracing::{debug, error};

use crate::storage::{KeyValueStore, StorageError};

pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// The persisted slot holding the current session token.
///
/// At most one token lives at a time; it stays valid until overwritten or
/// cleared. Failures are logged here and still returned to the caller.
#[derive(Debug, Clone)]
pub struct TokenStore {
    store: Arc<dyn KeyValueStore>,
}

impl TokenStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Persist `token`, replacing any previous one.
    ///
    /// # Errors
    /// Returns the underlying [`StorageError`] after logging it.
    pub async fn set_token(&self, token: &str) -> Result<(), StorageError> {
        self.store
            .set_item(ACCESS_TOKEN_KEY, token)
            .await
            .inspect(|_| debug!("access token stored"))
            .inspect_err(|err| error!(error = %err, "error storing access token"))
    }

    /// The current token; `Ok(None)` when none was ever set.
    ///
    /// # Errors
    /// Returns the underlying [`StorageError`] after logging it.
    pub async fn get_token(&self) -> Result<Option<String>, StorageError> {
        self.store
            .get_item(ACCESS_TOKEN_KEY)
            .await
            .map(|token| token.filter(|value| !value.is_empty()))
            .inspect_err(|err| error!(error = %err, "error retrieving access token"))
    }

    /// Remove the token; succeeds when there was none.
    ///
    /// # Errors
    /// Returns the underlying [`StorageError`] after logging it.
    pub async fn clear_token(&self) -> Result<(), StorageError> {
        self.store
            .remove_item(ACCESS_TOKEN_KEY)
            .await
            .inspect(|_| debug!("access token removed"))
            .inspect_err(|err| error!(error = %err, "error removing access token"))
    }
}
