use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Lifetime class of a stored entry.
///
/// `Durable` entries live until explicitly removed. `Session` entries only
/// belong to the current browsing session and are dropped with
/// [`KeyValueStore::clear_scope`] when a new one starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Durable,
    Session,
}

impl Scope {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Durable => "durable",
            Scope::Session => "session",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// String-keyed store of string values, split into two scopes.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get(&self, scope: Scope, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be written.
    async fn set(&self, scope: Scope, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn remove(&self, scope: Scope, key: &str) -> Result<(), StorageError>;

    /// Remove every entry of `scope`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn clear_scope(&self, scope: Scope) -> Result<(), StorageError>;
}

/// Simple in-memory store for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<Mutex<HashMap<(Scope, String), String>>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently held in `scope`.
    #[must_use]
    pub fn len(&self, scope: Scope) -> usize {
        self.entries
            .lock()
            .map(|guard| guard.keys().filter(|(s, _)| *s == scope).count())
            .unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self, scope: Scope) -> bool {
        self.len(scope) == 0
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, scope: Scope, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&(scope, key.to_owned())).cloned())
    }

    async fn set(&self, scope: Scope, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert((scope, key.to_owned()), value.to_owned());
        Ok(())
    }

    async fn remove(&self, scope: Scope, key: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(&(scope, key.to_owned()));
        Ok(())
    }

    async fn clear_scope(&self, scope: Scope) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.retain(|(s, _), _| *s != scope);
        Ok(())
    }
}

/// Key-value backend behind a trait object for easy swapping.
#[derive(Clone)]
pub struct Storage {
    pub kv: Arc<dyn KeyValueStore>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            kv: Arc::new(InMemoryStore::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scopes_do_not_collide() {
        let store = InMemoryStore::new();
        store.set(Scope::Durable, "k", "durable").await.unwrap();
        store.set(Scope::Session, "k", "session").await.unwrap();

        assert_eq!(
            store.get(Scope::Durable, "k").await.unwrap().as_deref(),
            Some("durable")
        );
        assert_eq!(
            store.get(Scope::Session, "k").await.unwrap().as_deref(),
            Some("session")
        );
    }

    #[tokio::test]
    async fn set_overwrites_and_remove_is_idempotent() {
        let store = InMemoryStore::new();
        store.set(Scope::Durable, "k", "1").await.unwrap();
        store.set(Scope::Durable, "k", "2").await.unwrap();
        assert_eq!(store.get(Scope::Durable, "k").await.unwrap().as_deref(), Some("2"));

        store.remove(Scope::Durable, "k").await.unwrap();
        store.remove(Scope::Durable, "k").await.unwrap();
        assert_eq!(store.get(Scope::Durable, "k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn clear_scope_leaves_other_scope_alone() {
        let store = InMemoryStore::new();
        store.set(Scope::Durable, "a", "1").await.unwrap();
        store.set(Scope::Session, "b", "2").await.unwrap();
        store.set(Scope::Session, "c", "3").await.unwrap();

        store.clear_scope(Scope::Session).await.unwrap();
        assert!(store.is_empty(Scope::Session));
        assert_eq!(store.len(Scope::Durable), 1);
    }

    #[tokio::test]
    async fn storage_handle_shares_backend() {
        let storage = Storage::in_memory();
        let clone = storage.clone();
        storage.kv.set(Scope::Durable, "k", "v").await.unwrap();
        assert_eq!(
            clone.kv.get(Scope::Durable, "k").await.unwrap().as_deref(),
            Some("v")
        );
    }
}
