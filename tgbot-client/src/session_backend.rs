//! The session persistence contract (§4.8, §1 "only the `Store` contract
//! matters").
//!
//! Concrete backends — file, SQL, BoltDB, Redis — are external collaborators
//! per spec.md §1; this module only defines the trait every backend
//! implements plus the in-memory one the framework ships for tests and
//! small bots.

use async_trait::async_trait;

use crate::errors::StoreError;

/// Where session blobs are persisted, keyed by the string a [`crate::session::KeyFn`]
/// derives from an update (default: stringified chat id).
#[async_trait]
pub trait Store: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;
    async fn del(&self, key: &str) -> Result<(), StoreError>;
}

/// An in-memory [`Store`], guarded by a mutex over its map (§5 "the
/// in-memory session store protects its map with a mutex"). Sessions are
/// lost on process restart — fine for tests and throwaway bots, not for
/// anything that needs to survive a redeploy.
#[derive(Default)]
pub struct InMemoryStore(std::sync::Mutex<std::collections::HashMap<String, Vec<u8>>>);

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.0.lock().expect("session store mutex poisoned").get(key).cloned())
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.0.lock().expect("session store mutex poisoned").insert(key.to_string(), value);
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), StoreError> {
        self.0.lock().expect("session store mutex poisoned").remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_through_get_set_del() {
        let store = InMemoryStore::new();
        assert_eq!(store.get("k").await.unwrap(), None);
        store.set("k", b"value".to_vec()).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(b"value".to_vec()));
        store.del("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }
}
