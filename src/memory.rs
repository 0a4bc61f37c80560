use crate::store::{LinkStore, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |deadline| now < deadline)
    }
}

/// In-process stand-in for the key-value store.
///
/// Expiry follows tokio's clock, so paused-time tests can jump past a TTL.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_live_entries<T>(
        &self,
        action: impl FnOnce(&mut HashMap<String, Entry>) -> T,
    ) -> T {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap();
        entries.retain(|_, entry| entry.is_live(now));
        action(&mut entries)
    }
}

#[async_trait]
impl LinkStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.with_live_entries(|entries| {
            entries.get(key).map(|entry| entry.value.clone())
        }))
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        Ok(self.with_live_entries(|entries| {
            if entries.contains_key(key) {
                return false;
            }
            entries.insert(
                key.to_string(),
                Entry {
                    value: value.to_string(),
                    expires_at: Some(Instant::now() + ttl),
                },
            );
            true
        }))
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.with_live_entries(|entries| entries.contains_key(key)))
    }

    async fn increment(&self, key: &str) -> Result<i64, StoreError> {
        self.with_live_entries(|entries| {
            let entry = entries.entry(key.to_string()).or_insert_with(|| Entry {
                value: "0".into(),
                expires_at: None,
            });
            let next = entry
                .value
                .parse::<i64>()
                .map_err(|_| StoreError::Backend("value is not an integer".into()))?
                + 1;
            entry.value = next.to_string();
            Ok(next)
        })
    }

    async fn set_expiry(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        self.with_live_entries(|entries| {
            if let Some(entry) = entries.get_mut(key) {
                entry.expires_at = Some(Instant::now() + ttl);
            }
        });
        Ok(())
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, StoreError> {
        let now = Instant::now();
        Ok(self.with_live_entries(|entries| {
            entries
                .get(key)
                .and_then(|entry| entry.expires_at)
                .map(|deadline| deadline - now)
        }))
    }

    async fn scan_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        Ok(self.with_live_entries(|entries| {
            entries
                .keys()
                .filter(|key| key.starts_with(prefix))
                .cloned()
                .collect()
        }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn entries_vanish_after_their_ttl() {
        let store = MemoryStore::new();
        assert!(store
            .set_if_absent("url:abc", "https://example.com", Duration::from_secs(10))
            .await
            .unwrap());
        assert!(!store
            .set_if_absent("url:abc", "https://other.com", Duration::from_secs(10))
            .await
            .unwrap());

        tokio::time::advance(Duration::from_secs(11)).await;

        assert_eq!(store.get("url:abc").await.unwrap(), None);
        assert!(store
            .set_if_absent("url:abc", "https://other.com", Duration::from_secs(10))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn increment_creates_counter_without_expiry() {
        let store = MemoryStore::new();
        assert_eq!(store.increment("hits:abc").await.unwrap(), 1);
        assert_eq!(store.increment("hits:abc").await.unwrap(), 2);
        assert_eq!(store.ttl("hits:abc").await.unwrap(), None);
    }
}
