use crate::store::{hits_key, LinkStore, LINK_TTL};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub const RECORD_TIMEOUT: Duration = Duration::from_secs(2);

/// Counts redirects off the request path.
#[derive(Clone)]
pub struct HitCounter {
    store: Arc<dyn LinkStore>,
    timeout: Duration,
}

impl HitCounter {
    pub fn new(store: Arc<dyn LinkStore>) -> Self {
        Self {
            store,
            timeout: RECORD_TIMEOUT,
        }
    }

    /// Spawns the increment as its own task and returns immediately.
    ///
    /// The task is not tied to the caller: dropping the returned handle or the
    /// request future does not cancel it. It is bounded by its own timeout.
    pub fn record(&self, short_id: &str) -> JoinHandle<()> {
        let store = self.store.clone();
        let key = hits_key(short_id);
        let timeout = self.timeout;
        tokio::spawn(async move {
            if tokio::time::timeout(timeout, increment_and_refresh(store.as_ref(), &key))
                .await
                .is_err()
            {
                warn!(key = %key, "Recording hit timed out after {:?}", timeout);
            }
        })
    }
}

async fn increment_and_refresh(store: &dyn LinkStore, key: &str) {
    if let Err(err) = store.increment(key).await {
        warn!(key = %key, "Recording hit failed: {}", err);
        return;
    }
    if let Err(err) = store.set_expiry(key, LINK_TTL).await {
        debug!(key = %key, "Refreshing hit counter expiry failed: {}", err);
    }
}
