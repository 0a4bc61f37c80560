use crate::error::ServiceError;
use crate::model::{LinkRow, LinkStats};
use crate::store::{hits_key, url_key, LinkStore, URL_KEY_PREFIX};
use chrono::{DateTime, FixedOffset, Utc};
use futures_util::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const LOOKUP_CONCURRENCY: usize = 16;
const ROW_TIMEOUT: Duration = Duration::from_secs(2);
const REPORT_UTC_OFFSET_SECS: i32 = 8 * 60 * 60;
const EXPIRY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const NEVER_EXPIRES: &str = "Never";

/// Joins URL, hit count and expiry for every live link.
#[derive(Clone)]
pub struct StatsAggregator {
    store: Arc<dyn LinkStore>,
}

impl StatsAggregator {
    pub fn new(store: Arc<dyn LinkStore>) -> Self {
        Self { store }
    }

    /// Only a failed key scan fails the listing; a row whose URL cannot be read is left out.
    pub async fn list_all(&self) -> Result<Vec<LinkRow>, ServiceError> {
        let keys = self.store.scan_keys(URL_KEY_PREFIX).await?;
        let now = Utc::now();
        let rows = stream::iter(keys)
            .map(|key| fetch_row_bounded(self.store.clone(), key, now))
            .buffer_unordered(LOOKUP_CONCURRENCY)
            .filter_map(|row| async move { row })
            .collect::<Vec<_>>()
            .await;
        Ok(rows)
    }

    pub async fn link_stats(&self, short_id: &str) -> Result<LinkStats, ServiceError> {
        if !self.store.exists(&url_key(short_id)).await? {
            return Err(ServiceError::NotFound);
        }
        Ok(LinkStats {
            id: short_id.to_string(),
            hits: read_hits(self.store.as_ref(), short_id).await,
        })
    }
}

/// A row that does not answer within its own budget is dropped like an unreadable one.
async fn fetch_row_bounded(
    store: Arc<dyn LinkStore>,
    key: String,
    now: DateTime<Utc>,
) -> Option<LinkRow> {
    match tokio::time::timeout(ROW_TIMEOUT, fetch_row(store, &key, now)).await {
        Ok(row) => row,
        Err(_) => {
            debug!(key = %key, "Skipping row, lookups timed out after {:?}", ROW_TIMEOUT);
            None
        }
    }
}

async fn fetch_row(
    store: Arc<dyn LinkStore>,
    key: &str,
    now: DateTime<Utc>,
) -> Option<LinkRow> {
    let id = key.strip_prefix(URL_KEY_PREFIX)?.to_string();
    let original_url = match store.get(key).await {
        Ok(Some(url)) => url,
        Ok(None) => return None,
        Err(err) => {
            debug!(id = %id, "Skipping row, reading URL failed: {}", err);
            return None;
        }
    };
    let hits = read_hits(store.as_ref(), &id).await;
    let remaining = store.ttl(key).await.unwrap_or_else(|err| {
        debug!(id = %id, "Reading expiry failed: {}", err);
        None
    });
    Some(LinkRow {
        id,
        original_url,
        hits,
        expires_at: format_expiry(remaining, now),
    })
}

/// Missing or unreadable counters count as zero.
async fn read_hits(store: &dyn LinkStore, short_id: &str) -> i64 {
    match store.get(&hits_key(short_id)).await {
        Ok(Some(value)) => value.parse().unwrap_or(0),
        Ok(None) => 0,
        Err(err) => {
            debug!(id = %short_id, "Reading hit count failed: {}", err);
            0
        }
    }
}

/// Absolute expiry in UTC+8, or "Never" without a TTL.
pub fn format_expiry(remaining: Option<Duration>, now: DateTime<Utc>) -> String {
    let Some(remaining) = remaining.and_then(|ttl| chrono::Duration::from_std(ttl).ok()) else {
        return NEVER_EXPIRES.to_string();
    };
    let Some(offset) = FixedOffset::east_opt(REPORT_UTC_OFFSET_SECS) else {
        return NEVER_EXPIRES.to_string();
    };
    (now + remaining)
        .with_timezone(&offset)
        .format(EXPIRY_FORMAT)
        .to_string()
}
