use crate::error::ServiceError;
use crate::hits::HitCounter;
use crate::keygen::{is_alphanumeric, KeyGenerator, MAX_ID_LENGTH};
use crate::model::{LinkRow, LinkStats, ShortenedLink};
use crate::stats::StatsAggregator;
use crate::store::{url_key, LinkStore};
use crate::validator::{HostResolver, UrlValidator};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// Shorten, resolve, count and list links over one shared store.
#[derive(Clone)]
pub struct LinkService {
    store: Arc<dyn LinkStore>,
    validator: UrlValidator,
    keys: KeyGenerator,
    hits: HitCounter,
    stats: StatsAggregator,
}

impl LinkService {
    pub fn new(store: Arc<dyn LinkStore>, resolver: Arc<dyn HostResolver>) -> Self {
        Self {
            validator: UrlValidator::new(resolver),
            keys: KeyGenerator::new(store.clone()),
            hits: HitCounter::new(store.clone()),
            stats: StatsAggregator::new(store.clone()),
            store,
        }
    }

    /// Stores `raw_url` under a generated id, or under `alias` when one is given.
    pub async fn shorten(
        &self,
        raw_url: &str,
        alias: Option<&str>,
        service_host: &str,
    ) -> Result<ShortenedLink, ServiceError> {
        let original_url = self.validator.validate(raw_url, service_host).await?;
        let id = match alias.map(str::trim).filter(|alias| !alias.is_empty()) {
            Some(alias) => self.keys.reserve_alias(alias, &original_url).await?,
            None => self.keys.generate(&original_url).await?,
        };
        info!(id = %id, "Link created");
        Ok(ShortenedLink { id, original_url })
    }

    pub async fn resolve(&self, short_id: &str) -> Result<String, ServiceError> {
        if short_id.len() > MAX_ID_LENGTH || !is_alphanumeric(short_id) {
            return Err(ServiceError::NotFound);
        }
        self.store
            .get(&url_key(short_id))
            .await?
            .ok_or(ServiceError::NotFound)
    }

    pub fn record_hit(&self, short_id: &str) -> JoinHandle<()> {
        self.hits.record(short_id)
    }

    pub async fn list_all(&self) -> Result<Vec<LinkRow>, ServiceError> {
        self.stats.list_all().await
    }

    pub async fn link_stats(&self, short_id: &str) -> Result<LinkStats, ServiceError> {
        if short_id.len() > MAX_ID_LENGTH || !is_alphanumeric(short_id) {
            return Err(ServiceError::NotFound);
        }
        self.stats.link_stats(short_id).await
    }

    pub async fn ping(&self) -> Result<(), ServiceError> {
        Ok(self.store.ping().await?)
    }
}
