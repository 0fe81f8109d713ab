use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::api::model::response_cache::ResponseCache;
use crate::model::config::{Config, ProviderConnection};
use crate::processing::guide::{GuideCache, GuideRegistry};
use crate::resolver_error::{to_resolver_error, ResolverError, ResolverErrorKind};
use crate::utils::debug_if_enabled;
use crate::utils::network::epg::XmltvFeed;

const SECONDS_PER_HOUR: u64 = 3600;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub http_client: Arc<reqwest::Client>,
    pub guides: Arc<GuideRegistry>,
    pub response_cache: Arc<Option<ResponseCache>>,
}

impl AppState {
    pub fn new(config: Arc<Config>, http_client: Arc<reqwest::Client>) -> Self {
        let guide_max_age = Duration::from_secs(config.guide.cache_hours * SECONDS_PER_HOUR);
        let response_cache = if config.response_cache.enabled {
            Some(ResponseCache::new(Duration::from_secs(config.response_cache.ttl_secs)))
        } else {
            None
        };
        Self {
            config,
            http_client,
            guides: Arc::new(GuideRegistry::new(guide_max_age)),
            response_cache: Arc::new(response_cache),
        }
    }

    pub async fn get_guide(&self, provider: &ProviderConnection) -> (Arc<GuideCache>, XmltvFeed) {
        let cache = self.guides.get_cache(provider).await;
        (cache, XmltvFeed::new(Arc::clone(&self.http_client), provider))
    }

    /// Serves `key` from the response cache or runs `producer` and caches its successful result.
    pub async fn cached_json<T, F>(&self, key: String, producer: F) -> Result<Value, ResolverError>
    where
        T: Serialize,
        F: Future<Output=Result<T, ResolverError>>,
    {
        if let Some(cache) = self.response_cache.as_ref() {
            if let Some(value) = cache.get(&key).await {
                debug_if_enabled!("Response cache hit for {}", key);
                return Ok(value);
            }
        }
        let response = producer.await?;
        let value = serde_json::to_value(&response).map_err(|err| to_resolver_error(ResolverErrorKind::Info, err))?;
        if let Some(cache) = self.response_cache.as_ref() {
            cache.insert(key, value.clone()).await;
        }
        Ok(value)
    }
}
