use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use log::{debug, error, info, warn};
use tokio::sync::{Mutex, RwLock};

use crate::model::config::ProviderConnection;
use crate::model::xmltv::{Channel, ChannelGuide, ChannelGuideResult, ChannelRef, Programme, TVGuide};
use crate::processing::parser::xmltv::parse_tvguide;
use crate::resolver_error::{create_resolver_error_result, ResolverError, ResolverErrorKind};
use crate::utils::time_utils::guide_now;

pub const CHANNEL_NOT_FOUND: &str = "Channel not found";

/// Upstream delivering the raw broadcast grid document.
pub trait FeedSource {
    fn fetch_feed(&self) -> impl Future<Output=Result<String, ResolverError>> + Send;
}

/// Selects the running and the upcoming programme of one channel.
///
/// `programmes` must be sorted by start, `now` is a `YYYYMMDDHHMMSS +0000` timestamp.
/// All comparisons are lexical on the raw feed strings.
pub fn get_current_and_next<'a>(programmes: &'a [Programme], now: &str) -> (Option<&'a Programme>, Option<&'a Programme>) {
    for (idx, programme) in programmes.iter().enumerate() {
        if programme.start.as_str() <= now && programme.stop.as_str() > now {
            return (Some(programme), programmes.get(idx + 1));
        }
        if programme.start.as_str() > now {
            return (None, Some(programme));
        }
    }
    (None, None)
}

/// Immutable, fully indexed view of one parsed feed.
#[derive(Debug)]
pub struct GuideSnapshot {
    channels: Vec<Channel>,
    channel_index: HashMap<String, usize>,
    programmes: HashMap<String, Vec<Programme>>,
    fetched_at: Instant,
}

impl GuideSnapshot {
    pub fn new(guide: TVGuide) -> Self {
        let TVGuide { channels, programmes } = guide;
        let mut channel_index = HashMap::with_capacity(channels.len());
        for (idx, channel) in channels.iter().enumerate() {
            channel_index.entry(channel.id.clone()).or_insert(idx);
        }
        // feed order is already sorted by start, grouping keeps it
        let mut grouped: HashMap<String, Vec<Programme>> = HashMap::new();
        for programme in programmes {
            grouped.entry(programme.channel_id.clone()).or_default().push(programme);
        }
        Self {
            channels,
            channel_index,
            programmes: grouped,
            fetched_at: Instant::now(),
        }
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn programme_count(&self) -> usize {
        self.programmes.values().map(Vec::len).sum()
    }

    pub fn get_channel(&self, channel_id: &str) -> Option<&Channel> {
        self.channel_index.get(channel_id).map(|&idx| &self.channels[idx])
    }

    pub fn get_programmes(&self, channel_id: &str) -> &[Programme] {
        self.programmes.get(channel_id).map_or(&[], Vec::as_slice)
    }

    pub fn is_stale(&self, max_age: Duration) -> bool {
        self.fetched_at.elapsed() >= max_age
    }

    pub fn channel_guide(&self, channel_id: &str, now: &str) -> Option<ChannelGuide> {
        let channel = self.get_channel(channel_id)?;
        let (current, next) = get_current_and_next(self.get_programmes(channel_id), now);
        Some(ChannelGuide {
            channel: channel.clone(),
            current_program: current.map(Programme::with_gmt_times),
            next_program: next.map(Programme::with_gmt_times),
        })
    }

    /// Unknown ids are reported inline, repeated ids answered once.
    pub fn channel_guides(&self, channel_ids: &[String], now: &str) -> Vec<ChannelGuideResult> {
        let mut seen = HashSet::new();
        channel_ids.iter()
            .filter(|id| seen.insert(id.as_str()))
            .map(|id| self.channel_guide(id, now).map_or_else(
                || ChannelGuideResult::NotFound { channel_id: id.clone(), error: CHANNEL_NOT_FOUND.to_string() },
                ChannelGuideResult::Found))
            .collect()
    }

    /// Keyed by stream id, refs without guide id or with an unknown channel are left out.
    pub fn batch_guides(&self, refs: &[ChannelRef], now: &str) -> IndexMap<String, ChannelGuide> {
        let mut result = IndexMap::new();
        for channel_ref in refs {
            if let Some(guide) = channel_ref.get_epg_channel_id().and_then(|epg_id| self.channel_guide(epg_id, now)) {
                result.insert(channel_ref.stream_id.clone(), guide);
            }
        }
        result
    }
}

/// Read-through cache over one feed. Refreshes build a complete snapshot
/// before it replaces the published one, readers never observe partial state.
pub struct GuideCache {
    snapshot: RwLock<Option<Arc<GuideSnapshot>>>,
    max_age: Duration,
}

impl GuideCache {
    pub fn new(max_age: Duration) -> Self {
        Self {
            snapshot: RwLock::new(None),
            max_age,
        }
    }

    pub async fn current(&self) -> Option<Arc<GuideSnapshot>> {
        self.snapshot.read().await.clone()
    }

    async fn refresh<F: FeedSource>(&self, feed: &F) -> Result<Arc<GuideSnapshot>, ResolverError> {
        let content = feed.fetch_feed().await?;
        let guide = match tokio::task::spawn_blocking(move || parse_tvguide(content.as_bytes())).await {
            Ok(result) => result?,
            Err(err) => return create_resolver_error_result!(ResolverErrorKind::FeedParse, "guide parser task failed: {err}"),
        };
        let snapshot = Arc::new(GuideSnapshot::new(guide));
        *self.snapshot.write().await = Some(Arc::clone(&snapshot));
        info!("Guide refreshed with {} channels and {} programmes", snapshot.channels().len(), snapshot.programme_count());
        Ok(snapshot)
    }

    /// Returns a snapshot not older than `max_age`. A failed refresh keeps serving
    /// the previous snapshot and only errors when none was ever published.
    pub async fn ensure_fresh<F: FeedSource>(&self, feed: &F) -> Result<Arc<GuideSnapshot>, ResolverError> {
        let current = self.current().await;
        if let Some(snapshot) = current.as_ref() {
            if !snapshot.is_stale(self.max_age) {
                return Ok(Arc::clone(snapshot));
            }
            debug!("Guide snapshot is stale, refreshing");
        }
        match self.refresh(feed).await {
            Ok(snapshot) => Ok(snapshot),
            Err(err) => match current {
                Some(snapshot) => {
                    warn!("Guide refresh failed, serving previous snapshot: {err}");
                    Ok(snapshot)
                }
                None => {
                    error!("Guide refresh failed: {err}");
                    Err(err)
                }
            },
        }
    }

    pub async fn get_channel<F: FeedSource>(&self, feed: &F, channel_id: &str) -> Result<Option<ChannelGuide>, ResolverError> {
        let snapshot = self.ensure_fresh(feed).await?;
        Ok(snapshot.channel_guide(channel_id, &guide_now()))
    }

    pub async fn get_channels<F: FeedSource>(&self, feed: &F, channel_ids: &[String]) -> Result<Vec<ChannelGuideResult>, ResolverError> {
        let snapshot = self.ensure_fresh(feed).await?;
        Ok(snapshot.channel_guides(channel_ids, &guide_now()))
    }

    pub async fn list_channels<F: FeedSource>(&self, feed: &F) -> Result<Vec<Channel>, ResolverError> {
        let snapshot = self.ensure_fresh(feed).await?;
        Ok(snapshot.channels().to_vec())
    }

    pub async fn get_batch<F: FeedSource>(&self, feed: &F, refs: &[ChannelRef]) -> Result<IndexMap<String, ChannelGuide>, ResolverError> {
        let snapshot = self.ensure_fresh(feed).await?;
        Ok(snapshot.batch_guides(refs, &guide_now()))
    }
}

/// One guide cache per provider account. Accounts unused for longer than
/// `max_age` are dropped, their snapshot would be stale on the next request anyway.
pub struct GuideRegistry {
    caches: Mutex<HashMap<ProviderConnection, (Instant, Arc<GuideCache>)>>,
    max_age: Duration,
}

impl GuideRegistry {
    pub fn new(max_age: Duration) -> Self {
        Self {
            caches: Mutex::new(HashMap::new()),
            max_age,
        }
    }

    pub async fn get_cache(&self, provider: &ProviderConnection) -> Arc<GuideCache> {
        let mut caches = self.caches.lock().await;
        let max_age = self.max_age;
        let before = caches.len();
        caches.retain(|_, (last_used, _)| last_used.elapsed() < max_age);
        if caches.len() < before {
            debug!("Evicted {} unused guide caches", before - caches.len());
        }
        let (last_used, cache) = caches.entry(provider.clone())
            .or_insert_with(|| (Instant::now(), Arc::new(GuideCache::new(max_age))));
        *last_used = Instant::now();
        Arc::clone(cache)
    }
}
