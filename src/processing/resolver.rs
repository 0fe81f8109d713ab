use std::future::Future;

use log::{error, info};

use crate::model::config::ProviderConnection;
use crate::model::metadata::MetaDetails;
use crate::model::xtream::{CatalogEntry, MediaType, ResolvedStream, SeriesInfo, XC_STREAM_TYPE_MOVIE};
use crate::processing::matcher::{match_content, MatchKind, MATCH_THRESHOLD};
use crate::processing::parser::content_id::{parse_content_id, ContentRequest};
use crate::resolver_error::{info_err, ResolverError};
use crate::utils::debug_if_enabled;
use crate::utils::network::xtream::{get_xtream_episode_url, get_xtream_stream_url};

/// Title lookup for a universal content id.
pub trait MetadataSource {
    fn lookup(&self, external_id: &str, media_type: MediaType) -> impl Future<Output=Result<MetaDetails, ResolverError>> + Send;
}

/// The provider's catalog listings.
pub trait CatalogSource {
    fn vod_streams(&self) -> impl Future<Output=Result<Vec<CatalogEntry>, ResolverError>> + Send;
    fn series(&self) -> impl Future<Output=Result<Vec<CatalogEntry>, ResolverError>> + Send;
    fn series_info(&self, series_id: u32) -> impl Future<Output=Result<SeriesInfo, ResolverError>> + Send;
}

pub fn build_movie_url(provider: &ProviderConnection, entry: &CatalogEntry) -> Option<String> {
    let stream_id = entry.stream_id?;
    let stream_type = entry.stream_type.as_deref().map(str::trim).filter(|st| !st.is_empty()).unwrap_or(XC_STREAM_TYPE_MOVIE);
    Some(get_xtream_stream_url(provider, stream_type, &stream_id.to_string(), entry.container_extension.as_deref()))
}

/// Maps universal content ids onto playable provider urls.
pub struct StreamResolver<M, C> {
    metadata: M,
    catalog: C,
    provider: ProviderConnection,
    match_threshold: f64,
}

impl<M: MetadataSource, C: CatalogSource> StreamResolver<M, C> {
    pub fn new(metadata: M, catalog: C, provider: ProviderConnection) -> Self {
        Self {
            metadata,
            catalog,
            provider,
            match_threshold: MATCH_THRESHOLD,
        }
    }

    #[must_use]
    pub fn with_match_threshold(mut self, threshold: f64) -> Self {
        self.match_threshold = threshold;
        self
    }

    /// `Ok(None)` means nothing in the catalog matched with enough confidence.
    /// Metadata and catalog failures are returned as errors.
    pub async fn resolve(&self, content_id: &str) -> Result<Option<ResolvedStream>, ResolverError> {
        let request = parse_content_id(content_id)?;
        let meta = self.metadata.lookup(&request.external_id, request.media_type).await
            .inspect_err(|err| error!("Metadata lookup failed for {}: {err}", request.external_id))?;
        info!("Title from metadata: {} ({})", meta.name, request.media_type);

        match request.media_type {
            MediaType::Movie => self.resolve_movie(&meta).await,
            MediaType::Series => self.resolve_series(&request, &meta).await,
        }
    }

    async fn resolve_movie(&self, meta: &MetaDetails) -> Result<Option<ResolvedStream>, ResolverError> {
        let entries = self.catalog.vod_streams().await
            .inspect_err(|err| error!("Fetching vod streams failed: {err}"))?;
        let Some(found) = self.find_entry(&entries, &meta.name) else {
            info!("No matching content found for movie: {}", meta.name);
            return Ok(None);
        };
        let Some(content_url) = build_movie_url(&self.provider, found) else {
            info!("Matched movie '{}' has no stream id", found.name);
            return Ok(None);
        };
        debug_if_enabled!("Constructed stream url for '{}'", found.name);
        Ok(Some(ResolvedStream::Movie {
            title: found.name.clone(),
            content_url,
            media_type: MediaType::Movie,
        }))
    }

    async fn resolve_series(&self, request: &ContentRequest, meta: &MetaDetails) -> Result<Option<ResolvedStream>, ResolverError> {
        let entries = self.catalog.series().await
            .inspect_err(|err| error!("Fetching series failed: {err}"))?;
        let Some(found) = self.find_entry(&entries, &meta.name) else {
            info!("No matching content found for series: {}", meta.name);
            return Ok(None);
        };
        let series_id = found.series_id.ok_or_else(|| info_err!("Matched series '{}' has no series id", found.name))?;
        let info = self.catalog.series_info(series_id).await
            .inspect_err(|err| error!("Fetching series info {series_id} failed: {err}"))?;

        let Some((season, episode)) = request.season_episode() else {
            return Ok(Some(ResolvedStream::Series {
                title: found.name.clone(),
                media_type: MediaType::Series,
                series_id,
                seasons: info.seasons,
                episodes: info.episodes,
            }));
        };

        match info.find_episode(season, episode) {
            Some(found_episode) => Ok(Some(ResolvedStream::Episode {
                title: found.name.clone(),
                media_type: MediaType::Series,
                series_id,
                season: season.to_string(),
                episode: episode.to_string(),
                episode_title: found_episode.title.clone(),
                content_url: get_xtream_episode_url(&self.provider, &found_episode.id, found_episode.container_extension.as_deref()),
            })),
            None => {
                info!("Episode not found: {} S{season}E{episode}", meta.name);
                Ok(None)
            }
        }
    }

    fn find_entry<'a>(&self, entries: &'a [CatalogEntry], title: &str) -> Option<&'a CatalogEntry> {
        let found = match_content(entries, title, self.match_threshold)?;
        match found.kind {
            MatchKind::Exact => debug_if_enabled!("Exact match found: {}", found.entry.name),
            MatchKind::Fuzzy(score) => info!("Best match found: {} with similarity: {score:.3}", found.entry.name),
        }
        Some(found.entry)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use crate::model::config::ProviderConnection;
    use crate::model::metadata::MetaDetails;
    use crate::model::xtream::{CatalogEntry, MediaType, ResolvedStream, SeriesInfo};
    use crate::processing::resolver::{CatalogSource, MetadataSource, StreamResolver};
    use crate::resolver_error::{create_resolver_error_result, ResolverError, ResolverErrorKind};

    struct FakeMetadata {
        name: Option<&'static str>,
    }

    impl MetadataSource for FakeMetadata {
        async fn lookup(&self, external_id: &str, _media_type: MediaType) -> Result<MetaDetails, ResolverError> {
            match self.name {
                Some(name) => Ok(MetaDetails { name: name.to_string(), ..MetaDetails::default() }),
                None => create_resolver_error_result!(ResolverErrorKind::MetadataLookup, "unknown id {external_id}"),
            }
        }
    }

    #[derive(Default)]
    struct FakeCatalog {
        movies: Vec<CatalogEntry>,
        series: Vec<CatalogEntry>,
        fail: bool,
        info_calls: AtomicUsize,
    }

    impl CatalogSource for FakeCatalog {
        async fn vod_streams(&self) -> Result<Vec<CatalogEntry>, ResolverError> {
            if self.fail {
                return create_resolver_error_result!(ResolverErrorKind::CatalogFetch, "connection refused");
            }
            Ok(self.movies.clone())
        }

        async fn series(&self) -> Result<Vec<CatalogEntry>, ResolverError> {
            Ok(self.series.clone())
        }

        async fn series_info(&self, series_id: u32) -> Result<SeriesInfo, ResolverError> {
            self.info_calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(series_id, 77);
            Ok(serde_json::from_value(json!({
                "seasons": [{"season_number": 1}],
                "episodes": {"1": [
                    {"id": "1001", "episode_num": "1", "title": "Pilot", "container_extension": "mkv"},
                    {"id": "1002", "episode_num": 2, "title": "Cat's in the Bag"}
                ]}
            })).unwrap())
        }
    }

    fn movie(name: &str, stream_id: u32, stream_type: Option<&str>, ext: Option<&str>) -> CatalogEntry {
        CatalogEntry {
            name: name.to_string(),
            stream_id: Some(stream_id),
            stream_type: stream_type.map(ToString::to_string),
            container_extension: ext.map(ToString::to_string),
            ..CatalogEntry::default()
        }
    }

    fn series_catalog() -> FakeCatalog {
        FakeCatalog {
            series: vec![CatalogEntry { name: "Breaking Bad (2008)".to_string(), series_id: Some(77), ..CatalogEntry::default() }],
            ..FakeCatalog::default()
        }
    }

    fn provider() -> ProviderConnection {
        ProviderConnection::new("http://iptv.local:8080", "u", "p")
    }

    #[tokio::test]
    async fn test_resolve_movie_exact() {
        let catalog = FakeCatalog {
            movies: vec![movie("Heat 2", 1, Some("movie"), Some("mp4")), movie("Heat (1995)", 512, Some("movie"), Some("mkv"))],
            ..FakeCatalog::default()
        };
        let resolver = StreamResolver::new(FakeMetadata { name: Some("Heat") }, catalog, provider());
        let resolved = resolver.resolve("tt0113277").await.unwrap().unwrap();
        match resolved {
            ResolvedStream::Movie { title, content_url, media_type } => {
                assert_eq!(title, "Heat (1995)");
                assert_eq!(content_url, "http://iptv.local:8080/movie/u/p/512.mkv");
                assert_eq!(media_type, MediaType::Movie);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_resolve_movie_defaults() {
        let catalog = FakeCatalog { movies: vec![movie("Amelie", 9, None, None)], ..FakeCatalog::default() };
        let resolver = StreamResolver::new(FakeMetadata { name: Some("Amélie") }, catalog, provider());
        let resolved = resolver.resolve("tt0211915").await.unwrap().unwrap();
        assert_eq!(resolved.content_url(), Some("http://iptv.local:8080/movie/u/p/9.mp4"));
    }

    #[tokio::test]
    async fn test_resolve_movie_no_match() {
        let catalog = FakeCatalog { movies: vec![movie("Completely Different", 1, None, None)], ..FakeCatalog::default() };
        let resolver = StreamResolver::new(FakeMetadata { name: Some("Heat") }, catalog, provider());
        assert!(resolver.resolve("tt0113277").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_metadata_failure_is_error() {
        let resolver = StreamResolver::new(FakeMetadata { name: None }, FakeCatalog::default(), provider());
        let err = resolver.resolve("tt0000000").await.unwrap_err();
        assert_eq!(err.kind, ResolverErrorKind::MetadataLookup);
    }

    #[tokio::test]
    async fn test_catalog_failure_is_error() {
        let catalog = FakeCatalog { fail: true, ..FakeCatalog::default() };
        let resolver = StreamResolver::new(FakeMetadata { name: Some("Heat") }, catalog, provider());
        let err = resolver.resolve("tt0113277").await.unwrap_err();
        assert_eq!(err.kind, ResolverErrorKind::CatalogFetch);
    }

    #[tokio::test]
    async fn test_resolve_episode() {
        let resolver = StreamResolver::new(FakeMetadata { name: Some("Breaking Bad") }, series_catalog(), provider());
        let resolved = resolver.resolve("tt0903747:1:01").await.unwrap().unwrap();
        match resolved {
            ResolvedStream::Episode { title, series_id, season, episode, episode_title, content_url, .. } => {
                assert_eq!(title, "Breaking Bad (2008)");
                assert_eq!(series_id, 77);
                assert_eq!(season, "1");
                assert_eq!(episode, "01");
                assert_eq!(episode_title, "Pilot");
                assert_eq!(content_url, "http://iptv.local:8080/series/u/p/1001.mkv");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_resolve_missing_episode() {
        let catalog = series_catalog();
        let resolver = StreamResolver::new(FakeMetadata { name: Some("Breaking Bad") }, catalog, provider());
        assert!(resolver.resolve("tt0903747:1:9").await.unwrap().is_none());
        assert!(resolver.resolve("tt0903747:4:1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_resolve_full_series() {
        let resolver = StreamResolver::new(FakeMetadata { name: Some("Breaking Bad") }, series_catalog(), provider());
        let resolved = resolver.resolve("kitsu:1").await.unwrap().unwrap();
        let value = serde_json::to_value(&resolved).unwrap();
        assert_eq!(value["type"], "series");
        assert_eq!(value["seriesId"], 77);
        assert_eq!(value["episodes"]["1"][1]["id"], "1002");
        assert!(resolved.content_url().is_none());
    }

    #[tokio::test]
    async fn test_threshold_override() {
        let catalog = FakeCatalog { movies: vec![movie("Alien3", 3, None, None)], ..FakeCatalog::default() };
        let resolver = StreamResolver::new(FakeMetadata { name: Some("Aliens") }, catalog, provider())
            .with_match_threshold(0.9);
        assert!(resolver.resolve("tt0090605").await.unwrap().is_none());
        assert_eq!(resolver.catalog.info_calls.load(Ordering::SeqCst), 0);
    }
}
