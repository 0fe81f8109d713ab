use std::sync::Arc;

use axum::response::IntoResponse;
use log::{error, info};

use crate::api::model::app_state::AppState;
use crate::api::model::request::decode_user_conf;
use crate::api::model::stream::{BehaviorHints, StreamItem, StreamsResponse};
use crate::model::config::ProviderConnection;
use crate::model::xtream::{DEFAULT_LIVE_EXTENSION, DEFAULT_VOD_EXTENSION, XC_STREAM_TYPE_LIVE};
use crate::processing::resolver::StreamResolver;
use crate::resolver_error::ResolverError;
use crate::utils::constants::IMDB_ID_PREFIX;
use crate::utils::debug_if_enabled;
use crate::utils::network::metadata::CinemetaClient;
use crate::utils::network::request::sanitize_sensitive_info;
use crate::utils::network::xtream::{get_xtream_stream_url, XtreamProvider};

const ADDON_TYPE_TV: &str = "tv";
const ADDON_STREAM_NAME: &str = "Watch Now";
const JSON_EXT: &str = ".json";

/// Direct stream for catalog ids of the form `<prefix>:<stream_id>`.
pub fn build_channel_streams(provider: &ProviderConnection, stream_type: &str, id: &str) -> StreamsResponse {
    let Some(stream_id) = id.split(':').nth(1).map(str::trim).filter(|sid| !sid.is_empty()) else {
        return StreamsResponse::default();
    };
    let item = if stream_type == ADDON_TYPE_TV {
        StreamItem {
            url: get_xtream_stream_url(provider, XC_STREAM_TYPE_LIVE, stream_id, Some(DEFAULT_LIVE_EXTENSION)),
            name: ADDON_STREAM_NAME.to_string(),
            behavior_hints: Some(BehaviorHints { not_web_ready: true }),
        }
    } else {
        StreamItem {
            url: get_xtream_stream_url(provider, stream_type, stream_id, Some(DEFAULT_VOD_EXTENSION)),
            name: ADDON_STREAM_NAME.to_string(),
            behavior_hints: None,
        }
    };
    debug_if_enabled!("Stream url for {}: {}", id, sanitize_sensitive_info(&item.url));
    StreamsResponse { streams: vec![item] }
}

async fn resolve_streams(app_state: &AppState, provider: &ProviderConnection, content_id: &str) -> Result<StreamsResponse, ResolverError> {
    let metadata = CinemetaClient::new(Arc::clone(&app_state.http_client), &app_state.config.metadata_url);
    let catalog = XtreamProvider::new(Arc::clone(&app_state.http_client), provider.clone());
    let resolver = StreamResolver::new(metadata, catalog, provider.clone())
        .with_match_threshold(app_state.config.match_threshold);

    let streams = match resolver.resolve(content_id).await? {
        Some(resolved) => resolved.content_url().map(|url| StreamItem {
            url: url.to_string(),
            name: resolved.title().to_string(),
            behavior_hints: None,
        }).into_iter().collect(),
        None => {
            info!("No stream found for {content_id}");
            vec![]
        }
    };
    Ok(StreamsResponse { streams })
}

async fn stream_api(
    axum::extract::Path((user_conf, stream_type, id)): axum::extract::Path<(String, String, String)>,
    axum::extract::State(app_state): axum::extract::State<Arc<AppState>>,
) -> impl axum::response::IntoResponse + Send {
    let provider = match decode_user_conf(&user_conf) {
        Ok(provider) => provider,
        Err(err) => {
            debug_if_enabled!("Rejected stream request: {}", err);
            return axum::http::StatusCode::BAD_REQUEST.into_response();
        }
    };
    let content_id = id.strip_suffix(JSON_EXT).unwrap_or(&id);

    if !content_id.starts_with(IMDB_ID_PREFIX) {
        return axum::Json(build_channel_streams(&provider, &stream_type, content_id)).into_response();
    }

    let cache_key = format!("stream-{user_conf}-{stream_type}-{content_id}");
    match app_state.cached_json(cache_key, resolve_streams(&app_state, &provider, content_id)).await {
        Ok(value) => axum::Json(value).into_response(),
        Err(err) => {
            if err.is_fetch_error() {
                error!("Stream resolution failed for {content_id}: {err}");
            } else {
                info!("Stream resolution skipped for {content_id}: {err}");
            }
            axum::Json(StreamsResponse::default()).into_response()
        }
    }
}

pub fn stream_api_register() -> axum::Router<Arc<AppState>> {
    axum::Router::new()
        .route("/{user_conf}/stream/{stream_type}/{id}", axum::routing::get(stream_api))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::api::endpoints::stream_api::build_channel_streams;
    use crate::model::config::ProviderConnection;

    #[test]
    fn test_live_channel_stream() {
        let con = ProviderConnection::new("http://iptv.local:8080", "u", "p");
        let response = serde_json::to_value(build_channel_streams(&con, "tv", "xtream:42")).unwrap();
        assert_eq!(response, json!({"streams": [{
            "url": "http://iptv.local:8080/live/u/p/42.ts",
            "name": "Watch Now",
            "behaviorHints": {"notWebReady": true}
        }]}));
    }

    #[test]
    fn test_vod_channel_stream() {
        let con = ProviderConnection::new("http://iptv.local:8080", "u", "p");
        let response = build_channel_streams(&con, "movie", "xtream:512");
        assert_eq!(response.streams[0].url, "http://iptv.local:8080/movie/u/p/512.mp4");
        assert!(response.streams[0].behavior_hints.is_none());
        assert!(build_channel_streams(&con, "movie", "xtream").streams.is_empty());
    }
}
