use std::sync::Arc;

use axum::response::IntoResponse;
use log::error;
use serde_json::{json, Value};

use crate::api::model::app_state::AppState;
use crate::api::model::request::decode_user_conf;
use crate::model::config::ProviderConnection;
use crate::model::xmltv::ChannelRef;
use crate::resolver_error::ResolverError;
use crate::utils::debug_if_enabled;

macro_rules! try_user_conf {
    ($user_conf:expr) => {
        match decode_user_conf($user_conf) {
            Ok(provider) => provider,
            Err(err) => {
                debug_if_enabled!("Rejected guide request: {}", err);
                return axum::http::StatusCode::BAD_REQUEST.into_response();
            }
        }
    };
}

/// Splits a comma separated id list, blank entries are dropped.
pub fn split_channel_ids(channel_ids: &str) -> Vec<String> {
    channel_ids.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn guide_error_response(err: &ResolverError) -> axum::response::Response {
    error!("Guide request failed: {err}");
    (axum::http::StatusCode::INTERNAL_SERVER_ERROR,
     axum::Json(json!({"error": format!("Error processing XMLTV data: {}", err.message)}))).into_response()
}

async fn epg_channel(
    axum::extract::Path((user_conf, channel_id)): axum::extract::Path<(String, String)>,
    axum::extract::State(app_state): axum::extract::State<Arc<AppState>>,
) -> impl axum::response::IntoResponse + Send {
    let provider: ProviderConnection = try_user_conf!(&user_conf);
    let (cache, feed) = app_state.get_guide(&provider).await;
    let cache_key = format!("epg-channel-{user_conf}-{channel_id}");
    match app_state.cached_json(cache_key, cache.get_channel(&feed, &channel_id)).await {
        Ok(value) => axum::Json(value).into_response(),
        Err(err) => {
            // single channel lookups answer null on any failure
            error!("Guide lookup for channel {channel_id} failed: {err}");
            axum::Json(Value::Null).into_response()
        }
    }
}

async fn epg_channels(
    axum::extract::Path((user_conf, channel_ids)): axum::extract::Path<(String, String)>,
    axum::extract::State(app_state): axum::extract::State<Arc<AppState>>,
) -> impl axum::response::IntoResponse + Send {
    let provider: ProviderConnection = try_user_conf!(&user_conf);
    let (cache, feed) = app_state.get_guide(&provider).await;
    let ids = split_channel_ids(&channel_ids);
    let cache_key = format!("epg-channels-{user_conf}-{channel_ids}");
    match app_state.cached_json(cache_key, cache.get_channels(&feed, &ids)).await {
        Ok(value) => axum::Json(value).into_response(),
        Err(err) => guide_error_response(&err),
    }
}

async fn epg_list(
    axum::extract::Path(user_conf): axum::extract::Path<String>,
    axum::extract::State(app_state): axum::extract::State<Arc<AppState>>,
) -> impl axum::response::IntoResponse + Send {
    let provider: ProviderConnection = try_user_conf!(&user_conf);
    let (cache, feed) = app_state.get_guide(&provider).await;
    let cache_key = format!("epg-list-{user_conf}");
    match app_state.cached_json(cache_key, cache.list_channels(&feed)).await {
        Ok(value) => axum::Json(value).into_response(),
        Err(err) => guide_error_response(&err),
    }
}

async fn epg_batch(
    axum::extract::Path(user_conf): axum::extract::Path<String>,
    axum::extract::State(app_state): axum::extract::State<Arc<AppState>>,
    axum::extract::Json(refs): axum::extract::Json<Vec<ChannelRef>>,
) -> impl axum::response::IntoResponse + Send {
    let provider: ProviderConnection = try_user_conf!(&user_conf);
    let (cache, feed) = app_state.get_guide(&provider).await;
    let body_key = serde_json::to_string(&refs).unwrap_or_default();
    let cache_key = format!("epg-batch-{user_conf}-{body_key}");
    match app_state.cached_json(cache_key, cache.get_batch(&feed, &refs)).await {
        Ok(value) => axum::Json(value).into_response(),
        Err(err) => guide_error_response(&err),
    }
}

pub fn epg_api_register() -> axum::Router<Arc<AppState>> {
    axum::Router::new()
        .route("/{user_conf}/epg/channel/{channel_id}", axum::routing::get(epg_channel))
        .route("/{user_conf}/epg/channels/{channel_ids}", axum::routing::get(epg_channels))
        .route("/{user_conf}/epg/list", axum::routing::get(epg_list))
        .route("/{user_conf}/epg/batch", axum::routing::post(epg_batch))
}
