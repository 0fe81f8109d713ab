use std::sync::Arc;

use log::debug;
use url::Url;

use crate::model::config::ProviderConnection;
use crate::model::xtream::{CatalogEntry, SeriesInfo, DEFAULT_VOD_EXTENSION, XC_ACTION_GET_SERIES, XC_ACTION_GET_SERIES_INFO,
                           XC_ACTION_GET_VOD_STREAMS, XC_SERIES_ID, XC_STREAM_TYPE_SERIES};
use crate::processing::resolver::CatalogSource;
use crate::resolver_error::{create_resolver_error, ResolverError, ResolverErrorKind};
use crate::utils::network::request;
use crate::utils::network::request::sanitize_sensitive_info;

const XC_PLAYER_API: &str = "player_api.php";
const XC_PARAM_USERNAME: &str = "username";
const XC_PARAM_PASSWORD: &str = "password";
const XC_PARAM_ACTION: &str = "action";

/// `{base}/{script}?username=..&password=..` followed by `params`, all query values form-encoded.
pub fn get_xtream_query_url(connection: &ProviderConnection, script: &str, params: &[(&str, &str)]) -> Result<String, ResolverError> {
    let base = format!("{}/{script}", connection.base_url);
    let credentials = [(XC_PARAM_USERNAME, connection.username.as_str()), (XC_PARAM_PASSWORD, connection.password.as_str())];
    Url::parse_with_params(&base, credentials.iter().chain(params.iter()))
        .map(String::from)
        .map_err(|err| create_resolver_error!(ResolverErrorKind::Config, "invalid provider url {}: {err}", sanitize_sensitive_info(&base)))
}

pub fn get_xtream_player_api_action_url(connection: &ProviderConnection, action: &str) -> Result<String, ResolverError> {
    get_xtream_query_url(connection, XC_PLAYER_API, &[(XC_PARAM_ACTION, action)])
}

pub fn get_xtream_player_api_series_info_url(connection: &ProviderConnection, series_id: u32) -> Result<String, ResolverError> {
    let series_id = series_id.to_string();
    get_xtream_query_url(connection, XC_PLAYER_API, &[(XC_PARAM_ACTION, XC_ACTION_GET_SERIES_INFO), (XC_SERIES_ID, &series_id)])
}

/// `{base}/{stream_type}/{user}/{pass}/{id}.{ext}`, extension falls back to `mp4`.
pub fn get_xtream_stream_url(connection: &ProviderConnection, stream_type: &str, stream_id: &str, extension: Option<&str>) -> String {
    let extension = extension.map(str::trim).filter(|ext| !ext.is_empty()).unwrap_or(DEFAULT_VOD_EXTENSION);
    format!("{}/{stream_type}/{}/{}/{stream_id}.{extension}",
            connection.base_url, connection.username, connection.password)
}

pub fn get_xtream_episode_url(connection: &ProviderConnection, episode_id: &str, extension: Option<&str>) -> String {
    get_xtream_stream_url(connection, XC_STREAM_TYPE_SERIES, episode_id, extension)
}

/// Provider catalog over the `player_api.php` endpoints.
pub struct XtreamProvider {
    client: Arc<reqwest::Client>,
    connection: ProviderConnection,
}

impl XtreamProvider {
    pub fn new(client: Arc<reqwest::Client>, connection: ProviderConnection) -> Self {
        Self { client, connection }
    }

    async fn get_catalog(&self, action: &str) -> Result<Vec<CatalogEntry>, ResolverError> {
        let url = get_xtream_player_api_action_url(&self.connection, action)?;
        let entries: Vec<CatalogEntry> = request::get_json_content(&self.client, &url, ResolverErrorKind::CatalogFetch).await?;
        debug!("Provider returned {} entries for {action}", entries.len());
        Ok(entries)
    }
}

impl CatalogSource for XtreamProvider {
    async fn vod_streams(&self) -> Result<Vec<CatalogEntry>, ResolverError> {
        self.get_catalog(XC_ACTION_GET_VOD_STREAMS).await
    }

    async fn series(&self) -> Result<Vec<CatalogEntry>, ResolverError> {
        self.get_catalog(XC_ACTION_GET_SERIES).await
    }

    async fn series_info(&self, series_id: u32) -> Result<SeriesInfo, ResolverError> {
        let url = get_xtream_player_api_series_info_url(&self.connection, series_id)?;
        request::get_json_content(&self.client, &url, ResolverErrorKind::CatalogFetch).await
    }
}
