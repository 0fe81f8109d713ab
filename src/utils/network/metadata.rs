use std::sync::Arc;

use log::error;

use crate::model::metadata::{MetaDetails, MetaResponse};
use crate::model::xtream::MediaType;
use crate::processing::resolver::MetadataSource;
use crate::resolver_error::{create_resolver_error_result, ResolverError, ResolverErrorKind};
use crate::utils::network::request;

pub fn get_meta_url(metadata_url: &str, external_id: &str, media_type: MediaType) -> String {
    format!("{}/meta/{media_type}/{external_id}.json", metadata_url.trim_end_matches('/'))
}

/// Title lookup against a Cinemeta compatible metadata service.
pub struct CinemetaClient {
    client: Arc<reqwest::Client>,
    metadata_url: String,
}

impl CinemetaClient {
    pub fn new(client: Arc<reqwest::Client>, metadata_url: &str) -> Self {
        Self { client, metadata_url: metadata_url.to_string() }
    }
}

impl MetadataSource for CinemetaClient {
    async fn lookup(&self, external_id: &str, media_type: MediaType) -> Result<MetaDetails, ResolverError> {
        let url = get_meta_url(&self.metadata_url, external_id, media_type);
        let response: MetaResponse = request::get_json_content(&self.client, &url, ResolverErrorKind::MetadataLookup).await?;
        match response.meta {
            Some(meta) if !meta.name.trim().is_empty() => Ok(meta),
            _ => {
                error!("No metadata found for {media_type} {external_id}");
                create_resolver_error_result!(ResolverErrorKind::MetadataLookup, "No metadata found for {media_type} {external_id}")
            }
        }
    }
}
