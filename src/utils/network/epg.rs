use std::sync::Arc;

use crate::model::config::ProviderConnection;
use crate::processing::guide::FeedSource;
use crate::resolver_error::{ResolverError, ResolverErrorKind};
use crate::utils::network::request;
use crate::utils::network::xtream::get_xtream_query_url;

const XMLTV_SCRIPT: &str = "xmltv.php";

pub fn get_xmltv_url(connection: &ProviderConnection) -> Result<String, ResolverError> {
    get_xtream_query_url(connection, XMLTV_SCRIPT, &[])
}

/// Broadcast grid served by the provider's `xmltv.php`.
pub struct XmltvFeed {
    client: Arc<reqwest::Client>,
    connection: ProviderConnection,
}

impl XmltvFeed {
    pub fn new(client: Arc<reqwest::Client>, connection: &ProviderConnection) -> Self {
        Self { client, connection: connection.clone() }
    }
}

impl FeedSource for XmltvFeed {
    async fn fetch_feed(&self) -> Result<String, ResolverError> {
        let url = get_xmltv_url(&self.connection)?;
        request::get_text_content(&self.client, &url, ResolverErrorKind::FeedFetch).await
    }
}
