use serde::Deserialize;

use crate::model::serde_utils::{deserialize_as_string, deserialize_number_from_string};

/// Envelope of the metadata service `meta/{type}/{id}.json` document.
#[derive(Debug, Clone, Deserialize)]
pub struct MetaResponse {
    #[serde(default)]
    pub meta: Option<MetaDetails>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetaDetails {
    #[serde(default, deserialize_with = "deserialize_as_string")]
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_number_from_string")]
    pub season: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_number_from_string")]
    pub episode: Option<u32>,
}
