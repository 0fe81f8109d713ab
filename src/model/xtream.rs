use std::fmt::{Display, Formatter};

use indexmap::IndexMap;
use log::warn;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::model::serde_utils::{deserialize_as_option_string, deserialize_as_string, deserialize_number_from_string, str_to_u32};

pub const XC_SERIES_ID: &str = "series_id";
pub const XC_ACTION_GET_SERIES_INFO: &str = "get_series_info";
pub const XC_ACTION_GET_SERIES: &str = "get_series";
pub const XC_ACTION_GET_VOD_STREAMS: &str = "get_vod_streams";

pub const XC_STREAM_TYPE_MOVIE: &str = "movie";
pub const XC_STREAM_TYPE_SERIES: &str = "series";
pub const XC_STREAM_TYPE_LIVE: &str = "live";

pub const DEFAULT_VOD_EXTENSION: &str = "mp4";
pub const DEFAULT_LIVE_EXTENSION: &str = "ts";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Series,
}

impl MediaType {
    const MOVIE: &'static str = "movie";
    const SERIES: &'static str = "series";
}

impl Display for MediaType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", match self {
            Self::Movie => Self::MOVIE,
            Self::Series => Self::SERIES,
        })
    }
}

/// One item of the provider's `get_vod_streams` or `get_series` listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(default, deserialize_with = "deserialize_as_string")]
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_number_from_string")]
    pub stream_id: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_number_from_string")]
    pub series_id: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_as_option_string")]
    pub container_extension: Option<String>,
    #[serde(default, deserialize_with = "deserialize_as_option_string")]
    pub stream_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeriesEpisode {
    #[serde(default, deserialize_with = "deserialize_as_string")]
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_number_from_string")]
    pub episode_num: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_as_string")]
    pub title: String,
    #[serde(default, deserialize_with = "deserialize_as_option_string")]
    pub container_extension: Option<String>,
    #[serde(default, deserialize_with = "deserialize_number_from_string")]
    pub season: Option<u32>,
    #[serde(flatten)]
    pub additional_properties: Map<String, Value>,
}

pub type SeasonEpisodes = IndexMap<String, Vec<SeriesEpisode>>;

fn parse_episode_list(season: &str, value: Value) -> Vec<SeriesEpisode> {
    match value {
        Value::Array(items) => items.into_iter().filter_map(|item| {
            serde_json::from_value::<SeriesEpisode>(item)
                .map_err(|err| warn!("Skipping malformed episode in season {season}: {err}"))
                .ok()
        }).collect(),
        _ => vec![],
    }
}

// Providers deliver episodes as `{"1": [...], "2": [...]}` or, for seasons starting at zero, as a plain list.
fn deserialize_season_episodes<'de, D>(deserializer: D) -> Result<SeasonEpisodes, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Value = Deserialize::deserialize(deserializer)?;
    let mut result = SeasonEpisodes::new();
    match value {
        Value::Object(map) => {
            for (season, episodes) in map {
                let list = parse_episode_list(&season, episodes);
                result.insert(season, list);
            }
        }
        Value::Array(seasons) => {
            for (idx, episodes) in seasons.into_iter().enumerate() {
                let fallback = (idx + 1).to_string();
                let list = parse_episode_list(&fallback, episodes);
                let season = list.first().and_then(|ep| ep.season).map_or(fallback, |s| s.to_string());
                result.insert(season, list);
            }
        }
        _ => {}
    }
    Ok(result)
}

/// Response of `get_series_info`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeriesInfo {
    #[serde(default)]
    pub seasons: Value,
    #[serde(default, deserialize_with = "deserialize_season_episodes")]
    pub episodes: SeasonEpisodes,
}

impl SeriesInfo {
    pub fn get_season(&self, season: &str) -> Option<&Vec<SeriesEpisode>> {
        self.episodes.get(season).or_else(|| {
            let season_num = str_to_u32(season)?;
            self.episodes.iter()
                .find(|(key, _)| str_to_u32(key) == Some(season_num))
                .map(|(_, episodes)| episodes)
        })
    }

    pub fn find_episode(&self, season: &str, episode: &str) -> Option<&SeriesEpisode> {
        let episode_num = str_to_u32(episode)?;
        self.get_season(season)?.iter().find(|ep| ep.episode_num == Some(episode_num))
    }
}

/// Outcome of a successful resolution.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ResolvedStream {
    Movie {
        title: String,
        #[serde(rename = "contentUrl")]
        content_url: String,
        #[serde(rename = "type")]
        media_type: MediaType,
    },
    Episode {
        title: String,
        #[serde(rename = "type")]
        media_type: MediaType,
        #[serde(rename = "seriesId")]
        series_id: u32,
        season: String,
        episode: String,
        #[serde(rename = "episodeTitle")]
        episode_title: String,
        #[serde(rename = "contentUrl")]
        content_url: String,
    },
    Series {
        title: String,
        #[serde(rename = "type")]
        media_type: MediaType,
        #[serde(rename = "seriesId")]
        series_id: u32,
        seasons: Value,
        episodes: SeasonEpisodes,
    },
}

impl ResolvedStream {
    pub fn title(&self) -> &str {
        match self {
            Self::Movie { title, .. } | Self::Episode { title, .. } | Self::Series { title, .. } => title,
        }
    }

    pub fn content_url(&self) -> Option<&str> {
        match self {
            Self::Movie { content_url, .. } | Self::Episode { content_url, .. } => Some(content_url),
            Self::Series { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use crate::model::xtream::{CatalogEntry, MediaType, ResolvedStream, SeriesInfo};

    #[test]
    fn test_catalog_entry_loose_fields() {
        let entries: Vec<CatalogEntry> = serde_json::from_value(json!([
            {"name": "Heat (1995)", "stream_id": "512", "container_extension": "mkv", "stream_type": "movie"},
            {"name": null, "series_id": 77}
        ])).unwrap();
        assert_eq!(entries[0].stream_id, Some(512));
        assert_eq!(entries[0].container_extension.as_deref(), Some("mkv"));
        assert_eq!(entries[1].name, "");
        assert_eq!(entries[1].series_id, Some(77));
        assert!(entries[1].stream_type.is_none());
    }

    #[test]
    fn test_series_info_object_episodes() {
        let info: SeriesInfo = serde_json::from_value(json!({
            "seasons": [{"season_number": 1}],
            "episodes": {
                "1": [{"id": "1001", "episode_num": "1", "title": "Pilot", "container_extension": "mp4"},
                      {"id": 1002, "episode_num": 2, "title": "Second", "container_extension": "mkv", "info": {"duration": "00:42:00"}}],
                "2": [{"id": "2001", "episode_num": 1, "title": "Return"}]
            }
        })).unwrap();
        assert_eq!(info.episodes.len(), 2);
        let ep = info.find_episode("1", "02").unwrap();
        assert_eq!(ep.id, "1002");
        assert!(ep.additional_properties.contains_key("info"));
        assert_eq!(info.find_episode("02", "1").unwrap().title, "Return");
        assert!(info.find_episode("1", "9").is_none());
        assert!(info.find_episode("3", "1").is_none());
    }

    #[test]
    fn test_series_info_array_episodes() {
        let info: SeriesInfo = serde_json::from_value(json!({
            "episodes": [[{"id": "5", "episode_num": 1, "season": 0}], [{"id": "6", "episode_num": 1}]]
        })).unwrap();
        assert!(info.episodes.contains_key("0"));
        assert!(info.episodes.contains_key("2"));
        assert_eq!(info.find_episode("0", "1").unwrap().id, "5");
    }

    #[test]
    fn test_resolved_stream_field_names() {
        let movie = ResolvedStream::Movie { title: "Heat".to_string(), content_url: "http://x/movie/u/p/1.mp4".to_string(), media_type: MediaType::Movie };
        let value = serde_json::to_value(&movie).unwrap();
        assert_eq!(value, json!({"title": "Heat", "contentUrl": "http://x/movie/u/p/1.mp4", "type": "movie"}));
        assert_eq!(movie.content_url(), Some("http://x/movie/u/p/1.mp4"));
    }
}
