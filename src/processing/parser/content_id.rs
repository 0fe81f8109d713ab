use crate::model::xtream::MediaType;
use crate::resolver_error::{create_resolver_error_result, ResolverError, ResolverErrorKind};
use crate::utils::constants::IMDB_ID_PREFIX;

/// Parsed universal content id `<externalId>[:<season>:<episode>]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRequest {
    pub external_id: String,
    pub season: Option<String>,
    pub episode: Option<String>,
    pub media_type: MediaType,
}

impl ContentRequest {
    /// Season and episode, only when both are given.
    pub fn season_episode(&self) -> Option<(&str, &str)> {
        match (&self.season, &self.episode) {
            (Some(season), Some(episode)) => Some((season.as_str(), episode.as_str())),
            _ => None,
        }
    }
}

fn non_empty(part: Option<&str>) -> Option<String> {
    part.map(str::trim).filter(|p| !p.is_empty()).map(ToString::to_string)
}

/// Only a bare `tt…` id is a movie, anything else is looked up as series.
pub fn parse_content_id(content_id: &str) -> Result<ContentRequest, ResolverError> {
    let mut parts = content_id.trim().split(':');
    let Some(external_id) = non_empty(parts.next()) else {
        return create_resolver_error_result!(ResolverErrorKind::Info, "empty content id");
    };
    let season = non_empty(parts.next());
    let episode = non_empty(parts.next());

    let media_type = if external_id.starts_with(IMDB_ID_PREFIX) {
        if season.is_some() && episode.is_some() { MediaType::Series } else { MediaType::Movie }
    } else {
        MediaType::Series
    };

    Ok(ContentRequest {
        external_id,
        season,
        episode,
        media_type,
    })
}
