use log::warn;
use serde::{Deserialize, Serialize};

use crate::model::serde_utils::{deserialize_as_option_string, deserialize_as_string};
use crate::utils::time_utils::xmltv_timestamp_to_gmt;

pub const EPG_TAG_TV: &str = "tv";
pub const EPG_TAG_CHANNEL: &str = "channel";
pub const EPG_TAG_PROGRAMME: &str = "programme";
pub const EPG_TAG_DISPLAY_NAME: &str = "display-name";
pub const EPG_TAG_ICON: &str = "icon";
pub const EPG_TAG_TITLE: &str = "title";
pub const EPG_TAG_DESC: &str = "desc";
pub const EPG_ATTRIB_ID: &str = "id";
pub const EPG_ATTRIB_CHANNEL: &str = "channel";
pub const EPG_ATTRIB_START: &str = "start";
pub const EPG_ATTRIB_STOP: &str = "stop";
pub const EPG_ATTRIB_SRC: &str = "src";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub icon: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Programme {
    pub channel_id: String,
    pub start: String,
    pub stop: String,
    pub title: String,
    pub description: String,
}

impl Programme {
    /// Copy with `start`/`stop` rendered as GMT strings for api responses.
    pub fn with_gmt_times(&self) -> Self {
        let render = |timestamp: &str| xmltv_timestamp_to_gmt(timestamp).unwrap_or_else(|| {
            warn!("Invalid programme timestamp '{timestamp}' for channel {}", self.channel_id);
            timestamp.to_string()
        });
        Self {
            channel_id: self.channel_id.clone(),
            start: render(&self.start),
            stop: render(&self.stop),
            title: self.title.clone(),
            description: self.description.clone(),
        }
    }
}

/// Fully parsed broadcast grid document.
#[derive(Debug, Clone, Default)]
pub struct TVGuide {
    pub channels: Vec<Channel>,
    pub programmes: Vec<Programme>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelGuide {
    pub channel: Channel,
    pub current_program: Option<Programme>,
    pub next_program: Option<Programme>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ChannelGuideResult {
    Found(ChannelGuide),
    NotFound {
        #[serde(rename = "channelId")]
        channel_id: String,
        error: String,
    },
}

/// Live stream reference used for batch guide lookups.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelRef {
    #[serde(default, deserialize_with = "deserialize_as_string")]
    pub stream_id: String,
    #[serde(default, deserialize_with = "deserialize_as_option_string")]
    pub epg_channel_id: Option<String>,
}

impl ChannelRef {
    pub fn get_epg_channel_id(&self) -> Option<&str> {
        self.epg_channel_id.as_deref().filter(|id| !id.is_empty())
    }
}
