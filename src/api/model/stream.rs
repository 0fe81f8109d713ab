use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct BehaviorHints {
    #[serde(rename = "notWebReady")]
    pub not_web_ready: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StreamItem {
    pub url: String,
    pub name: String,
    #[serde(rename = "behaviorHints", skip_serializing_if = "Option::is_none")]
    pub behavior_hints: Option<BehaviorHints>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StreamsResponse {
    pub streams: Vec<StreamItem>,
}
