use crate::processing::matcher::MATCH_THRESHOLD;
use crate::utils::constants::DEFAULT_METADATA_URL;

pub const fn default_as_true() -> bool { true }

pub fn default_as_empty_str() -> String { String::new() }

pub fn default_api_host() -> String { String::from("0.0.0.0") }

pub const fn default_api_port() -> u16 { 3649 }

pub fn default_metadata_url() -> String { String::from(DEFAULT_METADATA_URL) }

pub const fn default_match_threshold() -> f64 { MATCH_THRESHOLD }

pub const fn default_guide_cache_hours() -> u64 { 6 }

pub const fn default_response_cache_ttl_secs() -> u64 { 200 }

pub fn default_log_level() -> String { String::from("info") }
