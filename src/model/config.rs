use std::env;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::resolver_error::{create_resolver_error_result, ResolverError, ResolverErrorKind};
use crate::utils::default_utils::{default_api_host, default_api_port, default_as_empty_str, default_as_true,
                                  default_guide_cache_hours, default_log_level, default_match_threshold,
                                  default_metadata_url, default_response_cache_ttl_secs};

const ENV_PORT: &str = "PORT";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    #[serde(default = "default_api_host")]
    pub host: String,
    #[serde(default = "default_api_port")]
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GuideConfig {
    #[serde(default = "default_guide_cache_hours")]
    pub cache_hours: u64,
}

impl Default for GuideConfig {
    fn default() -> Self {
        Self { cache_hours: default_guide_cache_hours() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResponseCacheConfig {
    #[serde(default = "default_as_true")]
    pub enabled: bool,
    #[serde(default = "default_response_cache_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for ResponseCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: default_response_cache_ttl_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    #[serde(default = "default_as_true")]
    pub sanitize_sensitive_info: bool,
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            sanitize_sensitive_info: true,
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default = "default_metadata_url")]
    pub metadata_url: String,
    #[serde(default = "default_match_threshold")]
    pub match_threshold: f64,
    #[serde(default)]
    pub guide: GuideConfig,
    #[serde(default)]
    pub response_cache: ResponseCacheConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            metadata_url: default_metadata_url(),
            match_threshold: default_match_threshold(),
            guide: GuideConfig::default(),
            response_cache: ResponseCacheConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Config {
    pub fn prepare(&mut self) -> Result<(), ResolverError> {
        if let Ok(port) = env::var(ENV_PORT) {
            match port.trim().parse::<u16>() {
                Ok(value) => {
                    debug!("Using port {value} from environment");
                    self.api.port = value;
                }
                Err(_) => warn!("Ignoring invalid {ENV_PORT} environment value: {port}"),
            }
        }
        self.metadata_url = self.metadata_url.trim().trim_end_matches('/').to_string();
        if self.metadata_url.is_empty() {
            return create_resolver_error_result!(ResolverErrorKind::Config, "metadata_url is required");
        }
        if !(self.match_threshold > 0.0 && self.match_threshold <= 1.0) {
            return create_resolver_error_result!(ResolverErrorKind::Config, "match_threshold must be in (0, 1], got {}", self.match_threshold);
        }
        if self.guide.cache_hours == 0 {
            return create_resolver_error_result!(ResolverErrorKind::Config, "guide.cache_hours must be positive");
        }
        Ok(())
    }
}

/// Upstream IPTV provider account, supplied per request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderConnection {
    #[serde(rename = "baseURL", alias = "base_url", alias = "baseUrl")]
    pub base_url: String,
    #[serde(default = "default_as_empty_str")]
    pub username: String,
    #[serde(default = "default_as_empty_str")]
    pub password: String,
}

impl ProviderConnection {
    pub fn new(base_url: &str, username: &str, password: &str) -> Self {
        let mut connection = Self {
            base_url: base_url.to_string(),
            username: username.to_string(),
            password: password.to_string(),
        };
        connection.prepare();
        connection
    }

    pub fn prepare(&mut self) {
        self.base_url = self.base_url.trim().trim_end_matches('/').to_string();
        self.username = self.username.trim().to_string();
        self.password = self.password.trim().to_string();
    }

    pub fn is_valid(&self) -> bool {
        !self.base_url.is_empty()
    }
}
