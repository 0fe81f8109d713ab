use regex::Regex;
use std::sync::atomic::AtomicBool;
use std::sync::LazyLock;

pub const CONFIG_PATH: &str = "config";
pub const CONFIG_FILE: &str = "config.yml";

pub const ENCODING_GZIP: &str = "gzip";
pub const ENCODING_DEFLATE: &str = "deflate";

pub const DEFAULT_METADATA_URL: &str = "https://v3-cinemeta.strem.io";

/// Universal content ids with this prefix are candidates for a movie lookup.
pub const IMDB_ID_PREFIX: &str = "tt";

pub struct Constants {
    pub re_username: Regex,
    pub re_password: Regex,
    pub re_token: Regex,
    pub re_stream_url: Regex,
    pub re_url: Regex,
    pub re_env_var: Regex,
    pub re_title_annotation: Regex,
    pub re_title_year: Regex,
    pub sanitize: AtomicBool,
}

pub static CONSTANTS: LazyLock<Constants> = LazyLock::new(||
    Constants {
        re_username: Regex::new(r"(username=)[^&]*").unwrap(),
        re_password: Regex::new(r"(password=)[^&]*").unwrap(),
        re_token: Regex::new(r"(token=)[^&]*").unwrap(),
        re_stream_url: Regex::new(r"(.*://).*/(live|video|movie|series)/\w+/\w+").unwrap(),
        re_url: Regex::new(r"(.*://).*?/(.*)").unwrap(),
        re_env_var: Regex::new(r"\$\{env:(?P<var>[a-zA-Z_][a-zA-Z0-9_]*)}").unwrap(),
        re_title_annotation: Regex::new(r"\s*\([^)]*\)|\s*\[[^\]]*\]").unwrap(),
        re_title_year: Regex::new(r"\s+\d{4}$").unwrap(),
        sanitize: AtomicBool::new(true),
    }
);
