use std::env;
use std::sync::Arc;

use clap::Parser;
use env_logger::Builder;
use log::{info, LevelFilter};

use crate::model::config::Config;
use crate::utils::file::config_reader::read_config;
use crate::utils::file::file_utils;
use crate::utils::network::request::set_sanitize_sensitive_info;

mod api;
mod model;
mod processing;
mod resolver_error;
mod utils;

const LOG_ENV: &str = "RUST_LOG";

#[derive(Parser)]
#[command(name = "xtream-resolver")]
#[command(version)]
#[command(about = "Resolves universal content ids to Xtream provider streams and serves now/next guide data", long_about = None)]
struct Args {
    /// The config file
    #[arg(short = 'c', long = "config")]
    config_file: Option<String>,

    /// Log level: trace, debug, info, warn, error, or module filters like `xtream_resolver=debug`
    #[arg(short = 'l', long = "log-level")]
    log_level: Option<String>,
}

// Returns true when the level was given explicitly and must not be replaced by the config value.
fn init_logger(log_level: Option<&str>) -> bool {
    let mut log_builder = Builder::from_default_env();
    log_builder.format_timestamp_millis();
    let explicit = if let Some(level) = log_level {
        log_builder.parse_filters(level);
        true
    } else if env::var(LOG_ENV).is_ok() {
        true
    } else {
        log_builder.filter_level(LevelFilter::Trace);
        false
    };
    log_builder.init();
    explicit
}

fn apply_config_log_level(cfg: &Config) {
    let level = cfg.log.level.parse::<LevelFilter>().unwrap_or_else(|_| {
        log::warn!("Unknown log level '{}', using info", cfg.log.level);
        LevelFilter::Info
    });
    log::set_max_level(level);
}

fn main() {
    let args = Args::parse();
    let explicit_log_level = init_logger(args.log_level.as_deref());

    let config_file = args.config_file.unwrap_or_else(file_utils::get_default_config_file_path);
    let cfg = read_config(&config_file).unwrap_or_else(|err| exit!("{err}"));
    if !explicit_log_level {
        apply_config_log_level(&cfg);
    }
    set_sanitize_sensitive_info(cfg.log.sanitize_sensitive_info);

    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Build time: {}", env!("VERGEN_BUILD_TIMESTAMP"));
    info!("Metadata service: {}", cfg.metadata_url);
    info!("Guide cache: {}h, response cache: {}", cfg.guide.cache_hours,
          if cfg.response_cache.enabled { format!("{}s", cfg.response_cache.ttl_secs) } else { "disabled".to_string() });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|err| exit!("cant start runtime: {err}"));
    if let Err(err) = runtime.block_on(api::main_api::start_server(Arc::new(cfg))) {
        exit!("cant start server: {err}");
    }
}
