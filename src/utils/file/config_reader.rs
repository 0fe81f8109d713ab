use std::env;
use std::path::PathBuf;

use log::{info, warn};

use crate::model::config::Config;
use crate::resolver_error::{create_resolver_error_result, ResolverError, ResolverErrorKind};
use crate::utils::constants::CONSTANTS;
use crate::utils::file::env_resolving_reader::EnvResolvingReader;
use crate::utils::file::file_utils;

pub fn read_config(config_file: &str) -> Result<Config, ResolverError> {
    let config_path = PathBuf::from(config_file);
    let mut config = if config_path.exists() {
        match file_utils::open_file(&config_path) {
            Ok(file) => {
                let reader = EnvResolvingReader::new(file_utils::file_reader(file));
                match serde_yaml::from_reader::<_, Config>(reader) {
                    Ok(cfg) => {
                        info!("Config loaded from {config_file}");
                        cfg
                    }
                    Err(err) => return create_resolver_error_result!(ResolverErrorKind::Config, "cant read config file {config_file}: {err}"),
                }
            }
            Err(err) => return create_resolver_error_result!(ResolverErrorKind::Config, "cant open config file {config_file}: {err}"),
        }
    } else {
        warn!("Config file {config_file} not found, using defaults");
        Config::default()
    };
    config.prepare()?;
    Ok(config)
}

pub fn resolve_env_var(value: &str) -> String {
    CONSTANTS.re_env_var.replace_all(value, |caps: &regex::Captures| {
        let var_name = &caps["var"];
        env::var(var_name).unwrap_or_else(|_| format!("${{env:{var_name}}}"))
    }).to_string()
}

#[cfg(test)]
mod tests {
    use crate::utils::file::config_reader::{read_config, resolve_env_var};

    #[test]
    fn test_resolve() {
        let resolved = resolve_env_var("${env:HOME}");
        assert_eq!(resolved, std::env::var("HOME").unwrap());
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let cfg = read_config("/nonexistent/xtream-resolver/config.yml").unwrap();
        assert!((cfg.match_threshold - 0.8).abs() < f64::EPSILON);
        assert_eq!(cfg.guide.cache_hours, 6);
    }
}
