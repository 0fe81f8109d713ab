pub mod config_reader;
pub mod env_resolving_reader;
pub mod file_utils;
