pub mod config;
pub mod metadata;
pub mod serde_utils;
pub mod xmltv;
pub mod xtream;
