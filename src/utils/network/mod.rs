pub mod epg;
pub mod metadata;
pub mod request;
pub mod xtream;
