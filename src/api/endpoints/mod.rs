pub mod epg_api;
pub mod stream_api;
