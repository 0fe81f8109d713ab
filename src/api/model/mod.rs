pub mod app_state;
pub mod request;
pub mod response_cache;
pub mod stream;
