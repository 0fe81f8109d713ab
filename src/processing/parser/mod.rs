pub mod content_id;
pub mod xmltv;
