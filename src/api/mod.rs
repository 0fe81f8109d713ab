pub mod main_api;
pub mod endpoints;
pub mod model;
