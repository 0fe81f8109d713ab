use std::sync::Arc;

use log::info;
use tower_http::cors::{Any, CorsLayer};

use crate::api::endpoints::epg_api::epg_api_register;
use crate::api::endpoints::stream_api::stream_api_register;
use crate::api::model::app_state::AppState;
use crate::model::config::Config;

fn create_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn create_router(app_state: Arc<AppState>) -> axum::Router {
    axum::Router::new()
        .merge(stream_api_register())
        .merge(epg_api_register())
        .layer(create_cors_layer())
        .with_state(app_state)
}

pub async fn start_server(cfg: Arc<Config>) -> std::io::Result<()> {
    let host = cfg.api.host.to_string();
    let port = cfg.api.port;
    let http_client = Arc::new(reqwest::Client::new());
    let app_state = Arc::new(AppState::new(Arc::clone(&cfg), http_client));
    let router = create_router(app_state);

    let listener = tokio::net::TcpListener::bind(format!("{host}:{port}")).await?;
    info!("Server running: http://{host}:{port}");
    axum::serve(listener, router).await
}
