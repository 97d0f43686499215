// Parking Admin action server - seeded demo backend for the console

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use parking_admin::{action_interface::create_action_router, app_state::AppState, config::Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    let app_state = AppState::new(config.clone()).await?;

    let app = Router::new()
        .nest("/api/v1", create_action_router(app_state.action_interface.clone()))
        .layer(CorsLayer::permissive());

    let addr = config.server_address();
    info!("Parking admin backend listening on http://{}", addr);
    info!("  POST /api/v1/actions/{{model}}/{{action}}  - run a remote action");
    info!("  GET  /api/v1/files/{{id}}                 - download an uploaded file");
    info!("  GET  /api/v1/health                      - models and status");
    info!("Screens: {}", app_state.screens.names().join(", "));

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
