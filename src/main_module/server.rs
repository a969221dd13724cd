//! HTTP server initialization and routing

use axum::http::{header, HeaderValue, Method};
use axum::{routing::get, Router};
use log::{error, info};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::core::config::ServerConfig;
use crate::core::shared::state::AppState;
use crate::core::urls::ApiUrls;

use super::{health_check, health_check_simple, shutdown_signal};

/// CORS for the browser client. No configured origins means any origin.
pub fn create_cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN])
        .max_age(Duration::from_secs(3600));

    let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    if allowed.is_empty() {
        cors.allow_origin(Any)
    } else {
        info!("CORS configured with {} allowed origins", allowed.len());
        cors.allow_origin(allowed)
    }
}

pub fn build_router(app_state: Arc<AppState>) -> Router {
    let api_router = Router::new()
        .route(ApiUrls::HEALTH_SIMPLE, get(health_check_simple))
        .route(ApiUrls::HEALTH, get(health_check))
        .merge(crate::worksites::configure_worksite_routes())
        .merge(crate::tasks::configure_task_routes())
        .merge(crate::subtasks::configure_subtask_routes())
        .merge(crate::teams::configure_team_routes())
        .merge(crate::resources::configure_resource_routes())
        .merge(crate::users::configure_user_routes())
        .merge(crate::tags::configure_tag_routes())
        .merge(crate::planning::configure_planning_routes())
        .merge(crate::settings::configure_settings_routes())
        .merge(crate::dashboard::configure_dashboard_routes());

    let cors = create_cors_layer(&app_state.config.server.cors_origins);

    api_router
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_axum_server(app_state: Arc<AppState>, server: &ServerConfig) -> std::io::Result<()> {
    let addr: SocketAddr = format!("{}:{}", server.host, server.port)
        .parse()
        .map_err(std::io::Error::other)?;

    let app = build_router(app_state);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(
                "Failed to bind to {}: {} - is another instance running?",
                addr, e
            );
            return Err(e);
        }
    };
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(std::io::Error::other)
}
