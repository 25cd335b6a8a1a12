//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application: the
//! health endpoint, the WebSocket endpoint, OpenAPI documentation and the
//! static client page.

use crate::{
    handlers::{self, HealthResponse},
    state::AppState,
    ws::{root_handler, ws_handler},
};

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::services::{ServeDir, ServeFile};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(handlers::health_check),
    components(schemas(HealthResponse)),
    tags(
        (name = "Revolt Voice Assistant", description = "Health reporting for the Rev voice assistant")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let static_dir = app_state.config.static_dir.clone();
    let client_page =
        ServeDir::new(&static_dir).not_found_service(ServeFile::new(static_dir.join("index.html")));

    let api_router = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/", get(root_handler))
        .route("/ws", get(ws_handler))
        .with_state(app_state);

    // Everything that is not an API route falls through to the client page.
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router)
        .fallback_service(client_page)
}
