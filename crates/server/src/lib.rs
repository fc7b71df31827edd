pub mod clients;
pub mod config;
pub mod error;
pub mod mcp;
pub mod routes;
pub mod state;
pub mod tools;

use axum::{routing::get, Extension, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the HTTP router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/mcp", get(routes::mcp::mcp_get).post(routes::mcp::mcp_post))
        .layer(Extension(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
