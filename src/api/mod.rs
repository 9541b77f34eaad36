//! API module for handling HTTP requests and responses

#[cfg(feature = "web")]
pub(crate) mod handlers;
#[cfg(feature = "web")]
pub(crate) mod responses;

#[cfg(feature = "web")]
use axum::{
    routing::{get, post},
    Router,
};
#[cfg(feature = "web")]
use std::sync::Arc;
#[cfg(feature = "web")]
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    services::ServeDir,
    trace::TraceLayer,
};
#[cfg(feature = "web")]
use crate::{models::product::IMAGE_ROUTE, state::AppState};

#[cfg(feature = "web")]
pub use handlers::health_check;
#[cfg(feature = "web")]
pub use responses::{ApiResponse, Health};

#[cfg(feature = "web")]
/// Create the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let images = ServeDir::new(&state.config.image_dir);
    let body_limit = state.config.max_body_bytes;

    Router::new()
        .route("/", get(handlers::index))
        .route("/api/health", get(health_check))
        .route("/api/products", get(handlers::list_products))
        // Email generator
        .route("/api/email", post(handlers::generate_email))
        // Product generator and search
        .route("/api/products/generate", post(handlers::generate_products))
        .route("/api/products/search", post(handlers::search_products))
        .nest_service(IMAGE_ROUTE, images)
        .fallback(handlers::not_found)
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
