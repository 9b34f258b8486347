pub mod error;
pub mod routes;

use crate::state::ServiceState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Build the API router
pub fn router(state: ServiceState) -> Router {
    Router::new()
        // Health and metrics endpoints
        .route("/healthz", get(routes::healthz))
        .route("/readyz", get(routes::readyz))
        .route("/metrics", get(routes::metrics))
        // Plugin endpoints
        .route("/v1/plugins", get(routes::list_plugins))
        .route("/v1/plugins/:id", get(routes::get_plugin))
        .route("/v1/plugins/:id/frames", post(routes::submit_frame))
        // Plate endpoints
        .route("/v1/plates/recognize", post(routes::recognize_plate))
        .route("/v1/plates/read", post(routes::read_plate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
