//! Axum router wiring.

use axum::{routing::get, Router};

use crate::{app_state::AppState, transport};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/node-types", get(transport::http::list_node_types))
        .route("/v1/node-types/:name", get(transport::http::get_node))
        .route("/metrics", get(transport::http::metrics))
        .with_state(state)
}
