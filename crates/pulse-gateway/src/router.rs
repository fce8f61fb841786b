//! Axum router wiring.
//!
//! `/` liveness, `/v1/ws` (and `/socket`) WebSocket upgrade, `/v1/sessions`
//! count snapshot, `/metrics` Prometheus text. CORS allows any origin.

use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};

use crate::{app_state::AppState, routes, transport};

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(state.cfg().cors.methods())
        .allow_headers(Any);

    Router::new()
        .route("/", get(routes::liveness))
        .route("/v1/ws", get(transport::ws::ws_upgrade))
        .route("/socket", get(transport::ws::ws_upgrade))
        .route("/v1/sessions", get(routes::sessions))
        .route("/metrics", get(routes::metrics))
        .layer(cors)
        .with_state(state)
}
