mod status;

pub use status::{StatusResponse, SERVICE_NAME};

use crate::state::AppState;
use crate::ws;
use axum::{middleware, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // WebSocket endpoint, guarded by the configured frontend origin
    let signaling = Router::new()
        .route("/ws", get(ws::handler::ws_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            ws::origin::origin_guard,
        ));

    Router::new()
        // Health check
        .route("/health", get(|| async { "OK" }))
        .route("/api/status", get(status::status))
        .merge(signaling)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
