//! Axum route table.
//!
//! `/v1/ws` for observer attachment, `/v1/result` for out-of-band result
//! submission, plus the ops endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use crate::{app_state::AppState, ops, transport};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/ws", get(transport::observer::ws_upgrade))
        .route("/v1/result", post(transport::submit::submit_result))
        .route("/healthz", get(ops::healthz))
        .route("/readyz", get(ops::readyz))
        .route("/metrics", get(ops::metrics))
        .with_state(state)
}
