//! Out-of-band result submission (HTTP).
//!
//! Accepts a JSON body shaped as a result envelope of a recognized kind,
//! forwards it to the upstream peer, and acknowledges with the correlation
//! id. A body of any other kind fails with a client error.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use judgewire_core::error::JudgewireError;
use judgewire_core::protocol::{kinds, Envelope};

use crate::app_state::AppState;

pub async fn submit_result(State(app): State<AppState>, Json(env): Json<Envelope>) -> Response {
    if !kinds::is_result_kind(&env.kind) {
        let err = JudgewireError::BadRequest(format!("not a result kind: {}", env.kind));
        return error_response(StatusCode::BAD_REQUEST, &err);
    }

    match app.upstream().send(&env).await {
        Ok(()) => {
            app.metrics()
                .results_submitted
                .inc(&[("kind", env.kind.as_str())]);
            Json(json!({ "ok": true, "request_id": env.correlation_id })).into_response()
        }
        Err(e) => error_response(StatusCode::BAD_GATEWAY, &e),
    }
}

fn error_response(status: StatusCode, err: &JudgewireError) -> Response {
    (
        status,
        Json(json!({ "code": err.client_code().as_str(), "msg": err.to_string() })),
    )
        .into_response()
}
