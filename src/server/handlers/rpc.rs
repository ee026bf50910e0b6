//! RPC handler: `POST /api/:method` with a JSON argument object.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use tracing::warn;

use crate::error::{ErrorKind, StarbridgeError};

use super::super::state::AppState;

/// Handle POST /api/:method.
pub async fn call(
    State(state): State<AppState>,
    Path(method): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let args = match body {
        Ok(Json(args)) => args,
        Err(rejection) => {
            warn!(method = %method, error = %rejection.body_text(), "rejected rpc body");
            return error_response(&StarbridgeError::InvalidArgument(rejection.body_text()));
        }
    };
    match state.service.call(&method, &args).await {
        Ok(result) => (
            StatusCode::OK,
            Json(json!({"success": true, "result": result})),
        )
            .into_response(),
        Err(e) => {
            warn!(method = %method, code = e.kind().code(), error = %e, "rpc call failed");
            error_response(&e)
        }
    }
}

pub fn error_response(error: &StarbridgeError) -> Response {
    let status = match error.kind() {
        ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let body = json!({
        "success": false,
        "error": {
            "code": error.kind().code(),
            "kind": error.kind(),
            "message": error.message(),
        }
    });
    (status, Json(body)).into_response()
}
