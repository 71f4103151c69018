use axum::{http::StatusCode, response::Json};
use serde_json::{json, Value};

/// Liveness probe. Does not touch the database or object store.
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}
