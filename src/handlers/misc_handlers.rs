//! Smoke-test endpoints for the small route groups.

use axum::Json;
use serde_json::{Value, json};

/// GET `/test/ping`
pub async fn test_ping() -> Json<Value> {
    Json(json!({"message": "Ping from EversAPIs!"}))
}

/// GET `/everapply/hello-world`
pub async fn everapply_hello() -> Json<Value> {
    Json(json!({"message": "EverApply is live!"}))
}
