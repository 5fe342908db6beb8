//! Shared-secret auth for the EversVoz endpoints.
//!
//! Clients must send the configured secret in the `transcribe-api-key`
//! header; anything else is a 401. Applied as a route layer so the public
//! ping endpoint stays open.

use crate::{errors::AppError, state::AppState};
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

pub const API_KEY_HEADER: &str = "transcribe-api-key";

pub async fn require_transcribe_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let expected = state.config.transcribe_api_key.as_str();
    let presented = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    // An unset key disables the endpoints rather than opening them.
    match presented {
        Some(key) if !expected.is_empty() && key == expected => Ok(next.run(request).await),
        _ => Err(AppError::new(StatusCode::UNAUTHORIZED, "Unauthorized")),
    }
}
