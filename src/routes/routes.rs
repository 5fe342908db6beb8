//! Route table for every group the gateway exposes.
//!
//! ## Structure
//! - **Probes & status (mounted at root)**
//!   - `GET /healthz` — liveness
//!   - `GET /readyz`  — readiness (PocketBase connectivity)
//!   - `GET /status`  — HTML dependency dashboard
//!
//! - **`/test`, `/everapply`** — smoke-test pings
//!
//! - **`/everspass`** — photo-sharing sessions backed by PocketBase
//!   - `POST   /create-session`
//!   - `GET    /load-session?deviceId=`
//!   - `DELETE /delete-session/{session_id}`
//!   - `GET    /check-deviceid-exists/{device_id}`
//!   - `GET    /check-photosession-exists/{session_id}`
//!   - `GET    /sessions/{session_id}/photos` / `POST` to upload
//!   - `DELETE /photos/{photo_id}`
//!
//! - **`/eversvoz`** — pronunciation API; `/transcribe` and `/synthesize`
//!   require the `transcribe-api-key` header, `/ping` does not
//!
//! - **`/portfolio-contact-form`** — `POST /` form submission

use crate::{
    auth::require_transcribe_api_key,
    handlers::{
        everspass_handlers::{
            check_device_exists, check_photos_exist, create_session, delete_photo, delete_session,
            load_session, session_photos, upload_photo,
        },
        eversvoz_handlers::{ping as eversvoz_ping, synthesize, transcribe},
        health_handlers::{healthz, readyz},
        misc_handlers::{everapply_hello, test_ping},
        portfolio_handlers::handle_form,
        status_handlers::status_page,
    },
    state::AppState,
};
use axum::{
    Router, middleware,
    routing::{delete, get, post},
};

/// Build and return the router for every route group.
///
/// The router carries shared state (`AppState`) to all handlers; the
/// EversVoz API-key middleware is a route layer so it never touches the
/// other groups.
pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        // probes + status (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/status", get(status_page))
        .route("/test/ping", get(test_ping))
        .route("/everapply/hello-world", get(everapply_hello))
        .nest("/everspass", everspass_routes())
        .nest("/eversvoz", eversvoz_routes(state))
        .nest("/portfolio-contact-form", portfolio_routes())
}

fn everspass_routes() -> Router<AppState> {
    Router::new()
        .route("/create-session", post(create_session))
        .route("/load-session", get(load_session))
        .route("/delete-session/{session_id}", delete(delete_session))
        .route("/check-deviceid-exists/{device_id}", get(check_device_exists))
        .route(
            "/check-photosession-exists/{session_id}",
            get(check_photos_exist),
        )
        .route(
            "/sessions/{session_id}/photos",
            get(session_photos).post(upload_photo),
        )
        .route("/photos/{photo_id}", delete(delete_photo))
}

fn eversvoz_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/transcribe", post(transcribe))
        .route("/synthesize", post(synthesize))
        .route_layer(middleware::from_fn_with_state(
            state,
            require_transcribe_api_key,
        ));

    Router::new()
        .route("/ping", get(eversvoz_ping))
        .merge(protected)
}

fn portfolio_routes() -> Router<AppState> {
    Router::new().route("/", post(handle_form))
}
