//! HTTP handlers for the EversPass photo-sharing sessions.
//!
//! Sessions and photos live in the PocketBase collections
//! `everspass_sessions` / `everspass_photos`; every handler here is a thin
//! validation layer in front of those records. Photo create/delete also
//! maintain the denormalized `photo_count` / `total_bytes` totals on the
//! parent session.

use crate::{
    errors::AppError,
    models::{
        format_pb_timestamp,
        session::{PassPhoto, PassSession},
    },
    services::{UpstreamError, pocketbase::ListResult},
    state::AppState,
};
use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{error, warn};
use uuid::Uuid;

const SESSIONS: &str = "everspass_sessions";
const PHOTOS: &str = "everspass_photos";

/// How long a freshly created session stays valid.
const SESSION_TTL_HOURS: i64 = 48;

#[derive(Debug, Deserialize)]
pub struct CreateSessionReq {
    pub device_id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoadSessionQuery {
    #[serde(rename = "deviceId")]
    pub device_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PhotoPageQuery {
    pub page: Option<u32>,
    #[serde(rename = "perPage")]
    pub per_page: Option<u32>,
}

/// Photo list item: the raw record plus its resolved download URL.
#[derive(Debug, Serialize)]
pub struct PhotoItem {
    pub id: String,
    pub url: String,
    pub created: String,
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct PhotoPage {
    pub page: u32,
    #[serde(rename = "perPage")]
    pub per_page: u32,
    #[serde(rename = "totalPages")]
    pub total_pages: u32,
    #[serde(rename = "totalItems")]
    pub total_items: u64,
    pub items: Vec<PhotoItem>,
}

/// POST `/everspass/create-session` — create a 48h session for a device.
pub async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionReq>,
) -> Result<Json<PassSession>, AppError> {
    let (device_id, name) = match (req.device_id, req.name) {
        (Some(d), Some(n)) if !d.is_empty() && !n.is_empty() => (d, n),
        _ => return Err(AppError::bad_request("Missing device_id or name")),
    };

    let expires_at = format_pb_timestamp(Utc::now() + Duration::hours(SESSION_TTL_HOURS));
    let record: PassSession = state
        .pocketbase
        .create_record(
            SESSIONS,
            &json!({
                "device_id": device_id,
                "name": name,
                "expires_at": expires_at,
                "status": "active",
                "photo_count": 0,
                "total_bytes": 0,
            }),
        )
        .await?;

    Ok(Json(record))
}

/// GET `/everspass/load-session?deviceId=` — first page of sessions for a
/// device, newest PocketBase default ordering.
pub async fn load_session(
    State(state): State<AppState>,
    Query(q): Query<LoadSessionQuery>,
) -> Result<Json<Vec<PassSession>>, AppError> {
    let device_id = q
        .device_id
        .filter(|d| !d.is_empty())
        .ok_or_else(|| AppError::bad_request("The 'deviceId' query parameter is required."))?;

    let filter = format!("device_id = \"{}\"", device_id);
    let result: ListResult<PassSession> = state
        .pocketbase
        .list_records(SESSIONS, 1, 10, Some(&filter), None)
        .await?;

    Ok(Json(result.items))
}

/// DELETE `/everspass/delete-session/{session_id}` — remove a session and
/// every photo attached to it.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let filter = format!("session_id = \"{}\"", session_id);
    let photos: Vec<PassPhoto> = state.pocketbase.full_list(PHOTOS, Some(&filter)).await?;

    let mut deleted_photos = 0usize;
    for photo in &photos {
        match state.pocketbase.delete_record(PHOTOS, &photo.id).await {
            Ok(()) => deleted_photos += 1,
            // Keep going; the session delete below is what matters.
            Err(err) => error!("error deleting photo {}: {}", photo.id, err),
        }
    }

    state
        .pocketbase
        .delete_record(SESSIONS, &session_id)
        .await
        .map_err(session_not_found)?;

    Ok(Json(json!({
        "message": format!(
            "Session with ID '{}' and {} associated photo(s) deleted successfully.",
            session_id, deleted_photos
        )
    })))
}

/// GET `/everspass/check-deviceid-exists/{device_id}`
pub async fn check_device_exists(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let filter = format!("device_id = \"{}\"", device_id);
    let result: ListResult<PassSession> = state
        .pocketbase
        .list_records(SESSIONS, 1, 1, Some(&filter), None)
        .await?;

    Ok(Json(json!({
        "exists": result.total_items > 0,
        "device_id": device_id,
    })))
}

/// GET `/everspass/check-photosession-exists/{session_id}`
pub async fn check_photos_exist(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let filter = format!("session_id = \"{}\"", session_id);
    let result: ListResult<PassPhoto> = state
        .pocketbase
        .list_records(PHOTOS, 1, 1, Some(&filter), None)
        .await?;

    Ok(Json(json!({
        "exists": result.total_items > 0,
        "session_id": session_id,
    })))
}

/// GET `/everspass/sessions/{session_id}/photos` — paginated photo listing,
/// newest first, with resolved file URLs.
pub async fn session_photos(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(q): Query<PhotoPageQuery>,
) -> Result<Json<PhotoPage>, AppError> {
    let page = q.page.unwrap_or(1);
    let per_page = q.per_page.unwrap_or(50);

    let filter = format!("session_id = \"{}\"", session_id);
    let result: ListResult<PassPhoto> = state
        .pocketbase
        .list_records(PHOTOS, page, per_page, Some(&filter), Some("-created"))
        .await?;

    let items = result
        .items
        .into_iter()
        .map(|photo| PhotoItem {
            url: state.pocketbase.file_url(PHOTOS, &photo.id, &photo.image_url),
            id: photo.id,
            created: photo.created,
            session_id: photo.session_id,
        })
        .collect();

    Ok(Json(PhotoPage {
        page: result.page,
        per_page: result.per_page,
        total_pages: result.total_pages,
        total_items: result.total_items,
        items,
    }))
}

/// POST `/everspass/sessions/{session_id}/photos` — multipart photo upload.
///
/// Creates the photo record, then bumps the session's denormalized counters.
pub async fn upload_photo(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let session: PassSession = state
        .pocketbase
        .get_record(SESSIONS, &session_id)
        .await
        .map_err(session_not_found)?;

    let mut image: Option<(String, String, bytes::Bytes)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::bad_request(err.to_string()))?
    {
        if field.name() == Some("image") {
            let filename = field
                .file_name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("{}.jpg", Uuid::new_v4()));
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|err| AppError::bad_request(err.to_string()))?;
            image = Some((filename, content_type, data));
        }
    }

    let (filename, content_type, data) =
        image.ok_or_else(|| AppError::bad_request("An 'image' file part is required."))?;
    if data.is_empty() {
        return Err(AppError::bad_request("The uploaded image is empty."));
    }
    let size_bytes = data.len() as i64;

    let part = reqwest::multipart::Part::bytes(data.to_vec())
        .file_name(filename)
        .mime_str(&content_type)
        .map_err(|err| AppError::bad_request(err.to_string()))?;
    let form = reqwest::multipart::Form::new()
        .text("session_id", session_id.clone())
        .text("size_bytes", size_bytes.to_string())
        .part("image_url", part);

    let photo: PassPhoto = state.pocketbase.create_record_multipart(PHOTOS, form).await?;

    adjust_session_counters(&state, &session, 1, size_bytes).await;

    let url = state.pocketbase.file_url(PHOTOS, &photo.id, &photo.image_url);
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "id": photo.id,
            "url": url,
            "created": photo.created,
            "session_id": photo.session_id,
            "size_bytes": photo.size_bytes,
        })),
    ))
}

/// DELETE `/everspass/photos/{photo_id}` — remove one photo and release its
/// share of the session counters.
pub async fn delete_photo(
    State(state): State<AppState>,
    Path(photo_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let photo: PassPhoto = state
        .pocketbase
        .get_record(PHOTOS, &photo_id)
        .await
        .map_err(|err| match err {
            UpstreamError::Api { status: 404, .. } => AppError::not_found("Photo not found."),
            other => other.into(),
        })?;

    state.pocketbase.delete_record(PHOTOS, &photo_id).await?;

    match state
        .pocketbase
        .get_record::<PassSession>(SESSIONS, &photo.session_id)
        .await
    {
        Ok(session) => adjust_session_counters(&state, &session, -1, -photo.size_bytes).await,
        // The photo may outlive its session; nothing left to decrement.
        Err(err) => warn!(
            "session {} not updated after photo delete: {}",
            photo.session_id, err
        ),
    }

    Ok(Json(json!({
        "message": format!("Photo with ID '{}' deleted successfully.", photo_id)
    })))
}

/// Apply a delta to the session's denormalized totals, clamping at zero.
///
/// A failed counter write is logged, not surfaced: the photo operation
/// itself already succeeded.
async fn adjust_session_counters(
    state: &AppState,
    session: &PassSession,
    photo_delta: i64,
    bytes_delta: i64,
) {
    let photo_count = (session.photo_count + photo_delta).max(0);
    let total_bytes = (session.total_bytes + bytes_delta).max(0);

    let patch = json!({
        "photo_count": photo_count,
        "total_bytes": total_bytes,
    });
    if let Err(err) = state
        .pocketbase
        .update_record::<PassSession>(SESSIONS, &session.id, &patch)
        .await
    {
        warn!("failed to update counters on session {}: {}", session.id, err);
    }
}

fn session_not_found(err: UpstreamError) -> AppError {
    match err {
        UpstreamError::Api { status: 404, .. } => AppError::not_found("Session not found."),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::FromRequest;
    use httpmock::Method::PATCH;
    use httpmock::prelude::*;

    fn test_state(pb_url: &str) -> AppState {
        let config = crate::config::AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            pocketbase_url: pb_url.into(),
            pocketbase_admin_email: "admin@test".into(),
            pocketbase_admin_password: "secret".into(),
            deepseek_api_key: String::new(),
            kimi_api_key: String::new(),
            google_tts_api_key: String::new(),
            resend_api_key: String::new(),
            transcribe_api_key: String::new(),
            contact_recipient: "ops@test".into(),
        };
        AppState::from_config(config)
    }

    fn mock_auth(server: &MockServer) {
        server.mock(|when, then| {
            when.method(POST).path("/api/admins/auth-with-password");
            then.status(200).json_body(json!({"token": "tok"}));
        });
    }

    fn session_body(id: &str, photo_count: i64, total_bytes: i64) -> serde_json::Value {
        json!({
            "id": id,
            "created": "2025-01-01 10:00:00.000Z",
            "updated": "2025-01-01 10:00:00.000Z",
            "device_id": "dev-1",
            "name": "trip",
            "expires_at": "2025-01-03 10:00:00.000Z",
            "status": "active",
            "photo_count": photo_count,
            "total_bytes": total_bytes,
        })
    }

    #[tokio::test]
    async fn create_session_requires_both_fields() {
        let state = test_state("http://unused.invalid");
        let err = create_session(
            State(state),
            Json(CreateSessionReq {
                device_id: Some("dev-1".into()),
                name: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Missing device_id or name");
    }

    #[tokio::test]
    async fn create_session_writes_a_48h_expiry() {
        let server = MockServer::start();
        mock_auth(&server);
        let create = server.mock(|when, then| {
            when.method(POST)
                .path("/api/collections/everspass_sessions/records")
                .json_body_partial(r#"{"device_id": "dev-1", "name": "trip", "status": "active"}"#);
            then.status(200).json_body(session_body("s1", 0, 0));
        });

        let state = test_state(&server.base_url());
        let Json(record) = create_session(
            State(state),
            Json(CreateSessionReq {
                device_id: Some("dev-1".into()),
                name: Some("trip".into()),
            }),
        )
        .await
        .unwrap();

        assert_eq!(record.id, "s1");
        assert_eq!(record.status, "active");
        create.assert();
    }

    #[tokio::test]
    async fn load_session_requires_device_id() {
        let state = test_state("http://unused.invalid");
        let err = load_session(State(state), Query(LoadSessionQuery { device_id: None }))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "The 'deviceId' query parameter is required.");
    }

    #[tokio::test]
    async fn delete_session_removes_photos_first() {
        let server = MockServer::start();
        mock_auth(&server);
        server.mock(|when, then| {
            when.method(GET)
                .path("/api/collections/everspass_photos/records")
                .query_param("filter", "session_id = \"s1\"");
            then.status(200).json_body(json!({
                "page": 1, "perPage": 200, "totalItems": 2, "totalPages": 1,
                "items": [
                    {"id": "p1", "created": "2025-01-01 10:00:00.000Z", "session_id": "s1",
                     "image_url": "a.jpg", "size_bytes": 10},
                    {"id": "p2", "created": "2025-01-01 10:05:00.000Z", "session_id": "s1",
                     "image_url": "b.jpg", "size_bytes": 20}
                ]
            }));
        });
        let del_p1 = server.mock(|when, then| {
            when.method(DELETE).path("/api/collections/everspass_photos/records/p1");
            then.status(204);
        });
        let del_p2 = server.mock(|when, then| {
            when.method(DELETE).path("/api/collections/everspass_photos/records/p2");
            then.status(204);
        });
        let del_session = server.mock(|when, then| {
            when.method(DELETE).path("/api/collections/everspass_sessions/records/s1");
            then.status(204);
        });

        let state = test_state(&server.base_url());
        let Json(body) = delete_session(State(state), Path("s1".into())).await.unwrap();

        assert_eq!(
            body["message"],
            "Session with ID 's1' and 2 associated photo(s) deleted successfully."
        );
        del_p1.assert();
        del_p2.assert();
        del_session.assert();
    }

    #[tokio::test]
    async fn deleting_an_unknown_session_is_404() {
        let server = MockServer::start();
        mock_auth(&server);
        server.mock(|when, then| {
            when.method(GET).path("/api/collections/everspass_photos/records");
            then.status(200).json_body(json!({
                "page": 1, "perPage": 200, "totalItems": 0, "totalPages": 0, "items": []
            }));
        });
        server.mock(|when, then| {
            when.method(DELETE).path("/api/collections/everspass_sessions/records/nope");
            then.status(404).json_body(json!({"message": "missing"}));
        });

        let state = test_state(&server.base_url());
        let err = delete_session(State(state), Path("nope".into())).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "Session not found.");
    }

    #[tokio::test]
    async fn check_device_exists_reports_presence() {
        let server = MockServer::start();
        mock_auth(&server);
        server.mock(|when, then| {
            when.method(GET)
                .path("/api/collections/everspass_sessions/records")
                .query_param("filter", "device_id = \"dev-1\"");
            then.status(200).json_body(json!({
                "page": 1, "perPage": 1, "totalItems": 3, "totalPages": 3,
                "items": [session_body("s1", 0, 0)]
            }));
        });

        let state = test_state(&server.base_url());
        let Json(body) = check_device_exists(State(state), Path("dev-1".into()))
            .await
            .unwrap();
        assert_eq!(body["exists"], true);
        assert_eq!(body["device_id"], "dev-1");
    }

    #[tokio::test]
    async fn session_photos_resolve_file_urls() {
        let server = MockServer::start();
        mock_auth(&server);
        server.mock(|when, then| {
            when.method(GET)
                .path("/api/collections/everspass_photos/records")
                .query_param("sort", "-created")
                .query_param("perPage", "50");
            then.status(200).json_body(json!({
                "page": 1, "perPage": 50, "totalItems": 1, "totalPages": 1,
                "items": [{"id": "p1", "created": "2025-01-01 10:00:00.000Z",
                           "session_id": "s1", "image_url": "img.jpg", "size_bytes": 5}]
            }));
        });

        let state = test_state(&server.base_url());
        let Json(page) = session_photos(
            State(state),
            Path("s1".into()),
            Query(PhotoPageQuery {
                page: None,
                per_page: None,
            }),
        )
        .await
        .unwrap();

        assert_eq!(page.total_items, 1);
        assert!(page.items[0].url.ends_with("/api/files/everspass_photos/p1/img.jpg"));
    }

    #[tokio::test]
    async fn delete_photo_decrements_and_clamps_counters() {
        let server = MockServer::start();
        mock_auth(&server);
        server.mock(|when, then| {
            when.method(GET).path("/api/collections/everspass_photos/records/p1");
            then.status(200).json_body(json!({
                "id": "p1", "created": "2025-01-01 10:00:00.000Z", "session_id": "s1",
                "image_url": "a.jpg", "size_bytes": 500
            }));
        });
        server.mock(|when, then| {
            when.method(DELETE).path("/api/collections/everspass_photos/records/p1");
            then.status(204);
        });
        // Stale counters already at zero: the decrement must clamp, not go
        // negative.
        server.mock(|when, then| {
            when.method(GET).path("/api/collections/everspass_sessions/records/s1");
            then.status(200).json_body(session_body("s1", 0, 0));
        });
        let patch = server.mock(|when, then| {
            when.method(PATCH)
                .path("/api/collections/everspass_sessions/records/s1")
                .json_body(json!({"photo_count": 0, "total_bytes": 0}));
            then.status(200).json_body(session_body("s1", 0, 0));
        });

        let state = test_state(&server.base_url());
        let Json(body) = delete_photo(State(state), Path("p1".into())).await.unwrap();
        assert_eq!(body["message"], "Photo with ID 'p1' deleted successfully.");
        patch.assert();
    }

    #[tokio::test]
    async fn upload_creates_photo_and_bumps_counters() {
        let server = MockServer::start();
        mock_auth(&server);
        server.mock(|when, then| {
            when.method(GET).path("/api/collections/everspass_sessions/records/s1");
            then.status(200).json_body(session_body("s1", 2, 1000));
        });
        let create = server.mock(|when, then| {
            when.method(POST)
                .path("/api/collections/everspass_photos/records")
                .header_exists("content-type");
            then.status(200).json_body(json!({
                "id": "p9", "created": "2025-01-01 10:00:00.000Z", "session_id": "s1",
                "image_url": "pic.jpg", "size_bytes": 8
            }));
        });
        let patch = server.mock(|when, then| {
            when.method(PATCH)
                .path("/api/collections/everspass_sessions/records/s1")
                .json_body(json!({"photo_count": 3, "total_bytes": 1008}));
            then.status(200).json_body(session_body("s1", 3, 1008));
        });

        let body = concat!(
            "--xyz\r\n",
            "Content-Disposition: form-data; name=\"image\"; filename=\"pic.jpg\"\r\n",
            "Content-Type: image/jpeg\r\n",
            "\r\n",
            "jpegdata\r\n",
            "--xyz--\r\n",
        );
        let req = axum::http::Request::builder()
            .header("content-type", "multipart/form-data; boundary=xyz")
            .body(axum::body::Body::from(body))
            .unwrap();
        let multipart = Multipart::from_request(req, &()).await.unwrap();

        let state = test_state(&server.base_url());
        let (status, Json(out)) = upload_photo(State(state), Path("s1".into()), multipart)
            .await
            .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(out["id"], "p9");
        assert!(out["url"]
            .as_str()
            .unwrap()
            .ends_with("/api/files/everspass_photos/p9/pic.jpg"));
        create.assert();
        patch.assert();
    }

    #[tokio::test]
    async fn upload_requires_an_existing_session() {
        let server = MockServer::start();
        mock_auth(&server);
        server.mock(|when, then| {
            when.method(GET).path("/api/collections/everspass_sessions/records/ghost");
            then.status(404).json_body(json!({"message": "missing"}));
        });

        let state = test_state(&server.base_url());
        let body = axum::body::Body::empty();
        let req = axum::http::Request::builder()
            .header("content-type", "multipart/form-data; boundary=xyz")
            .body(body)
            .unwrap();
        let multipart = Multipart::from_request(req, &()).await.unwrap();

        let err = upload_photo(State(state), Path("ghost".into()), multipart)
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
