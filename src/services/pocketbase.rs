//! PocketBase REST client.
//!
//! PocketBase owns every persistent record this gateway touches (sessions,
//! photos, contact-form submissions); this client only issues CRUD calls
//! against `{base}/api/collections/{collection}/records` plus admin auth and
//! the health probe. The admin token is obtained lazily and cached; a 401
//! clears the cache and the request is retried once with a fresh token.

use crate::services::{UpstreamError, UpstreamResult};
use reqwest::{Method, StatusCode, multipart};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;
use std::{sync::Arc, time::Duration};
use tokio::sync::RwLock;
use tracing::{debug, warn};

const SERVICE: &str = "pocketbase";
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Paginated list envelope returned by PocketBase list endpoints.
#[derive(Debug, Deserialize)]
pub struct ListResult<T> {
    pub page: u32,
    #[serde(rename = "perPage")]
    pub per_page: u32,
    #[serde(rename = "totalItems")]
    pub total_items: u64,
    #[serde(rename = "totalPages")]
    pub total_pages: u32,
    pub items: Vec<T>,
}

/// Outcome of the `/api/health` probe, consumed by the status page.
#[derive(Debug, Clone)]
pub struct HealthCheck {
    pub operational: bool,
    pub response_time_ms: Option<u64>,
    pub error: Option<String>,
}

#[derive(Clone)]
pub struct PocketBaseClient {
    http: reqwest::Client,
    base_url: String,
    admin_email: String,
    admin_password: String,
    token: Arc<RwLock<Option<String>>>,
}

#[derive(Deserialize)]
struct AuthResponse {
    token: String,
}

impl PocketBaseClient {
    pub fn new(base_url: impl Into<String>, admin_email: String, admin_password: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            admin_email,
            admin_password,
            token: Arc::new(RwLock::new(None)),
        }
    }

    /// Build the public download URL for a stored file.
    pub fn file_url(&self, collection: &str, record_id: &str, filename: &str) -> String {
        format!(
            "{}/api/files/{}/{}/{}",
            self.base_url, collection, record_id, filename
        )
    }

    /// `GET /api/health` with a 5s timeout, measuring round-trip time.
    pub async fn health(&self) -> HealthCheck {
        let url = format!("{}/api/health", self.base_url);
        let start = std::time::Instant::now();
        match self.http.get(&url).timeout(HEALTH_TIMEOUT).send().await {
            Ok(resp) => {
                let elapsed_ms = start.elapsed().as_millis() as u64;
                if resp.status().is_success() {
                    HealthCheck {
                        operational: true,
                        response_time_ms: Some(elapsed_ms),
                        error: None,
                    }
                } else {
                    HealthCheck {
                        operational: false,
                        response_time_ms: Some(elapsed_ms),
                        error: Some(format!("HTTP {}", resp.status().as_u16())),
                    }
                }
            }
            Err(err) if err.is_timeout() => HealthCheck {
                operational: false,
                response_time_ms: None,
                error: Some("Timeout after 5s".into()),
            },
            Err(err) => HealthCheck {
                operational: false,
                response_time_ms: None,
                error: Some(err.to_string()),
            },
        }
    }

    /// Create a record from a JSON body.
    pub async fn create_record<T: DeserializeOwned>(
        &self,
        collection: &str,
        body: &Value,
    ) -> UpstreamResult<T> {
        let url = self.records_url(collection);
        self.authed_json(Method::POST, &url, Some(body), &[]).await
    }

    /// Create a record carrying a file upload alongside plain fields.
    ///
    /// PocketBase accepts file fields only via multipart/form-data, so the
    /// caller provides the already-built form. Multipart bodies are not
    /// replayable, so there is no 401 retry here; the token is refreshed
    /// up front instead.
    pub async fn create_record_multipart<T: DeserializeOwned>(
        &self,
        collection: &str,
        form: multipart::Form,
    ) -> UpstreamResult<T> {
        let token = self.token(true).await?;
        let url = self.records_url(collection);
        let resp = self
            .http
            .post(&url)
            .header("Authorization", token)
            .multipart(form)
            .send()
            .await?;
        Self::parse_json(resp).await
    }

    /// Fetch a single record by id.
    pub async fn get_record<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
    ) -> UpstreamResult<T> {
        let url = format!("{}/{}", self.records_url(collection), id);
        self.authed_json(Method::GET, &url, None, &[]).await
    }

    /// Patch selected fields of a record.
    pub async fn update_record<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
        body: &Value,
    ) -> UpstreamResult<T> {
        let url = format!("{}/{}", self.records_url(collection), id);
        self.authed_json(Method::PATCH, &url, Some(body), &[]).await
    }

    /// Delete a record by id.
    pub async fn delete_record(&self, collection: &str, id: &str) -> UpstreamResult<()> {
        let url = format!("{}/{}", self.records_url(collection), id);
        self.authed_send(Method::DELETE, &url, None, &[]).await?;
        Ok(())
    }

    /// Fetch one page of records, optionally filtered and sorted.
    pub async fn list_records<T: DeserializeOwned>(
        &self,
        collection: &str,
        page: u32,
        per_page: u32,
        filter: Option<&str>,
        sort: Option<&str>,
    ) -> UpstreamResult<ListResult<T>> {
        let url = self.records_url(collection);
        let mut query: Vec<(&str, String)> = vec![
            ("page", page.to_string()),
            ("perPage", per_page.to_string()),
        ];
        if let Some(filter) = filter {
            query.push(("filter", filter.to_string()));
        }
        if let Some(sort) = sort {
            query.push(("sort", sort.to_string()));
        }
        self.authed_json(Method::GET, &url, None, &query).await
    }

    /// Fetch every record matching `filter`, paging 200 at a time.
    pub async fn full_list<T: DeserializeOwned>(
        &self,
        collection: &str,
        filter: Option<&str>,
    ) -> UpstreamResult<Vec<T>> {
        let mut items = Vec::new();
        let mut page = 1;
        loop {
            let batch: ListResult<T> = self.list_records(collection, page, 200, filter, None).await?;
            let total_pages = batch.total_pages;
            items.extend(batch.items);
            if page >= total_pages || total_pages == 0 {
                break;
            }
            page += 1;
        }
        Ok(items)
    }

    fn records_url(&self, collection: &str) -> String {
        format!("{}/api/collections/{}/records", self.base_url, collection)
    }

    /// Return the cached admin token, authenticating if needed.
    async fn token(&self, force_refresh: bool) -> UpstreamResult<String> {
        if !force_refresh {
            if let Some(token) = self.token.read().await.clone() {
                return Ok(token);
            }
        }

        debug!("no cached PocketBase admin token, authenticating");
        let url = format!("{}/api/admins/auth-with-password", self.base_url);
        let resp = self
            .http
            .post(&url)
            .json(&serde_json::json!({
                "identity": self.admin_email,
                "password": self.admin_password,
            }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = Self::error_message(resp).await;
            return Err(UpstreamError::Auth(format!(
                "HTTP {}: {}",
                status.as_u16(),
                message
            )));
        }

        let auth: AuthResponse = resp.json().await?;
        *self.token.write().await = Some(auth.token.clone());
        Ok(auth.token)
    }

    async fn authed_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        query: &[(&str, String)],
    ) -> UpstreamResult<T> {
        let resp = self.authed_send(method, url, body, query).await?;
        Self::parse_json(resp).await
    }

    /// Issue an authenticated request, retrying once on 401 with a fresh
    /// token (admin tokens expire server-side).
    async fn authed_send(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        query: &[(&str, String)],
    ) -> UpstreamResult<reqwest::Response> {
        let mut token = self.token(false).await?;
        for attempt in 0..2 {
            let mut req = self
                .http
                .request(method.clone(), url)
                .header("Authorization", &token);
            if !query.is_empty() {
                req = req.query(query);
            }
            if let Some(body) = body {
                req = req.json(body);
            }
            let resp = req.send().await?;

            if resp.status() == StatusCode::UNAUTHORIZED && attempt == 0 {
                warn!("PocketBase token rejected, re-authenticating");
                token = self.token(true).await?;
                continue;
            }
            if !resp.status().is_success() {
                let status = resp.status().as_u16();
                let message = Self::error_message(resp).await;
                return Err(UpstreamError::Api {
                    service: SERVICE,
                    status,
                    message,
                });
            }
            return Ok(resp);
        }
        unreachable!("authed_send retries are bounded")
    }

    async fn parse_json<T: DeserializeOwned>(resp: reqwest::Response) -> UpstreamResult<T> {
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = Self::error_message(resp).await;
            return Err(UpstreamError::Api {
                service: SERVICE,
                status,
                message,
            });
        }
        Ok(resp.json().await?)
    }

    /// Pull the `message` field out of PocketBase's error body when present.
    async fn error_message(resp: reqwest::Response) -> String {
        match resp.json::<Value>().await {
            Ok(body) => body
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| body.to_string()),
            Err(_) => "upstream error".into(),
        }
    }
}
