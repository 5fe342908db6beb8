//! Resend transactional-email client.

use crate::services::{UpstreamError, UpstreamResult};
use serde::{Deserialize, Serialize};
use tracing::info;

const SERVICE: &str = "resend";
pub const RESEND_BASE_URL: &str = "https://api.resend.com";
pub const DEFAULT_SENDER: &str = "noreply@everscode.com";

#[derive(Clone)]
pub struct ResendClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    html: &'a str,
}

#[derive(Deserialize)]
struct SendEmailResponse {
    id: String,
}

impl ResendClient {
    pub fn new(base_url: impl Into<String>, api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Send an HTML email from the default `noreply` sender; returns the
    /// Resend message id.
    pub async fn send_html(
        &self,
        to: &[String],
        subject: &str,
        html: &str,
    ) -> UpstreamResult<String> {
        let url = format!("{}/emails", self.base_url);
        let body = SendEmailRequest {
            from: DEFAULT_SENDER,
            to,
            subject,
            html,
        };

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_else(|_| "upstream error".into());
            return Err(UpstreamError::Api {
                service: SERVICE,
                status,
                message,
            });
        }

        let parsed: SendEmailResponse = resp.json().await?;
        info!("email sent successfully: {}", parsed.id);
        Ok(parsed.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn posts_the_resend_payload() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/emails")
                .header("Authorization", "Bearer re_key")
                .json_body(json!({
                    "from": "noreply@everscode.com",
                    "to": ["evergarcia621@outlook.com"],
                    "subject": "New Contact Form Submission",
                    "html": "<p>hi</p>"
                }));
            then.status(200).json_body(json!({"id": "email-1"}));
        });

        let mailer = ResendClient::new(server.base_url(), "re_key".into());
        let id = mailer
            .send_html(
                &["evergarcia621@outlook.com".to_string()],
                "New Contact Form Submission",
                "<p>hi</p>",
            )
            .await
            .unwrap();
        assert_eq!(id, "email-1");
        mock.assert();
    }

    #[tokio::test]
    async fn failures_surface_the_upstream_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/emails");
            then.status(422).body("invalid recipient");
        });

        let mailer = ResendClient::new(server.base_url(), "re_key".into());
        let err = mailer
            .send_html(&["x".to_string()], "s", "<p></p>")
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Api { status: 422, .. }));
    }
}
