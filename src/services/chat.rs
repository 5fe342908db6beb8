//! OpenAI-compatible chat-completion client.
//!
//! DeepSeek and Kimi (Moonshot) both expose the `/chat/completions` surface,
//! so one client covers both; only the base URL, key, and model differ.

use crate::services::{UpstreamError, UpstreamResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";
pub const DEEPSEEK_MODEL: &str = "deepseek-chat";
pub const KIMI_BASE_URL: &str = "https://api.moonshot.cn/v1";
pub const KIMI_MODEL: &str = "moonshot-v1-8k";

#[derive(Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    service: &'static str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

impl ChatClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: String,
        model: impl Into<String>,
        service: &'static str,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
            service,
        }
    }

    pub fn deepseek(api_key: String) -> Self {
        Self::new(DEEPSEEK_BASE_URL, api_key, DEEPSEEK_MODEL, "deepseek")
    }

    pub fn kimi(api_key: String) -> Self {
        Self::new(KIMI_BASE_URL, api_key, KIMI_MODEL, "kimi")
    }

    /// Run a single system-prompt completion and return the trimmed content
    /// of the first choice.
    pub async fn complete(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> UpstreamResult<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "system",
                content: prompt,
            }],
            max_tokens,
            temperature,
        };

        debug!("requesting {} completion ({} tokens max)", self.service, max_tokens);
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
                service: self.service,
                status,
                message,
            });
        }

        let parsed: ChatResponse = resp.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(UpstreamError::MalformedResponse {
                service: self.service,
                field: "choices",
            })?;
        Ok(content.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client(server: &MockServer) -> ChatClient {
        ChatClient::new(server.base_url(), "key".into(), "deepseek-chat", "deepseek")
    }

    #[tokio::test]
    async fn returns_trimmed_first_choice() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .header("Authorization", "Bearer key")
                .json_body_partial(r#"{"model": "deepseek-chat", "max_tokens": 50}"#);
            then.status(200).json_body(json!({
                "choices": [{"message": {"role": "assistant", "content": "  english\n"}}]
            }));
        });

        let out = client(&server).complete("detect", 50, 0.2).await.unwrap();
        assert_eq!(out, "english");
    }

    #[tokio::test]
    async fn empty_choices_is_a_malformed_response() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(json!({"choices": []}));
        });

        let err = client(&server).complete("p", 50, 0.2).await.unwrap_err();
        assert!(matches!(
            err,
            UpstreamError::MalformedResponse { field: "choices", .. }
        ));
    }

    #[tokio::test]
    async fn api_errors_carry_the_upstream_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(429).body("rate limited");
        });

        let err = client(&server).complete("p", 50, 0.2).await.unwrap_err();
        match err {
            UpstreamError::Api { status, message, .. } => {
                assert_eq!(status, 429);
                assert_eq!(message, "rate limited");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
