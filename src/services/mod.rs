//! Clients for the third-party services this gateway fronts.
//!
//! Every module here is a thin REST wrapper built on `reqwest`: PocketBase
//! for record storage, OpenAI-compatible chat completions (DeepSeek, Kimi),
//! Google Cloud Text-to-Speech, and Resend for transactional email.

pub mod chat;
pub mod mailer;
pub mod pocketbase;
pub mod prompts;
pub mod tts;

use thiserror::Error;

/// Failures talking to a third-party service.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The service answered with a non-success HTTP status.
    #[error("{service} returned HTTP {status}: {message}")]
    Api {
        service: &'static str,
        status: u16,
        message: String,
    },
    /// The service answered 2xx but the body did not have the expected shape.
    #[error("{service} response is missing `{field}`")]
    MalformedResponse {
        service: &'static str,
        field: &'static str,
    },
    /// Admin credentials were rejected or not configured.
    #[error("pocketbase admin authentication failed: {0}")]
    Auth(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("decoding {service} audio payload: {source}")]
    AudioDecode {
        service: &'static str,
        #[source]
        source: base64::DecodeError,
    },
}

pub type UpstreamResult<T> = Result<T, UpstreamError>;
