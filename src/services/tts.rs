//! Google Cloud Text-to-Speech client (`text:synthesize` REST surface).
//!
//! The response carries the MP3 payload base64-encoded in `audioContent`;
//! this client decodes it so callers deal in plain bytes.

use crate::services::{UpstreamError, UpstreamResult};
use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};

const SERVICE: &str = "google-tts";
pub const GOOGLE_TTS_BASE_URL: &str = "https://texttospeech.googleapis.com";

/// Voice gender accepted by the synthesis API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SsmlGender {
    Neutral,
    Male,
    Female,
}

impl SsmlGender {
    /// Case-insensitive parse; anything unrecognized falls back to NEUTRAL.
    pub fn parse_or_neutral(value: &str) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "MALE" => SsmlGender::Male,
            "FEMALE" => SsmlGender::Female,
            _ => SsmlGender::Neutral,
        }
    }
}

/// Tunable knobs forwarded to the synthesis request.
#[derive(Debug, Clone)]
pub struct SpeechParams {
    pub language_code: String,
    pub gender: SsmlGender,
    pub speaking_rate: f32,
    pub pitch: f32,
    pub volume_gain_db: f32,
}

#[derive(Clone)]
pub struct TextToSpeechClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Serialize)]
struct SynthesizeRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceSelection<'a>,
    #[serde(rename = "audioConfig")]
    audio_config: AudioConfig,
}

#[derive(Serialize)]
struct SynthesisInput<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct VoiceSelection<'a> {
    #[serde(rename = "languageCode")]
    language_code: &'a str,
    #[serde(rename = "ssmlGender")]
    ssml_gender: SsmlGender,
}

#[derive(Serialize)]
struct AudioConfig {
    #[serde(rename = "audioEncoding")]
    audio_encoding: &'static str,
    #[serde(rename = "speakingRate")]
    speaking_rate: f32,
    pitch: f32,
    #[serde(rename = "volumeGainDb")]
    volume_gain_db: f32,
}

#[derive(Deserialize)]
struct SynthesizeResponse {
    #[serde(rename = "audioContent")]
    audio_content: Option<String>,
}

impl TextToSpeechClient {
    pub fn new(base_url: impl Into<String>, api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Synthesize `text` to MP3 bytes.
    pub async fn synthesize(&self, text: &str, params: &SpeechParams) -> UpstreamResult<Vec<u8>> {
        let url = format!("{}/v1/text:synthesize", self.base_url);
        let body = SynthesizeRequest {
            input: SynthesisInput { text },
            voice: VoiceSelection {
                language_code: &params.language_code,
                ssml_gender: params.gender,
            },
            audio_config: AudioConfig {
                audio_encoding: "MP3",
                speaking_rate: params.speaking_rate,
                pitch: params.pitch,
                volume_gain_db: params.volume_gain_db,
            },
        };

        let resp = self
            .http
            .post(&url)
            .query(&[("key", &self.api_key)])
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

        let parsed: SynthesizeResponse = resp.json().await?;
        let encoded = parsed
            .audio_content
            .ok_or(UpstreamError::MalformedResponse {
                service: SERVICE,
                field: "audioContent",
            })?;
        general_purpose::STANDARD
            .decode(encoded)
            .map_err(|source| UpstreamError::AudioDecode {
                service: SERVICE,
                source,
            })
    }
}
