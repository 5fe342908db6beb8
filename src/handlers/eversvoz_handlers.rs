//! HTTP handlers for the EversVoz pronunciation API.
//!
//! `/transcribe` chains three LLM calls (detect language, then translate or
//! grammar-check, then phonetic explanation); `/synthesize` forwards to
//! Google Text-to-Speech and returns raw MP3. User-facing validation
//! messages are in Spanish, matching the product's audience.

use crate::{
    errors::AppError,
    services::prompts::{self, DetectedLanguage},
    services::tts::{SpeechParams, SsmlGender},
    state::AppState,
};
use axum::{
    Json,
    body::Body,
    extract::State,
    http::{HeaderValue, StatusCode, header},
    response::Response,
};
use serde::{Deserialize, Serialize};

/// Longest accepted input, in characters.
const MAX_LENGTH: usize = 250;

#[derive(Debug, Deserialize)]
pub struct TranscribeRequest {
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TranscribeResponse {
    pub detected_lang: &'static str,
    /// Original input, echoed only when it was Spanish.
    pub user_input: Option<String>,
    pub english_phrase: String,
    pub phonetic_explanation: String,
}

#[derive(Debug, Deserialize)]
pub struct SynthesizeRequest {
    #[serde(default = "default_text")]
    pub text: String,
    #[serde(default = "default_language_code")]
    pub language_code: String,
    #[serde(default = "default_gender")]
    pub gender: String,
    #[serde(default = "default_speaking_rate")]
    pub speaking_rate: f32,
    #[serde(default)]
    pub pitch: f32,
    #[serde(default)]
    pub volume_gain_db: f32,
}

fn default_text() -> String {
    "Hello, world!".into()
}

fn default_language_code() -> String {
    "en-US".into()
}

fn default_gender() -> String {
    "NEUTRAL".into()
}

fn default_speaking_rate() -> f32 {
    1.0
}

/// GET `/eversvoz/ping`
pub async fn ping() -> &'static str {
    "Ping from EversVozAPI!"
}

/// POST `/eversvoz/transcribe`
pub async fn transcribe(
    State(state): State<AppState>,
    Json(req): Json<TranscribeRequest>,
) -> Result<Json<TranscribeResponse>, AppError> {
    let input_text = req.text.ok_or_else(|| {
        AppError::bad_request("Por favor, proporcione 'texto' en el cuerpo de la solicitud")
    })?;

    if input_text.is_empty() || input_text.chars().count() > MAX_LENGTH {
        return Err(AppError::bad_request(format!(
            "El texto excede {} caracteres o está vacío",
            MAX_LENGTH
        )));
    }

    let detected = prompts::detect_language(&state.deepseek, &input_text)
        .await
        .map_err(|err| chain_error("Error detecting language", err))?;

    let (detected_lang, english_phrase, user_input) = match detected {
        DetectedLanguage::Unsupported => {
            return Err(AppError::bad_request(
                "El idioma debe estar en inglés o español",
            ));
        }
        DetectedLanguage::Error => {
            return Err(AppError::internal("Error detecting language"));
        }
        DetectedLanguage::English => {
            let phrase = prompts::grammar_check(&state.deepseek, &input_text)
                .await
                .map_err(|err| chain_error("Error checking grammar", err))?;
            ("english", phrase, None)
        }
        DetectedLanguage::Spanish => {
            let phrase = prompts::translate_to_english(&state.deepseek, &input_text)
                .await
                .map_err(|err| chain_error("Error translating text", err))?;
            ("spanish", phrase, Some(input_text.clone()))
        }
    };

    let phonetic = prompts::phonetic_explanation(&state.kimi, &english_phrase)
        .await
        .map_err(|err| chain_error("Error generating phonetic explanation", err))?;

    Ok(Json(TranscribeResponse {
        detected_lang,
        user_input,
        english_phrase,
        phonetic_explanation: phonetic,
    }))
}

/// POST `/eversvoz/synthesize` — returns MP3 bytes as `audio/mpeg`.
pub async fn synthesize(
    State(state): State<AppState>,
    Json(req): Json<SynthesizeRequest>,
) -> Result<Response, AppError> {
    let params = SpeechParams {
        language_code: req.language_code,
        gender: SsmlGender::parse_or_neutral(&req.gender),
        speaking_rate: req.speaking_rate,
        pitch: req.pitch,
        volume_gain_db: req.volume_gain_db,
    };

    let audio = state.tts.synthesize(&req.text, &params).await?;

    let mut response = Response::new(Body::from(audio));
    *response.status_mut() = StatusCode::OK;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("audio/mpeg"));
    Ok(response)
}

/// Every step of the chain collapses to a 500 with a short English label;
/// the upstream detail goes to the logs only.
fn chain_error(label: &str, err: crate::services::UpstreamError) -> AppError {
    tracing::error!("{}: {}", label, err);
    AppError::internal(label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::chat::ChatClient;
    use crate::services::tts::TextToSpeechClient;
    use httpmock::prelude::*;
    use serde_json::json;

    fn test_state(deepseek_url: &str, kimi_url: &str, tts_url: &str) -> AppState {
        let config = crate::config::AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            pocketbase_url: "http://unused.invalid".into(),
            pocketbase_admin_email: String::new(),
            pocketbase_admin_password: String::new(),
            deepseek_api_key: "dk".into(),
            kimi_api_key: "kk".into(),
            google_tts_api_key: "gk".into(),
            resend_api_key: String::new(),
            transcribe_api_key: "secret".into(),
            contact_recipient: String::new(),
        };
        let mut state = AppState::from_config(config);
        state.deepseek = ChatClient::new(deepseek_url, "dk".into(), "deepseek-chat", "deepseek");
        state.kimi = ChatClient::new(kimi_url, "kk".into(), "moonshot-v1-8k", "kimi");
        state.tts = TextToSpeechClient::new(tts_url, "gk".into());
        state
    }

    fn mock_completion(server: &MockServer, content: &str) {
        let body = json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        });
        server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(body);
        });
    }

    #[tokio::test]
    async fn rejects_missing_and_oversized_text() {
        let state = test_state("http://a.invalid", "http://b.invalid", "http://c.invalid");

        let err = transcribe(State(state.clone()), Json(TranscribeRequest { text: None }))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let long = "x".repeat(MAX_LENGTH + 1);
        let err = transcribe(State(state), Json(TranscribeRequest { text: Some(long) }))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "El texto excede 250 caracteres o está vacío");
    }

    #[tokio::test]
    async fn spanish_input_is_translated_then_explained() {
        let deepseek = MockServer::start();
        let kimi = MockServer::start();

        // One deepseek mock serves both the detection and translation calls.
        let detect_then_translate = deepseek.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(json!({
                "choices": [{"message": {"role": "assistant", "content": "spanish"}}]
            }));
        });
        mock_completion(&kimi, "\"House\" (jaus)\n- La \"h\" suena como \"j\" suave.");

        let state = test_state(&deepseek.base_url(), &kimi.base_url(), "http://c.invalid");
        let Json(resp) = transcribe(
            State(state),
            Json(TranscribeRequest {
                text: Some("casa".into()),
            }),
        )
        .await
        .unwrap();

        assert_eq!(resp.detected_lang, "spanish");
        assert_eq!(resp.user_input.as_deref(), Some("casa"));
        // The shared mock answered "spanish" to the translation call too.
        assert_eq!(resp.english_phrase, "spanish");
        assert!(resp.phonetic_explanation.starts_with("\"House\""));
        detect_then_translate.assert_hits(2);
    }

    #[tokio::test]
    async fn unsupported_language_is_a_spanish_400() {
        let deepseek = MockServer::start();
        mock_completion(&deepseek, "unsupported");

        let state = test_state(&deepseek.base_url(), "http://b.invalid", "http://c.invalid");
        let err = transcribe(
            State(state),
            Json(TranscribeRequest {
                text: Some("bonjour".into()),
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "El idioma debe estar en inglés o español");
    }

    #[tokio::test]
    async fn synthesize_returns_audio_mpeg() {
        let tts = MockServer::start();
        tts.mock(|when, then| {
            when.method(POST).path("/v1/text:synthesize");
            then.status(200).json_body(json!({"audioContent": "bXAz"}));
        });

        let state = test_state("http://a.invalid", "http://b.invalid", &tts.base_url());
        let resp = synthesize(
            State(state),
            Json(SynthesizeRequest {
                text: "Hello".into(),
                language_code: default_language_code(),
                gender: "robot".into(),
                speaking_rate: 1.0,
                pitch: 0.0,
                volume_gain_db: 0.0,
            }),
        )
        .await
        .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "audio/mpeg"
        );
    }

    #[test]
    fn synthesize_request_defaults() {
        let req: SynthesizeRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.text, "Hello, world!");
        assert_eq!(req.language_code, "en-US");
        assert_eq!(req.gender, "NEUTRAL");
        assert_eq!(req.speaking_rate, 1.0);
        assert_eq!(req.pitch, 0.0);
    }
}
