use crate::{
    config::AppConfig,
    services::{
        chat::ChatClient,
        mailer::{RESEND_BASE_URL, ResendClient},
        pocketbase::PocketBaseClient,
        tts::{GOOGLE_TTS_BASE_URL, TextToSpeechClient},
    },
};

/// Shared application state carried by the router: the parsed configuration
/// plus one client per third-party service.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub pocketbase: PocketBaseClient,
    pub deepseek: ChatClient,
    pub kimi: ChatClient,
    pub tts: TextToSpeechClient,
    pub mailer: ResendClient,
}

impl AppState {
    /// Wire up every service client from the configuration.
    pub fn from_config(config: AppConfig) -> Self {
        let pocketbase = PocketBaseClient::new(
            config.pocketbase_url.clone(),
            config.pocketbase_admin_email.clone(),
            config.pocketbase_admin_password.clone(),
        );
        let deepseek = ChatClient::deepseek(config.deepseek_api_key.clone());
        let kimi = ChatClient::kimi(config.kimi_api_key.clone());
        let tts = TextToSpeechClient::new(GOOGLE_TTS_BASE_URL, config.google_tts_api_key.clone());
        let mailer = ResendClient::new(RESEND_BASE_URL, config.resend_api_key.clone());

        Self {
            config,
            pocketbase,
            deepseek,
            kimi,
            tts,
            mailer,
        }
    }
}
