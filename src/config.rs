use anyhow::{Context, Result};
use clap::Parser;
use std::env;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,

    /// Base URL of the PocketBase instance, e.g. `http://127.0.0.1:8090`.
    pub pocketbase_url: String,
    pub pocketbase_admin_email: String,
    pub pocketbase_admin_password: String,

    pub deepseek_api_key: String,
    pub kimi_api_key: String,
    pub google_tts_api_key: String,
    pub resend_api_key: String,

    /// Shared secret clients must present in the `transcribe-api-key` header.
    pub transcribe_api_key: String,

    /// Where contact-form notification emails are delivered.
    pub contact_recipient: String,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "EversAPIs gateway")]
pub struct Args {
    /// Host to bind to (overrides EVERSAPIS_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides EVERSAPIS_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// PocketBase base URL (overrides POCKETBASE_API)
    #[arg(long)]
    pub pocketbase_url: Option<String>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        let args = Args::parse();
        Self::from_env(args)
    }

    fn from_env(args: Args) -> Result<Self> {
        let env_host = env::var("EVERSAPIS_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match env::var("EVERSAPIS_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing EVERSAPIS_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 5001,
            Err(err) => return Err(err).context("reading EVERSAPIS_PORT"),
        };
        let env_pocketbase =
            env::var("POCKETBASE_API").unwrap_or_else(|_| "http://127.0.0.1:8090".into());

        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            pocketbase_url: args.pocketbase_url.unwrap_or(env_pocketbase),
            pocketbase_admin_email: optional_env("POCKETBASE_SUPERUSER_EMAIL"),
            pocketbase_admin_password: optional_env("POCKETBASE_SUPERUSER_PASSWORD"),
            deepseek_api_key: optional_env("DEEPSEEK_API_KEY"),
            kimi_api_key: optional_env("KIMI_API_KEY"),
            google_tts_api_key: optional_env("GOOGLE_TTS_API_KEY"),
            resend_api_key: optional_env("RESEND_API"),
            transcribe_api_key: optional_env("TRANSCRIBE_API_KEY"),
            contact_recipient: env::var("CONTACT_FORM_RECIPIENT")
                .unwrap_or_else(|_| "evergarcia621@outlook.com".into()),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Missing secrets leave the corresponding service unconfigured rather than
/// aborting startup; the status page reports them as unavailable.
fn optional_env(name: &str) -> String {
    env::var(name).unwrap_or_default().trim().to_string()
}
