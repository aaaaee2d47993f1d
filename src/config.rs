use serde::{Deserialize, Serialize};
use anyhow::Result;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub vision: VisionConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

/// OpenAI-compatible vision model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionConfig {
    #[serde(default = "default_vision_base_url")]
    pub base_url: String,
    pub api_key: Option<String>,
    #[serde(default = "default_vision_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_image_max_width")]
    pub image_max_width: u32,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Google Cloud Text-to-Speech settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    #[serde(default = "default_speech_base_url")]
    pub base_url: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    pub api_key: Option<String>,
    pub credentials_path: Option<String>,
    pub credentials_base64: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_vision_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_vision_model() -> String {
    "gpt-4-turbo".to_string()
}

fn default_max_tokens() -> u32 {
    100
}

fn default_image_max_width() -> u32 {
    800
}

fn default_jpeg_quality() -> u8 {
    80
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_speech_base_url() -> String {
    "https://texttospeech.googleapis.com".to_string()
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

impl Config {
    /// Layered load: `config/default`, `config/local`, then `LINGOLENS__*` env vars.
    pub fn load() -> Result<Self> {
        let mut config = Self::from_sources(environment())?;
        config.apply_provider_env();
        Ok(config)
    }

    fn from_sources(env: config::Environment) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(env)
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Fill provider credentials from the variables the SDKs conventionally read.
    fn apply_provider_env(&mut self) {
        fill_from_env(&mut self.vision.api_key, "OPENAI_API_KEY");
        fill_from_env(&mut self.speech.api_key, "GOOGLE_TTS_API_KEY");
        fill_from_env(&mut self.speech.credentials_path, "GOOGLE_APPLICATION_CREDENTIALS");
        fill_from_env(&mut self.speech.credentials_base64, "GOOGLE_CREDENTIALS_BASE64");
    }
}

/// `LINGOLENS__SERVER__CORS_ORIGINS` takes a comma separated list.
fn environment() -> config::Environment {
    config::Environment::default()
        .prefix("LINGOLENS")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("server.cors_origins")
}

fn fill_from_env(slot: &mut Option<String>, var: &str) {
    if slot.as_deref().map_or(true, |v| v.trim().is_empty()) {
        *slot = std::env::var(var).ok().filter(|v| !v.trim().is_empty());
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
            cors_origins: Vec::new(),
        }
    }
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            base_url: default_vision_base_url(),
            api_key: None,
            model: default_vision_model(),
            max_tokens: default_max_tokens(),
            image_max_width: default_image_max_width(),
            jpeg_quality: default_jpeg_quality(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            base_url: default_speech_base_url(),
            token_uri: default_token_uri(),
            api_key: None,
            credentials_path: None,
            credentials_base64: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}
