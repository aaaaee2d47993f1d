use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::credentials::ServiceAccountTokenSource;
use super::interface::{AudioEncoding, SpeechAudio, SpeechError, SpeechSynthesizer};

/// How requests to the speech API are authorized
pub enum TTSAuth {
    ApiKey(String),
    ServiceAccount(ServiceAccountTokenSource),
}

/// Google Cloud Text-to-Speech over REST
pub struct GoogleTTSClient {
    client: Client,
    base_url: String,
    auth: TTSAuth,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceSelection<'a>,
    audio_config: AudioConfig,
}

#[derive(Debug, Serialize)]
struct SynthesisInput<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection<'a> {
    language_code: &'a str,
    ssml_gender: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: String,
}

impl GoogleTTSClient {
    pub fn new(client: Client, base_url: &str, auth: TTSAuth) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTTSClient {
    async fn synthesize(&self, text: &str, locale: &str) -> Result<SpeechAudio, SpeechError> {
        let body = SynthesizeRequest {
            input: SynthesisInput { text },
            voice: VoiceSelection {
                language_code: locale,
                ssml_gender: "NEUTRAL",
            },
            audio_config: AudioConfig {
                audio_encoding: "MP3",
            },
        };

        debug!("Sending TTS request: locale={}, chars={}", locale, text.chars().count());

        let url = format!("{}/v1/text:synthesize", self.base_url);
        let request = match &self.auth {
            TTSAuth::ApiKey(key) => self.client.post(&url).query(&[("key", key.as_str())]),
            TTSAuth::ServiceAccount(tokens) => {
                let token = tokens.access_token().await?;
                self.client.post(&url).bearer_auth(token)
            }
        };

        let response = request.json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("TTS synthesis failed with status {}", status);
            return Err(SpeechError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let synthesized: SynthesizeResponse = response.json().await?;
        let audio = general_purpose::STANDARD.decode(synthesized.audio_content)?;
        debug!("TTS synthesis successful: {} bytes", audio.len());

        Ok(SpeechAudio {
            audio,
            encoding: AudioEncoding::Mp3,
        })
    }
}
