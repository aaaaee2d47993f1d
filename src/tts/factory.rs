use anyhow::{Context, Result};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::client::{GoogleTTSClient, TTSAuth};
use super::credentials::{resolve_credentials_path, ServiceAccountKey, ServiceAccountTokenSource};
use super::interface::{SpeechError, SpeechSynthesizer};
use crate::config::SpeechConfig;

/// Factory for the speech provider client
pub struct TTSFactory;

impl TTSFactory {
    /// Build the Google TTS client from configuration.
    ///
    /// An API key wins over service account credentials. Base64 credentials
    /// are staged to disk before the key file is read.
    pub async fn create_tts(config: &SpeechConfig) -> Result<Arc<dyn SpeechSynthesizer>> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let auth = Self::resolve_auth(config, &client).await?;
        match &auth {
            TTSAuth::ApiKey(_) => info!("Initializing Google TTS with API key"),
            TTSAuth::ServiceAccount(tokens) => info!(
                "Initializing Google TTS with service account {}",
                tokens.client_email()
            ),
        }

        Ok(Arc::new(GoogleTTSClient::new(client, &config.base_url, auth)))
    }

    async fn resolve_auth(config: &SpeechConfig, client: &Client) -> Result<TTSAuth> {
        if let Some(key) = config.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            return Ok(TTSAuth::ApiKey(key.to_string()));
        }

        let path = resolve_credentials_path(config)
            .await
            .context("staging speech credentials")?
            .ok_or(SpeechError::MissingCredentials)?;

        let key = ServiceAccountKey::load(&path)
            .with_context(|| format!("reading service account key {}", path.display()))?;
        let tokens = ServiceAccountTokenSource::new(client.clone(), key, &config.token_uri)?;
        Ok(TTSAuth::ServiceAccount(tokens))
    }
}
