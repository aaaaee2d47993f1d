use base64::{engine::general_purpose, Engine as _};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::{debug, info, warn};

use super::compress::{compress, CompressedImage, CompressionOptions};
use super::error::ClientError;
use super::normalize::{from_response, TranslationResult};
use crate::dto::{ErrorBody, SpeechRequestBody, SpeechResponseBody, TranslateResponse};
use crate::language::Language;

/// Result of one submission: what was uploaded and what came back
#[derive(Debug, Clone)]
pub struct Submission {
    pub image: CompressedImage,
    pub result: TranslationResult,
}

/// HTTP client for the translation and speech relays
#[derive(Debug, Clone)]
pub struct UploadClient {
    http: Client,
    base_url: String,
    compression: CompressionOptions,
}

impl UploadClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            compression: CompressionOptions::default(),
        }
    }

    pub fn with_compression(mut self, compression: CompressionOptions) -> Self {
        self.compression = compression;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn submit_file(
        &self,
        path: &Path,
        language: Language,
    ) -> Result<Submission, ClientError> {
        let bytes = tokio::fs::read(path).await?;
        self.submit_image(bytes, language).await
    }

    /// Compress, upload and normalize. Nothing is sent if compression fails.
    pub async fn submit_image(
        &self,
        image: Vec<u8>,
        language: Language,
    ) -> Result<Submission, ClientError> {
        let compressed = compress(image, self.compression).await.map_err(|e| {
            warn!("Error during image compression: {}", e);
            ClientError::from(e)
        })?;
        debug!(
            "Compressed {}x{} ({} bytes) to {}x{} ({} bytes)",
            compressed.original_width,
            compressed.original_height,
            compressed.original_bytes,
            compressed.width,
            compressed.height,
            compressed.bytes.len()
        );

        let part = Part::bytes(compressed.bytes.clone())
            .file_name("upload.jpg")
            .mime_str("image/jpeg")?;
        let form = Form::new()
            .part("file", part)
            .text("language", language.code().to_string());

        let response = self
            .http
            .post(self.url("/api/translate-image"))
            .multipart(form)
            .send()
            .await?;
        let payload: TranslateResponse = read_json(response).await?;
        let result = from_response(&payload, language);
        if result.is_empty() {
            return Err(ClientError::InvalidResponse(
                "translation was empty".to_string(),
            ));
        }
        info!("Translation received: {}", result.translated_word);

        Ok(Submission {
            image: compressed,
            result,
        })
    }

    /// Ask the speech relay for MP3 audio of `text`.
    pub async fn request_speech(
        &self,
        text: &str,
        language: Language,
    ) -> Result<Vec<u8>, ClientError> {
        let body = SpeechRequestBody {
            text: text.to_string(),
            language_code: language.code().to_string(),
        };
        let response = self
            .http
            .post(self.url("/api/tts"))
            .json(&body)
            .send()
            .await?;
        let payload: SpeechResponseBody = read_json(response).await?;
        general_purpose::STANDARD
            .decode(payload.audio_base64)
            .map_err(|e| ClientError::InvalidResponse(format!("audio was not base64: {}", e)))
    }
}

/// Decode a success body, or turn `{error}` bodies into [`ClientError::Relay`].
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.error)
            .unwrap_or_else(|_| text.trim().to_string());
        return Err(ClientError::Relay {
            status: status.as_u16(),
            message,
        });
    }
    serde_json::from_str(&text).map_err(|e| ClientError::InvalidResponse(e.to_string()))
}
