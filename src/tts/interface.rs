use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::credentials::CredentialError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioEncoding {
    Mp3,
}

/// Synthesized audio returned by a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechAudio {
    pub audio: Vec<u8>,
    pub encoding: AudioEncoding,
}

#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("No Text-to-Speech credentials configured")]
    MissingCredentials,
    #[error("Credential error: {0}")]
    Credentials(#[from] CredentialError),
    #[error("Text-to-Speech request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Text-to-Speech API returned {status}: {body}")]
    Provider { status: u16, body: String },
    #[error("Text-to-Speech API returned undecodable audio: {0}")]
    InvalidAudio(#[from] base64::DecodeError),
}

/// Managed text-to-speech provider.
///
/// `locale` is already resolved (`ko-KR`); voices are gender neutral and
/// output is always MP3.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, locale: &str) -> Result<SpeechAudio, SpeechError>;
}
