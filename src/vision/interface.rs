use async_trait::async_trait;

use crate::language::Language;

/// Image payload ready to be sent to a vision model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedImage {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
}

impl PreparedImage {
    /// `data:` URI understood by OpenAI-style `image_url` parts
    pub fn data_uri(&self) -> String {
        use base64::{engine::general_purpose, Engine as _};
        format!(
            "data:{};base64,{}",
            self.mime,
            general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VisionError {
    #[error("Vision API key is not configured")]
    MissingApiKey,
    #[error("Vision request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Vision API returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("Vision API returned no answer")]
    EmptyAnswer,
}

/// A vision-capable language model that names and translates the main
/// subject of an image.
///
/// Implementations return the model's free-text answer verbatim; the
/// three-field structure is interpreted by the client.
#[async_trait]
pub trait VisionTranslator: Send + Sync {
    async fn translate(
        &self,
        image: &PreparedImage,
        language: Language,
    ) -> Result<String, VisionError>;
}
