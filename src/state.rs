use std::sync::Arc;

use crate::config::Config;
use crate::tts::{SpeechSynthesizer, TTSFactory};
use crate::vision::{OpenAIVision, VisionTranslator};

/// Read-only state shared by every relay request
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub translator: Arc<dyn VisionTranslator>,
    pub speech: Arc<dyn SpeechSynthesizer>,
}

impl AppState {
    /// Construct the provider clients. Speech credentials are staged here,
    /// once, before the first request can arrive.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let translator: Arc<dyn VisionTranslator> = Arc::new(OpenAIVision::new(&config.vision)?);
        let speech = TTSFactory::create_tts(&config.speech).await?;
        Ok(Self::with_providers(config, translator, speech))
    }

    pub fn with_providers(
        config: Config,
        translator: Arc<dyn VisionTranslator>,
        speech: Arc<dyn SpeechSynthesizer>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            translator,
            speech,
        }
    }
}
