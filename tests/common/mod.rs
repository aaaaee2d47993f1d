#![allow(dead_code)]

use async_trait::async_trait;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

use lingolens::config::Config;
use lingolens::language::Language;
use lingolens::tts::{AudioEncoding, SpeechAudio, SpeechError, SpeechSynthesizer};
use lingolens::vision::{PreparedImage, VisionError, VisionTranslator};
use lingolens::{build_router, AppState};

/// Vision model stand-in that answers with a fixed string
pub struct MockTranslator {
    answer: Option<String>,
    pub calls: Mutex<Vec<(PreparedImage, Language)>>,
}

impl MockTranslator {
    pub fn answering(answer: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: Some(answer.to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            answer: None,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl VisionTranslator for MockTranslator {
    async fn translate(
        &self,
        image: &PreparedImage,
        language: Language,
    ) -> Result<String, VisionError> {
        self.calls.lock().unwrap().push((image.clone(), language));
        self.answer.clone().ok_or(VisionError::EmptyAnswer)
    }
}

/// Speech provider stand-in returning fixed bytes
pub struct MockSpeech {
    audio: Option<Vec<u8>>,
    pub calls: Mutex<Vec<(String, String)>>,
}

impl MockSpeech {
    pub fn returning(audio: &[u8]) -> Arc<Self> {
        Arc::new(Self {
            audio: Some(audio.to_vec()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            audio: None,
            calls: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSpeech {
    async fn synthesize(&self, text: &str, locale: &str) -> Result<SpeechAudio, SpeechError> {
        self.calls
            .lock()
            .unwrap()
            .push((text.to_string(), locale.to_string()));
        match &self.audio {
            Some(audio) => Ok(SpeechAudio {
                audio: audio.clone(),
                encoding: AudioEncoding::Mp3,
            }),
            None => Err(SpeechError::Provider {
                status: 403,
                body: "PERMISSION_DENIED".to_string(),
            }),
        }
    }
}

/// A relay server on a random local port.
pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn(
        translator: Arc<dyn VisionTranslator>,
        speech: Arc<dyn SpeechSynthesizer>,
    ) -> Self {
        let state = AppState::with_providers(Config::default(), translator, speech);
        let app = build_router(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            client: reqwest::Client::new(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

pub fn sample_png(width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]));
    let mut out = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .unwrap();
    out
}
