use async_trait::async_trait;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::error::ClientError;
use super::normalize::TranslationResult;
use super::upload::UploadClient;
use crate::language::Language;

/// Plays MP3 audio returned by the speech relay
#[async_trait]
pub trait AudioSink: Send + Sync {
    async fn play(&self, mp3: &[u8]) -> Result<(), ClientError>;
}

/// On-device synthesis used when the speech relay is unavailable
#[async_trait]
pub trait LocalSpeech: Send + Sync {
    async fn speak(&self, text: &str, language: Language) -> Result<(), ClientError>;
}

/// How a speak request ended. Nothing here is an error for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechOutcome {
    Relay,
    Fallback,
    Failed,
    Skipped,
}

/// Best-effort speech for translation results
#[derive(Clone)]
pub struct Speaker {
    client: UploadClient,
    sink: Arc<dyn AudioSink>,
    fallback: Arc<dyn LocalSpeech>,
}

impl Speaker {
    pub fn new(
        client: UploadClient,
        sink: Arc<dyn AudioSink>,
        fallback: Arc<dyn LocalSpeech>,
    ) -> Self {
        Self {
            client,
            sink,
            fallback,
        }
    }

    /// Fire-and-forget: the returned handle may be awaited or dropped.
    pub fn speak(&self, result: &TranslationResult) -> JoinHandle<SpeechOutcome> {
        let speaker = self.clone();
        let text = result.speech_text();
        let language = result.language;
        tokio::spawn(async move { speaker.speak_text(&text, language).await })
    }

    pub async fn speak_text(&self, text: &str, language: Language) -> SpeechOutcome {
        if text.is_empty() {
            return SpeechOutcome::Skipped;
        }

        let relayed = match self.client.request_speech(text, language).await {
            Ok(audio) => self.sink.play(&audio).await,
            Err(e) => Err(e),
        };
        match relayed {
            Ok(()) => {
                debug!("Played relay audio for {:?}", text);
                return SpeechOutcome::Relay;
            }
            Err(e) => warn!("Speech relay unavailable, using on-device speech: {}", e),
        }

        match self.fallback.speak(text, language).await {
            Ok(()) => SpeechOutcome::Fallback,
            Err(e) => {
                warn!("On-device speech failed: {}", e);
                SpeechOutcome::Failed
            }
        }
    }
}

fn split_command(command: &str) -> Result<(String, Vec<String>), ClientError> {
    let mut parts = command.split_whitespace().map(str::to_string);
    let program = parts
        .next()
        .ok_or_else(|| ClientError::Speech("empty command".to_string()))?;
    Ok((program, parts.collect()))
}

async fn run(program: &str, args: &[String]) -> Result<(), ClientError> {
    debug!("Running {} {:?}", program, args);
    let status = Command::new(program)
        .args(args)
        .status()
        .await
        .map_err(|e| ClientError::Speech(format!("{}: {}", program, e)))?;
    if status.success() {
        Ok(())
    } else {
        Err(ClientError::Speech(format!("{} exited with {}", program, status)))
    }
}

/// Writes the MP3 to a temp file and hands it to an external player
/// (`mpg123 -q`, `afplay`, `ffplay -nodisp -autoexit`).
pub struct CommandPlayer {
    program: String,
    args: Vec<String>,
}

impl CommandPlayer {
    pub fn new(command: &str) -> Result<Self, ClientError> {
        let (program, args) = split_command(command)?;
        Ok(Self { program, args })
    }
}

#[async_trait]
impl AudioSink for CommandPlayer {
    async fn play(&self, mp3: &[u8]) -> Result<(), ClientError> {
        let mut file = tempfile::Builder::new()
            .prefix("lingolens-")
            .suffix(".mp3")
            .tempfile()?;
        file.write_all(mp3)?;
        file.flush()?;
        let path = file.into_temp_path();

        let mut args = self.args.clone();
        args.push(path.to_string_lossy().into_owned());
        run(&self.program, &args).await
    }
}

/// Saves each clip into a directory instead of playing it
pub struct SaveToDir {
    dir: PathBuf,
}

impl SaveToDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl AudioSink for SaveToDir {
    async fn play(&self, mp3: &[u8]) -> Result<(), ClientError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self
            .dir
            .join(format!("translation-{}.mp3", uuid::Uuid::new_v4().simple()));
        tokio::fs::write(&path, mp3).await?;
        info!("Saved audio to {}", path.display());
        Ok(())
    }
}

/// Runs a local synthesizer command such as `espeak-ng -v {code} {text}`.
///
/// `{text}`, `{code}` and `{locale}` are substituted per argument; the text
/// is appended when no `{text}` placeholder is given.
pub struct CommandSpeech {
    program: String,
    args: Vec<String>,
}

impl CommandSpeech {
    pub fn new(command: &str) -> Result<Self, ClientError> {
        let (program, args) = split_command(command)?;
        Ok(Self { program, args })
    }

    fn render_args(&self, text: &str, language: Language) -> Vec<String> {
        let mut has_text = false;
        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|arg| {
                has_text |= arg.contains("{text}");
                arg.replace("{text}", text)
                    .replace("{code}", language.code())
                    .replace("{locale}", language.tts_locale())
            })
            .collect();
        if !has_text {
            args.push(text.to_string());
        }
        args
    }
}

#[async_trait]
impl LocalSpeech for CommandSpeech {
    async fn speak(&self, text: &str, language: Language) -> Result<(), ClientError> {
        let args = self.render_args(text, language);
        run(&self.program, &args).await
    }
}
