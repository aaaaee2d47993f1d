pub mod interface;
pub mod credentials;
pub mod client;
pub mod factory;

pub use interface::{AudioEncoding, SpeechAudio, SpeechError, SpeechSynthesizer};
pub use client::{GoogleTTSClient, TTSAuth};
pub use factory::TTSFactory;
