//! Upload client: compress, submit, normalize, speak.

pub mod compress;
pub mod error;
pub mod normalize;
pub mod render;
pub mod speech;
pub mod upload;

pub use compress::{compress_image, CompressedImage, CompressionError, CompressionOptions};
pub use error::ClientError;
pub use normalize::{normalize, TranslationResult};
pub use render::{render_lines, Preview};
pub use speech::{
    AudioSink, CommandPlayer, CommandSpeech, LocalSpeech, SaveToDir, Speaker, SpeechOutcome,
};
pub use upload::{Submission, UploadClient};
