use super::compress::CompressionError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Could not read image: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image compression failed: {0}")]
    Compression(#[from] CompressionError),
    #[error("Could not reach the relay: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Relay returned {status}: {message}")]
    Relay { status: u16, message: String },
    #[error("Relay response was not understood: {0}")]
    InvalidResponse(String),
    #[error("Speech playback failed: {0}")]
    Speech(String),
}
