use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use crate::dto::ErrorBody;
use crate::tts::SpeechError;
use crate::vision::VisionError;

/// Failures surfaced at the relay boundary.
///
/// The message carried by each variant is what the caller sees; upstream
/// detail is logged when the error is converted.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("{0}")]
    ClientInput(String),
    #[error("{0}")]
    UpstreamParse(String),
    #[error("{0}")]
    Provider(String),
    #[error("Method not allowed")]
    MethodNotAllowed,
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::ClientInput(_) => StatusCode::BAD_REQUEST,
            RelayError::UpstreamParse(_) | RelayError::Provider(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            RelayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<VisionError> for RelayError {
    fn from(err: VisionError) -> Self {
        error!("Vision model call failed: {}", err);
        RelayError::Provider("File processing error".to_string())
    }
}

impl From<SpeechError> for RelayError {
    fn from(err: SpeechError) -> Self {
        error!("Text-to-Speech call failed: {}", err);
        RelayError::Provider("Text-to-Speech failed".to_string())
    }
}
