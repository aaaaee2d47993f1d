use axum::{
    extract::{
        multipart::MultipartRejection, rejection::JsonRejection, DefaultBodyLimit, Multipart,
        State,
    },
    http::HeaderValue,
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose, Engine as _};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::dto::{SpeechRequestBody, SpeechResponseBody, TranslateResponse};
use crate::error::RelayError;
use crate::language::{resolve_tts_locale, Language};
use crate::state::AppState;
use crate::vision::prepare_image;

pub fn build_router(state: AppState) -> Router {
    let server_config = &state.config.server;
    let cors = cors_layer(&server_config.cors_origins);
    let max_upload_bytes = server_config.max_upload_bytes;

    Router::new()
        // Health check
        .route("/api/health", get(health_check))
        // Relays
        .route(
            "/api/translate-image",
            post(translate_image).fallback(method_not_allowed),
        )
        .route("/api/tts", post(text_to_speech).fallback(method_not_allowed))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn method_not_allowed() -> RelayError {
    RelayError::MethodNotAllowed
}

/// Image and language pulled out of the upload form
struct TranslationUpload {
    image: Vec<u8>,
    language: Language,
}

async fn read_upload(multipart: &mut Multipart) -> Result<TranslationUpload, RelayError> {
    let mut image: Option<Vec<u8>> = None;
    let mut language: Option<String> = None;

    loop {
        let field = multipart.next_field().await.map_err(|e| {
            warn!("Error parsing form: {}", e);
            RelayError::UpstreamParse("Error parsing form".to_string())
        })?;
        let Some(field) = field else { break };

        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") if image.is_none() => {
                debug!(
                    "Received file field: name={:?}, content_type={:?}",
                    field.file_name(),
                    field.content_type()
                );
                let bytes = field.bytes().await.map_err(|e| {
                    warn!("Error reading uploaded file: {}", e);
                    RelayError::UpstreamParse("Error parsing form".to_string())
                })?;
                image = Some(bytes.to_vec());
            }
            Some("language") => {
                let text = field.text().await.map_err(|e| {
                    warn!("Error reading language field: {}", e);
                    RelayError::UpstreamParse("Error parsing form".to_string())
                })?;
                language = Some(text);
            }
            other => debug!("Ignoring form field {:?}", other),
        }
    }

    let image = image
        .filter(|bytes| !bytes.is_empty())
        .ok_or_else(|| RelayError::ClientInput("No file uploaded".to_string()))?;
    let language = language
        .ok_or_else(|| RelayError::ClientInput("Missing language".to_string()))?
        .parse::<Language>()
        .map_err(|e| RelayError::ClientInput(e.to_string()))?;

    Ok(TranslationUpload { image, language })
}

async fn translate_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<TranslateResponse>, RelayError> {
    let span = info_span!("translate_image", request_id = %Uuid::new_v4());

    async move {
        let mut multipart = multipart.map_err(|e| {
            warn!("Rejected upload: {}", e);
            RelayError::UpstreamParse("Error parsing form".to_string())
        })?;
        let upload = read_upload(&mut multipart).await?;
        info!(
            "File received ({} bytes, language={}), starting processing",
            upload.image.len(),
            upload.language
        );

        let max_width = state.config.vision.image_max_width;
        let quality = state.config.vision.jpeg_quality;
        let image = upload.image;
        let prepared = tokio::task::spawn_blocking(move || prepare_image(&image, max_width, quality))
            .await
            .map_err(|e| {
                warn!("Image preparation task failed: {}", e);
                RelayError::Provider("File processing error".to_string())
            })?;

        let translation = state.translator.translate(&prepared, upload.language).await?;
        info!("Vision model response received");

        Ok(Json(TranslateResponse {
            translation,
            ..TranslateResponse::default()
        }))
    }
    .instrument(span)
    .await
}

async fn text_to_speech(
    State(state): State<AppState>,
    payload: Result<Json<SpeechRequestBody>, JsonRejection>,
) -> Result<Json<SpeechResponseBody>, RelayError> {
    let span = info_span!("text_to_speech", request_id = %Uuid::new_v4());

    async move {
        let Json(request) = payload.map_err(|e| {
            warn!("Rejected TTS request: {}", e);
            RelayError::ClientInput("Invalid request body".to_string())
        })?;

        let text = request.text.trim();
        if text.is_empty() {
            return Err(RelayError::ClientInput("Text is required".to_string()));
        }
        let locale = resolve_tts_locale(&request.language_code)
            .map_err(|e| RelayError::ClientInput(e.to_string()))?;

        let speech = state.speech.synthesize(text, &locale).await?;
        info!("Synthesized {} bytes of audio for {}", speech.audio.len(), locale);

        Ok(Json(SpeechResponseBody {
            audio_base64: general_purpose::STANDARD.encode(&speech.audio),
        }))
    }
    .instrument(span)
    .await
}
