use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Form, Json, Router};
use base64::{engine::general_purpose, Engine as _};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

use lingolens::config::VisionConfig;
use lingolens::language::Language;
use lingolens::tts::credentials::{ServiceAccountKey, ServiceAccountTokenSource};
use lingolens::tts::{GoogleTTSClient, SpeechError, SpeechSynthesizer, TTSAuth};
use lingolens::vision::{OpenAIVision, PreparedImage, VisionError, VisionTranslator};

const TEST_PRIVATE_KEY: &str = include_str!("fixtures/test-service-account.pem");

#[derive(Default)]
struct Recorded {
    headers: Vec<HeaderMap>,
    bodies: Vec<Value>,
    queries: Vec<HashMap<String, String>>,
    token_requests: Vec<HashMap<String, String>>,
}

type Shared = Arc<Mutex<Recorded>>;

async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn jpeg_image() -> PreparedImage {
    PreparedImage {
        bytes: vec![0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3],
        mime: "image/jpeg",
    }
}

async fn fake_chat_completions(
    State(recorded): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        == Some("Bearer test-key");
    {
        let mut recorded = recorded.lock().unwrap();
        recorded.headers.push(headers);
        recorded.bodies.push(body);
    }
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": { "message": "Incorrect API key provided" } })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "Translated word: 사과\nRomanization: sagwa\nIn English: apple"
                }
            }]
        })),
    )
}

async fn vision_backend() -> (String, Shared) {
    let recorded = Shared::default();
    let app = Router::new()
        .route("/v1/chat/completions", post(fake_chat_completions))
        .with_state(recorded.clone());
    (serve(app).await, recorded)
}

fn vision_config(base_url: &str, api_key: &str) -> VisionConfig {
    VisionConfig {
        base_url: format!("{}/v1", base_url),
        api_key: Some(api_key.to_string()),
        ..VisionConfig::default()
    }
}

#[tokio::test]
async fn vision_request_carries_prompt_and_image() {
    let (base_url, recorded) = vision_backend().await;
    let vision = OpenAIVision::new(&vision_config(&base_url, "test-key")).unwrap();

    let answer = vision.translate(&jpeg_image(), Language::Ko).await.unwrap();
    assert_eq!(
        answer,
        "Translated word: 사과\nRomanization: sagwa\nIn English: apple"
    );

    let recorded = recorded.lock().unwrap();
    let body = &recorded.bodies[0];
    assert_eq!(body["model"], "gpt-4-turbo");
    assert_eq!(body["max_tokens"], 100);

    let content = &body["messages"][0]["content"];
    assert!(content[0]["text"].as_str().unwrap().contains("Korean (ko)"));
    let expected_url = format!(
        "data:image/jpeg;base64,{}",
        general_purpose::STANDARD.encode(jpeg_image().bytes)
    );
    assert_eq!(content[1]["image_url"]["url"], expected_url.as_str());
}

#[tokio::test]
async fn vision_api_errors_keep_status() {
    let (base_url, _recorded) = vision_backend().await;
    let vision = OpenAIVision::new(&vision_config(&base_url, "wrong-key")).unwrap();

    let err = vision
        .translate(&jpeg_image(), Language::En)
        .await
        .unwrap_err();
    match err {
        VisionError::Api { status, body } => {
            assert_eq!(status, 401);
            assert!(body.contains("Incorrect API key"));
        }
        other => panic!("expected api error, got {other:?}"),
    }
}

async fn fake_synthesize(
    State(recorded): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    let mut recorded = recorded.lock().unwrap();
    recorded.queries.push(query);
    recorded.headers.push(headers);
    recorded.bodies.push(body);
    Json(json!({ "audioContent": general_purpose::STANDARD.encode(b"ID3 fake mp3") }))
}

async fn fake_token(
    State(recorded): State<Shared>,
    Form(form): Form<HashMap<String, String>>,
) -> Json<Value> {
    recorded.lock().unwrap().token_requests.push(form);
    Json(json!({
        "access_token": "ya29.test-token",
        "expires_in": 3599,
        "token_type": "Bearer"
    }))
}

async fn speech_backend() -> (String, Shared) {
    let recorded = Shared::default();
    let app = Router::new()
        .route("/v1/*action", post(fake_synthesize))
        .route("/token", post(fake_token))
        .with_state(recorded.clone());
    (serve(app).await, recorded)
}

#[tokio::test]
async fn api_key_synthesis() {
    let (base_url, recorded) = speech_backend().await;
    let tts = GoogleTTSClient::new(
        reqwest::Client::new(),
        &base_url,
        TTSAuth::ApiKey("tts-key".to_string()),
    );

    let audio = tts.synthesize("사과 apple", "ko-KR").await.unwrap();
    assert_eq!(audio.audio, b"ID3 fake mp3");

    let recorded = recorded.lock().unwrap();
    assert_eq!(recorded.queries[0].get("key").map(String::as_str), Some("tts-key"));
    assert_eq!(
        recorded.bodies[0],
        json!({
            "input": { "text": "사과 apple" },
            "voice": { "languageCode": "ko-KR", "ssmlGender": "NEUTRAL" },
            "audioConfig": { "audioEncoding": "MP3" }
        })
    );
}

#[tokio::test]
async fn service_account_token_is_reused() {
    let (base_url, recorded) = speech_backend().await;
    let key = ServiceAccountKey::from_json(
        json!({
            "type": "service_account",
            "client_email": "tts@lingolens-test.iam.gserviceaccount.com",
            "private_key": TEST_PRIVATE_KEY,
        })
        .to_string()
        .as_bytes(),
    )
    .unwrap();
    let http = reqwest::Client::new();
    let tokens =
        ServiceAccountTokenSource::new(http.clone(), key, &format!("{}/token", base_url)).unwrap();
    let tts = GoogleTTSClient::new(http, &base_url, TTSAuth::ServiceAccount(tokens));

    tts.synthesize("apple", "en-US").await.unwrap();
    tts.synthesize("manzana", "es-ES").await.unwrap();

    let recorded = recorded.lock().unwrap();
    assert_eq!(recorded.token_requests.len(), 1);
    let grant = &recorded.token_requests[0];
    assert_eq!(
        grant.get("grant_type").map(String::as_str),
        Some("urn:ietf:params:oauth:grant-type:jwt-bearer")
    );
    assert_eq!(grant["assertion"].split('.').count(), 3);

    assert_eq!(recorded.headers.len(), 2);
    for headers in &recorded.headers {
        assert_eq!(headers["authorization"], "Bearer ya29.test-token");
    }
    assert!(recorded.queries.iter().all(|q| !q.contains_key("key")));
}

#[tokio::test]
async fn provider_rejection_is_reported() {
    let app = Router::new().route(
        "/v1/*action",
        post(|| async {
            (
                StatusCode::FORBIDDEN,
                Json(json!({ "error": { "status": "PERMISSION_DENIED" } })),
            )
        }),
    );
    let base_url = serve(app).await;
    let tts = GoogleTTSClient::new(
        reqwest::Client::new(),
        &base_url,
        TTSAuth::ApiKey("tts-key".to_string()),
    );

    let err = tts.synthesize("apple", "en-US").await.unwrap_err();
    assert!(
        matches!(err, SpeechError::Provider { status: 403, .. }),
        "{err:?}"
    );
}
