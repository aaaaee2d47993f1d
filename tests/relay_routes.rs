mod common;

use base64::{engine::general_purpose, Engine as _};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{sample_png, MockSpeech, MockTranslator, TestApp};
use lingolens::language::Language;

const KOREAN_ANSWER: &str = "Translated word: 사과\nRomanization: sagwa\nIn English: apple";

fn upload_form(image: Vec<u8>, language: &str) -> Form {
    Form::new()
        .part("file", Part::bytes(image).file_name("apple.png"))
        .text("language", language.to_string())
}

#[tokio::test]
async fn health_check_reports_ok() {
    let app = TestApp::spawn(MockTranslator::answering("x"), MockSpeech::returning(b"x")).await;
    let body: Value = app
        .client
        .get(app.url("/api/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn translate_relays_model_answer_verbatim() {
    let translator = MockTranslator::answering(KOREAN_ANSWER);
    let app = TestApp::spawn(translator.clone(), MockSpeech::returning(b"x")).await;

    let resp = app
        .client
        .post(app.url("/api/translate-image"))
        .multipart(upload_form(sample_png(1600, 1200), "ko"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "translation": KOREAN_ANSWER }));

    let calls = translator.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    let (image, language) = &calls[0];
    assert_eq!(*language, Language::Ko);
    assert_eq!(image.mime, "image/jpeg");
    let forwarded = image::load_from_memory(&image.bytes).unwrap();
    assert_eq!((forwarded.width(), forwarded.height()), (800, 600));
}

#[tokio::test]
async fn translate_without_file_is_a_client_error() {
    let translator = MockTranslator::answering(KOREAN_ANSWER);
    let app = TestApp::spawn(translator.clone(), MockSpeech::returning(b"x")).await;

    let resp = app
        .client
        .post(app.url("/api/translate-image"))
        .multipart(Form::new().text("language", "ko"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "error": "No file uploaded" }));
    assert_eq!(translator.call_count(), 0);
}

#[tokio::test]
async fn translate_rejects_unknown_or_missing_language() {
    let translator = MockTranslator::answering(KOREAN_ANSWER);
    let app = TestApp::spawn(translator.clone(), MockSpeech::returning(b"x")).await;

    let resp = app
        .client
        .post(app.url("/api/translate-image"))
        .multipart(upload_form(sample_png(10, 10), "fr"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app
        .client
        .post(app.url("/api/translate-image"))
        .multipart(Form::new().part("file", Part::bytes(sample_png(10, 10))))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Missing language");
    assert_eq!(translator.call_count(), 0);
}

#[tokio::test]
async fn non_multipart_body_is_a_parse_error() {
    let app = TestApp::spawn(MockTranslator::answering("x"), MockSpeech::returning(b"x")).await;

    let resp = app
        .client
        .post(app.url("/api/translate-image"))
        .json(&json!({ "file": "nope" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Error parsing form" }));
}

#[tokio::test]
async fn model_failure_is_a_server_error() {
    let app = TestApp::spawn(MockTranslator::failing(), MockSpeech::returning(b"x")).await;

    let resp = app
        .client
        .post(app.url("/api/translate-image"))
        .multipart(upload_form(sample_png(10, 10), "en"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "error": "File processing error" }));
}

#[tokio::test]
async fn wrong_method_is_405_with_json_error() {
    let app = TestApp::spawn(MockTranslator::answering("x"), MockSpeech::returning(b"x")).await;

    for path in ["/api/translate-image", "/api/tts"] {
        let resp = app.client.get(app.url(path)).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED, "{path}");
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body, json!({ "error": "Method not allowed" }));
    }
}

#[tokio::test]
async fn tts_returns_base64_audio_for_mapped_locale() {
    let speech = MockSpeech::returning(b"ID3 fake mp3");
    let app = TestApp::spawn(MockTranslator::answering("x"), speech.clone()).await;

    let resp = app
        .client
        .post(app.url("/api/tts"))
        .json(&json!({ "text": "  사과 apple ", "languageCode": "ko" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    let audio = general_purpose::STANDARD
        .decode(body["audioBase64"].as_str().unwrap())
        .unwrap();
    assert_eq!(audio, b"ID3 fake mp3");

    let calls = speech.calls.lock().unwrap();
    assert_eq!(calls.as_slice(), &[("사과 apple".to_string(), "ko-KR".to_string())]);
}

#[tokio::test]
async fn tts_passes_full_locales_through() {
    let speech = MockSpeech::returning(b"x");
    let app = TestApp::spawn(MockTranslator::answering("x"), speech.clone()).await;

    let resp = app
        .client
        .post(app.url("/api/tts"))
        .json(&json!({ "text": "apple", "languageCode": "en-GB" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(speech.calls.lock().unwrap()[0].1, "en-GB");
}

#[tokio::test]
async fn tts_validates_input() {
    let speech = MockSpeech::returning(b"x");
    let app = TestApp::spawn(MockTranslator::answering("x"), speech.clone()).await;

    for body in [
        json!({ "text": "   ", "languageCode": "ko" }),
        json!({ "text": "apple", "languageCode": "klingon" }),
        json!({ "words": "apple" }),
    ] {
        let resp = app
            .client
            .post(app.url("/api/tts"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{body}");
        let error: Value = resp.json().await.unwrap();
        assert!(error["error"].is_string());
    }
    assert!(speech.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn tts_provider_failure_is_generic() {
    let app = TestApp::spawn(MockTranslator::answering("x"), MockSpeech::failing()).await;

    let resp = app
        .client
        .post(app.url("/api/tts"))
        .json(&json!({ "text": "apple", "languageCode": "en" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Text-to-Speech failed" }));
}
