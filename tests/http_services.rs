//! Contract tests for the HTTP service clients, against a local mock server.
//!
//! These pin the transient/permanent classification at the HTTP boundary:
//! 429 and 5xx must come back as typed transient errors for the retry policy,
//! while unparseable success responses must be permanent.

use motiva::error::TransientKind;
use motiva::intent::Tone;
use motiva::retry::{RetryConfig, RetryPolicy};
use motiva::services::{
    ContextMap, HttpSpeechSynthesizer, HttpTextGenerator, SpeechSynthesizer, TextGenerator,
};
use motiva::Error;
use std::time::Duration;

fn text_client(base_url: &str) -> HttpTextGenerator {
    HttpTextGenerator::builder()
        .model("test-model")
        .api_key("test-key")
        .base_url(base_url)
        .build()
        .unwrap()
}

fn speech_client(base_url: &str) -> HttpSpeechSynthesizer {
    HttpSpeechSynthesizer::builder()
        .model("test-voice-model")
        .api_key("test-key")
        .base_url(base_url)
        .build()
        .unwrap()
}

#[tokio::test]
async fn text_generator_parses_chat_completion() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"choices":[{"message":{"content":"You have got this. Start now."}}]}"#)
        .create_async()
        .await;

    let client = text_client(&server.url());
    let text = client
        .generate("Morning run", Tone::Energetic, &ContextMap::new())
        .await
        .unwrap();
    assert_eq!(text, "You have got this. Start now.");
    mock.assert_async().await;
}

#[tokio::test]
async fn text_generator_maps_429_to_rate_limited() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(429)
        .with_body("slow down")
        .create_async()
        .await;

    let err = text_client(&server.url())
        .generate("Morning run", Tone::Energetic, &ContextMap::new())
        .await
        .unwrap_err();
    match err {
        Error::Transient { kind, status, .. } => {
            assert_eq!(kind, TransientKind::RateLimited);
            assert_eq!(status, Some(429));
        }
        other => panic!("expected transient error, got {other}"),
    }
}

#[tokio::test]
async fn text_generator_maps_5xx_to_service_unavailable() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(503)
        .create_async()
        .await;

    let err = text_client(&server.url())
        .generate("Morning run", Tone::Gentle, &ContextMap::new())
        .await
        .unwrap_err();
    assert!(err.is_transient());
    assert!(matches!(
        err,
        Error::Transient {
            kind: TransientKind::ServiceUnavailable,
            ..
        }
    ));
}

#[tokio::test]
async fn text_generator_rejects_non_json_success() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body("<html>definitely not json</html>")
        .create_async()
        .await;

    let err = text_client(&server.url())
        .generate("Morning run", Tone::Storyteller, &ContextMap::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MalformedResponse { .. }));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn text_generator_rejects_missing_content() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body(r#"{"choices":[]}"#)
        .create_async()
        .await;

    let err = text_client(&server.url())
        .generate("Morning run", Tone::ToughLove, &ContextMap::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MalformedResponse { .. }));
}

#[tokio::test]
async fn synthesizer_returns_audio_bytes() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/audio/speech")
        .match_header("authorization", "Bearer test-key")
        .with_status(200)
        .with_header("content-type", "audio/mpeg")
        .with_body([0x49u8, 0x44, 0x33, 0x04, 0x00])
        .create_async()
        .await;

    let bytes = speech_client(&server.url())
        .synthesize("You have got this.", "energetic")
        .await
        .unwrap();
    assert_eq!(bytes.as_ref(), &[0x49u8, 0x44, 0x33, 0x04, 0x00]);
    mock.assert_async().await;
}

#[tokio::test]
async fn synthesizer_maps_500_to_transient() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/audio/speech")
        .with_status(500)
        .with_body("synth crashed")
        .create_async()
        .await;

    let err = speech_client(&server.url())
        .synthesize("You have got this.", "gentle")
        .await
        .unwrap_err();
    assert!(err.is_transient());
}

#[tokio::test]
async fn synthesizer_rejects_empty_success_body() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/audio/speech")
        .with_status(200)
        .create_async()
        .await;

    let err = speech_client(&server.url())
        .synthesize("You have got this.", "gentle")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MalformedResponse { .. }));
}

#[tokio::test]
async fn retry_policy_drives_client_to_exhaustion() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(503)
        .expect(3)
        .create_async()
        .await;

    let client = text_client(&server.url());
    let context = ContextMap::new();
    let policy = RetryPolicy::new(
        RetryConfig::new()
            .with_max_attempts(3)
            .with_base_delay(Duration::from_millis(1)),
    );
    let err = policy
        .run("text_generation", || {
            client.generate("Morning run", Tone::Energetic, &context)
        })
        .await
        .unwrap_err();

    assert!(matches!(err, Error::MaxRetriesExceeded { attempts: 3, .. }));
    mock.assert_async().await;
}
