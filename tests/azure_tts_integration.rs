//! Azure speech synthesizer against a mocked Azure Speech endpoint.

use std::sync::Arc;

use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use quickcards::core::rate_limit::{QueueError, RateLimitConfig, RateLimitedQueue};
use quickcards::core::tts::{AzureTTS, AzureTTSConfig, SpeechSynthesizer, TTSError};
use quickcards::utils::ReqManager;

const SYNTHESIS_PATH: &str = "/cognitiveservices/v1";

fn synthesizer(server: &MockServer, audio_dir: &TempDir) -> AzureTTS {
    let config = AzureTTSConfig {
        subscription_key: "test-key".to_string(),
        region: "eastus".to_string(),
        endpoint: Some(format!("{}{SYNTHESIS_PATH}", server.uri())),
        audio_dir: audio_dir.path().to_path_buf(),
        ..Default::default()
    };
    AzureTTS::new(config, Arc::new(ReqManager::new(2).unwrap())).unwrap()
}

#[tokio::test]
async fn test_synthesize_writes_mp3_named_by_card_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SYNTHESIS_PATH))
        .and(header("Ocp-Apim-Subscription-Key", "test-key"))
        .and(header("Content-Type", "application/ssml+xml"))
        .and(header(
            "X-Microsoft-OutputFormat",
            "audio-24khz-48kbitrate-mono-mp3",
        ))
        .and(header("User-Agent", "quick-cards-app"))
        .and(body_string_contains("name='es-MX-DaliaNeural'"))
        .and(body_string_contains("xml:lang='es-MX'"))
        .and(body_string_contains("Gato.  El gato duerme."))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xF3, 0x44, 0xC4]))
        .expect(1)
        .mount(&server)
        .await;

    let audio_dir = TempDir::new().unwrap();
    let tts = synthesizer(&server, &audio_dir);

    let path = tts
        .synthesize("Gato.<br><br>El gato duerme.", "card-1", "Spanish")
        .await
        .unwrap();

    assert_eq!(path, audio_dir.path().join("card-1.mp3"));
    assert_eq!(std::fs::read(&path).unwrap(), vec![0xFF, 0xF3, 0x44, 0xC4]);
}

#[tokio::test]
async fn test_unknown_language_falls_back_to_english_voice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SYNTHESIS_PATH))
        .and(body_string_contains("name='en-US-JennyNeural'"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1, 2, 3]))
        .expect(1)
        .mount(&server)
        .await;

    let audio_dir = TempDir::new().unwrap();
    let tts = synthesizer(&server, &audio_dir);

    assert!(tts.synthesize("Kissa", "card-2", "Finnish").await.is_ok());
}

#[tokio::test]
async fn test_429_maps_to_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SYNTHESIS_PATH))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "1"))
        .mount(&server)
        .await;

    let audio_dir = TempDir::new().unwrap();
    let tts = synthesizer(&server, &audio_dir);

    let err = tts.synthesize("Hola", "card-3", "Spanish").await.unwrap_err();
    assert!(matches!(err, TTSError::RateLimited(_)));
    assert!(!audio_dir.path().join("card-3.mp3").exists());
}

#[tokio::test]
async fn test_provider_error_keeps_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SYNTHESIS_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
        .mount(&server)
        .await;

    let audio_dir = TempDir::new().unwrap();
    let tts = synthesizer(&server, &audio_dir);

    match tts.synthesize("Hola", "card-4", "Spanish").await {
        Err(TTSError::ProviderError { status, message }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "invalid key");
        }
        other => panic!("expected provider error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_audio_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SYNTHESIS_PATH))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let audio_dir = TempDir::new().unwrap();
    let tts = synthesizer(&server, &audio_dir);

    let err = tts.synthesize("Hola", "card-5", "Spanish").await.unwrap_err();
    assert!(matches!(err, TTSError::AudioGenerationFailed(_)));
}

#[tokio::test]
async fn test_queue_retries_azure_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SYNTHESIS_PATH))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;

    let audio_dir = TempDir::new().unwrap();
    let tts = Arc::new(synthesizer(&server, &audio_dir));
    let queue = RateLimitedQueue::new(RateLimitConfig {
        requests_per_second: 50,
        max_retries: 2,
        initial_backoff: std::time::Duration::from_millis(5),
    });

    let result = queue
        .submit(move || {
            let tts = tts.clone();
            async move { tts.synthesize("Hola", "card-6", "Spanish").await }
        })
        .await;

    assert!(matches!(result, Err(QueueError::Task(TTSError::RateLimited(_)))));
}
