//! Completion and speech clients against a mocked OpenAI endpoint.

use aichat_core::{ChatError, Message, OpenAIClient, Session, SpeechClient};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn completion_body(text: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [
            { "index": 0, "message": { "role": "assistant", "content": text }, "finish_reason": "stop" }
        ]
    })
}

mod completion_tests {
    use super::*;

    #[tokio::test]
    async fn test_complete_sends_ordered_messages_and_trims_reply() {
        std::env::set_var("AICHAT_TEST_KEY_COMPLETE", "sk-test");
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_json(json!({
                "model": "gpt-4o-mini",
                "messages": [
                    { "role": "system", "content": "be kind" },
                    { "role": "user", "content": "hi" },
                    { "role": "assistant", "content": "hello" },
                    { "role": "user", "content": "how are you?" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("\n  Fine, thanks.  \n")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = OpenAIClient::with_base_url(&mock_server.uri());
        let messages = vec![
            Message::system("be kind"),
            Message::user("hi"),
            Message::assistant("hello"),
            Message::user("how are you?"),
        ];

        let reply = client
            .complete("AICHAT_TEST_KEY_COMPLETE", "gpt-4o-mini", &messages)
            .await
            .unwrap();
        assert_eq!(reply, "Fine, thanks.");
    }

    #[tokio::test]
    async fn test_rejected_key_is_auth_failure() {
        std::env::set_var("AICHAT_TEST_KEY_REJECTED", "sk-bad");
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": { "message": "Incorrect API key provided: sk-bad", "type": "invalid_request_error" }
            })))
            .mount(&mock_server)
            .await;

        let client = OpenAIClient::with_base_url(&mock_server.uri());
        let err = client
            .complete("AICHAT_TEST_KEY_REJECTED", "gpt-4o-mini", &[Message::user("hi")])
            .await
            .unwrap_err();

        match err {
            ChatError::Auth(text) => assert!(text.contains("Incorrect API key provided")),
            other => panic!("expected auth failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_server_error_is_transport_failure_with_single_attempt() {
        std::env::set_var("AICHAT_TEST_KEY_SERVER_ERROR", "sk-test");
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("overloaded"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = OpenAIClient::with_base_url(&mock_server.uri());
        let err = client
            .complete("AICHAT_TEST_KEY_SERVER_ERROR", "gpt-4o-mini", &[Message::user("hi")])
            .await
            .unwrap_err();

        assert!(matches!(err, ChatError::Transport(ref t) if t.contains("overloaded")));
    }

    #[tokio::test]
    async fn test_missing_key_never_reaches_the_network() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("nope")))
            .expect(0)
            .mount(&mock_server)
            .await;

        let client = OpenAIClient::with_base_url(&mock_server.uri());
        let err = client
            .complete("AICHAT_TEST_KEY_UNSET", "gpt-4o-mini", &[Message::user("hi")])
            .await
            .unwrap_err();

        assert!(matches!(err, ChatError::Auth(_)));
    }

    #[tokio::test]
    async fn test_blank_or_null_reply_is_transport_failure() {
        std::env::set_var("AICHAT_TEST_KEY_BLANK", "sk-test");
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_json(json!({
                "model": "gpt-4o-mini",
                "messages": [{ "role": "user", "content": "blank" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(" \n\t ")))
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_json(json!({
                "model": "gpt-4o-mini",
                "messages": [{ "role": "user", "content": "null" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "index": 0, "message": { "role": "assistant", "content": null } }]
            })))
            .mount(&mock_server)
            .await;

        let client = OpenAIClient::with_base_url(&mock_server.uri());
        for text in ["blank", "null"] {
            let err = client
                .complete("AICHAT_TEST_KEY_BLANK", "gpt-4o-mini", &[Message::user(text)])
                .await
                .unwrap_err();
            assert_eq!(err, ChatError::Transport("OpenAI API returned an empty reply".to_string()));
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_transport_failure() {
        std::env::set_var("AICHAT_TEST_KEY_MALFORMED", "sk-test");
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not valid json"))
            .mount(&mock_server)
            .await;

        let client = OpenAIClient::with_base_url(&mock_server.uri());
        let err = client
            .complete("AICHAT_TEST_KEY_MALFORMED", "gpt-4o-mini", &[Message::user("hi")])
            .await
            .unwrap_err();

        assert!(matches!(err, ChatError::Transport(_)));
    }
}

mod session_tests {
    use super::*;

    #[tokio::test]
    async fn test_session_round_trips_through_client() {
        std::env::set_var("AICHAT_TEST_KEY_SESSION", "sk-test");
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Hello!")))
            .mount(&mock_server)
            .await;

        let client = OpenAIClient::with_base_url(&mock_server.uri());
        let mut session = Session::initialize("sys");

        for _ in 0..2 {
            let reply = session
                .submit("hi", |msgs| {
                    let client = client.clone();
                    async move { client.complete("AICHAT_TEST_KEY_SESSION", "gpt-4o-mini", &msgs).await }
                })
                .await
                .unwrap();
            assert_eq!(reply, "Hello!");
        }

        assert_eq!(session.len(), 5);
    }

    #[tokio::test]
    async fn test_empty_reply_adds_no_assistant_turn() {
        std::env::set_var("AICHAT_TEST_KEY_SESSION_EMPTY", "sk-test");
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("")))
            .mount(&mock_server)
            .await;

        let client = OpenAIClient::with_base_url(&mock_server.uri());
        let mut session = Session::initialize("sys");

        let result = session
            .submit("say nothing", |msgs| {
                let client = client.clone();
                async move { client.complete("AICHAT_TEST_KEY_SESSION_EMPTY", "gpt-4o-mini", &msgs).await }
            })
            .await;

        assert!(matches!(result, Err(ChatError::Transport(_))));
        assert_eq!(session.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_completion_grows_session_by_one() {
        std::env::set_var("AICHAT_TEST_KEY_SESSION_FAIL", "sk-test");
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let client = OpenAIClient::with_base_url(&mock_server.uri());
        let mut session = Session::initialize("sys");

        let result = session
            .submit("anyone there?", |msgs| {
                let client = client.clone();
                async move { client.complete("AICHAT_TEST_KEY_SESSION_FAIL", "gpt-4o-mini", &msgs).await }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(session.len(), 2);
        assert_eq!(session.messages()[1], Message::user("anyone there?"));
    }
}

mod speech_tests {
    use super::*;

    #[tokio::test]
    async fn test_synthesize_streams_audio_to_file() {
        std::env::set_var("AICHAT_TEST_KEY_SPEECH", "sk-test");
        let mock_server = MockServer::start().await;
        let audio = vec![0x49u8, 0x44, 0x33, 0x04, 0x00, 0xff, 0xfb];

        Mock::given(method("POST"))
            .and(path("/audio/speech"))
            .and(body_json(json!({
                "model": "gpt-4o-mini-tts",
                "voice": "nova",
                "input": "Voice playback is now on.",
                "response_format": "mp3"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(audio.clone()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("speech.mp3");
        let client = SpeechClient::with_base_url(&mock_server.uri(), "AICHAT_TEST_KEY_SPEECH", None);

        client
            .synthesize("nova", &out, "Voice playback is now on.")
            .await
            .unwrap();
        assert_eq!(std::fs::read(&out).unwrap(), audio);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_speak_launches_configured_player() {
        std::env::set_var("AICHAT_TEST_KEY_SPEAK", "sk-test");
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/audio/speech"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2, 3]))
            .mount(&mock_server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("speech.mp3");
        let client = SpeechClient::with_base_url(
            &mock_server.uri(),
            "AICHAT_TEST_KEY_SPEAK",
            Some("true".to_string()),
        );

        client.speak("alloy", &out, "hello").await.unwrap();
        assert!(out.exists());
    }

    #[tokio::test]
    async fn test_speech_failures_are_playback_errors() {
        std::env::set_var("AICHAT_TEST_KEY_SPEECH_FAIL", "sk-test");
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/audio/speech"))
            .respond_with(ResponseTemplate::new(500).set_body_string("tts down"))
            .mount(&mock_server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let client = SpeechClient::with_base_url(&mock_server.uri(), "AICHAT_TEST_KEY_SPEECH_FAIL", None);

        let err = client
            .speak("nova", &dir.path().join("speech.mp3"), "hello")
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Playback(ref t) if t.contains("tts down")));
        assert!(!dir.path().join("speech.mp3").exists());
    }

    #[tokio::test]
    async fn test_missing_player_is_playback_error() {
        std::env::set_var("AICHAT_TEST_KEY_NO_PLAYER", "sk-test");
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/audio/speech"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8]))
            .mount(&mock_server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let client = SpeechClient::with_base_url(
            &mock_server.uri(),
            "AICHAT_TEST_KEY_NO_PLAYER",
            Some("aichat-no-such-player-binary".to_string()),
        );

        let err = client
            .speak("nova", &dir.path().join("speech.mp3"), "hello")
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Playback(_)));
    }
}
