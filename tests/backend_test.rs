use fos_classifier::{
    BackendError, HostedSampling, InferenceBackend, LocalSampling, OllamaBackend, OllamaConfig, OpenAiBackend,
    OpenAiConfig,
};
use mockito::{Matcher, Server};
use serde_json::json;

fn ollama(server: &Server) -> OllamaBackend {
    OllamaBackend::new(OllamaConfig::new("llama3").with_host(server.url())).unwrap()
}

fn openai(server: &Server) -> OpenAiBackend {
    OpenAiBackend::new(OpenAiConfig::new("gpt-4o-mini", "test-key").with_base_url(server.url())).unwrap()
}

#[test]
fn test_ollama_sends_chat_request() -> Result<(), BackendError> {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/api/chat")
        .match_body(Matcher::PartialJson(json!({
            "model": "llama3",
            "stream": false,
            "messages": [
                {"role": "system", "content": "You are a librarian."},
                {"role": "user", "content": "Title: Ants"}
            ],
            "options": {"temperature": 0.5, "top_k": 3}
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"model": "llama3", "message": {"role": "assistant", "content": "  Biology\n"}, "done": true}"#)
        .create();

    let sampling = LocalSampling {
        temperature: 0.5,
        top_k: 3,
    };
    let label = ollama(&server).classify("Title: Ants", Some("You are a librarian."), &sampling)?;
    assert_eq!(label.as_deref(), Some("Biology"));
    mock.assert();
    Ok(())
}

#[test]
fn test_ollama_omits_empty_system_prompt() -> Result<(), BackendError> {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/api/chat")
        .match_body(Matcher::PartialJson(json!({
            "messages": [{"role": "user", "content": "prompt"}]
        })))
        .with_body(r#"{"message": {"role": "assistant", "content": "Physics"}}"#)
        .create();

    let label = ollama(&server).classify("prompt", Some(""), &LocalSampling::default())?;
    assert_eq!(label.as_deref(), Some("Physics"));
    mock.assert();
    Ok(())
}

#[test]
fn test_ollama_http_error_is_fatal() {
    let mut server = Server::new();
    let _mock = server
        .mock("POST", "/api/chat")
        .with_status(500)
        .with_body("model not loaded")
        .create();

    let result = ollama(&server).classify("prompt", None, &LocalSampling::default());
    match result {
        Err(BackendError::HttpStatus { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "model not loaded");
        }
        other => panic!("expected HttpStatus error, got {:?}", other),
    }
}

#[test]
fn test_ollama_malformed_body_is_fatal() {
    let mut server = Server::new();
    let _mock = server.mock("POST", "/api/chat").with_body(r#"{"done": true}"#).create();

    let result = ollama(&server).classify("prompt", None, &LocalSampling::default());
    assert!(matches!(result, Err(BackendError::MalformedResponse(_))));
}

#[test]
fn test_openai_sends_completion_request() -> Result<(), BackendError> {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .match_body(Matcher::PartialJson(json!({
            "model": "gpt-4o-mini",
            "max_tokens": 20,
            "messages": [{"role": "user", "content": "Title: Quarks"}]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"choices": [{"index": 0, "message": {"role": "assistant", "content": " Physical sciences "}}]}"#)
        .create();

    let sampling = HostedSampling {
        temperature: 0.1,
        max_tokens: 20,
    };
    let label = openai(&server).classify("Title: Quarks", None, &sampling)?;
    assert_eq!(label.as_deref(), Some("Physical sciences"));
    mock.assert();
    Ok(())
}

#[test]
fn test_openai_failures_are_recoverable() -> Result<(), BackendError> {
    let mut server = Server::new();
    let _rate_limited = server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::Regex("rate".into()))
        .with_status(429)
        .with_body(r#"{"error": {"message": "Rate limit reached"}}"#)
        .create();
    let _empty = server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::Regex("empty".into()))
        .with_body(r#"{"choices": []}"#)
        .create();
    let _no_content = server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::Regex("refusal".into()))
        .with_body(r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#)
        .create();

    let backend = openai(&server);
    let sampling = HostedSampling::default();
    assert_eq!(backend.classify("rate", None, &sampling)?, None);
    assert_eq!(backend.classify("empty", None, &sampling)?, None);
    assert_eq!(backend.classify("refusal", None, &sampling)?, None);
    Ok(())
}

#[test]
fn test_openai_unreachable_server_is_recoverable() -> Result<(), BackendError> {
    let backend = OpenAiBackend::new(OpenAiConfig::new("gpt-4o-mini", "test-key").with_base_url("http://127.0.0.1:9"))?;
    assert_eq!(backend.classify("prompt", None, &HostedSampling::default())?, None);
    Ok(())
}
