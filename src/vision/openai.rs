use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, instrument, warn};

use super::{AnalysisError, MealAnalysis, MealAnalyzer, ANALYSIS_PROMPT};
use crate::config::VisionConfig;

const MAX_TOKENS: u32 = 500;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [serde_json::Value; 1],
    max_tokens: u32,
    response_format: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Vision analysis over an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Clone)]
pub struct OpenAiVisionClient {
    http: Client,
    api_key: Option<String>,
    endpoint: String,
    model: String,
}

impl OpenAiVisionClient {
    pub fn new(cfg: &VisionConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("build vision http client")?;
        Ok(Self {
            http,
            api_key: cfg.api_key.clone().filter(|k| !k.trim().is_empty()),
            endpoint: format!("{}/chat/completions", cfg.base_url.trim_end_matches('/')),
            model: cfg.model.clone(),
        })
    }

    fn request_body(&self, image: &[u8]) -> ChatRequest<'_> {
        let data_url = format!("data:image/jpeg;base64,{}", STANDARD.encode(image));
        ChatRequest {
            model: &self.model,
            messages: [json!({
                "role": "user",
                "content": [
                    { "type": "text", "text": ANALYSIS_PROMPT },
                    { "type": "image_url", "image_url": { "url": data_url } },
                ],
            })],
            max_tokens: MAX_TOKENS,
            response_format: json!({ "type": "json_object" }),
        }
    }
}

#[async_trait]
impl MealAnalyzer for OpenAiVisionClient {
    #[instrument(skip(self, image), fields(image_bytes = image.len()))]
    async fn analyze(&self, image: &[u8]) -> Result<MealAnalysis, AnalysisError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(AnalysisError::NotConfigured);
        };

        let res = self
            .http
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&self.request_body(image))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                warn!(error = %e, "vision request failed");
                AnalysisError::Transport(e.to_string())
            })?;

        let body: ChatResponse = res.json().await.map_err(|e| {
            if e.is_decode() {
                AnalysisError::Unexpected(format!("malformed completion envelope: {e}"))
            } else {
                AnalysisError::Transport(e.to_string())
            }
        })?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AnalysisError::Unexpected("completion has no message content".into()))?;

        debug!(content_len = content.len(), "vision response received");
        MealAnalysis::from_content(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn cfg(base_url: &str, api_key: Option<&str>) -> VisionConfig {
        VisionConfig {
            api_key: api_key.map(str::to_string),
            base_url: base_url.to_string(),
            model: "gpt-4o".into(),
            timeout_secs: 5,
        }
    }

    fn completion(content: &str) -> serde_json::Value {
        json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }]
        })
    }

    #[tokio::test]
    async fn missing_key_short_circuits_without_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = OpenAiVisionClient::new(&cfg(&server.uri(), None)).expect("client");
        let err = client.analyze(b"jpeg").await.unwrap_err();
        assert!(matches!(err, AnalysisError::NotConfigured));

        let blank = OpenAiVisionClient::new(&cfg(&server.uri(), Some("  "))).expect("client");
        assert!(matches!(
            blank.analyze(b"jpeg").await.unwrap_err(),
            AnalysisError::NotConfigured
        ));
    }

    #[tokio::test]
    async fn successful_completion_is_parsed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(
                r#"{"description":"Pasta","calories":"450","carbs":"60","components":["pasta"]}"#,
            )))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAiVisionClient::new(&cfg(&format!("{}/v1", server.uri()), Some("sk-test")))
            .expect("client");
        let analysis = client.analyze(b"jpeg-bytes").await.expect("analysis");
        assert_eq!(analysis.description, "Pasta");
        assert_eq!(analysis.calories, json!("450"));
        assert_eq!(analysis.components, vec!["pasta"]);
    }

    #[tokio::test]
    async fn request_carries_prompt_and_inline_image() {
        let client = OpenAiVisionClient::new(&cfg("http://localhost", Some("k"))).expect("client");
        let body = serde_json::to_value(client.request_body(b"abc")).expect("serialize");
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["max_tokens"], 500);
        assert_eq!(body["response_format"]["type"], "json_object");
        let content = &body["messages"][0]["content"];
        assert_eq!(content[0]["text"], ANALYSIS_PROMPT);
        assert_eq!(content[1]["image_url"]["url"], "data:image/jpeg;base64,YWJj");
    }

    #[tokio::test]
    async fn http_error_is_a_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAiVisionClient::new(&cfg(&server.uri(), Some("sk-test"))).expect("client");
        let err = client.analyze(b"jpeg").await.unwrap_err();
        assert!(matches!(err, AnalysisError::Transport(_)), "{err:?}");
    }

    #[tokio::test]
    async fn non_json_content_is_a_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("a plate of pasta")))
            .mount(&server)
            .await;

        let client = OpenAiVisionClient::new(&cfg(&server.uri(), Some("sk-test"))).expect("client");
        let err = client.analyze(b"jpeg").await.unwrap_err();
        assert!(matches!(err, AnalysisError::Parse(_)), "{err:?}");
    }

    #[tokio::test]
    async fn empty_choices_is_unexpected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let client = OpenAiVisionClient::new(&cfg(&server.uri(), Some("sk-test"))).expect("client");
        let err = client.analyze(b"jpeg").await.unwrap_err();
        assert!(matches!(err, AnalysisError::Unexpected(_)), "{err:?}");
    }
}
