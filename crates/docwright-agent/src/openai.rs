use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, trace};

use crate::{
    AssistantReply, BackendConfig, BackendError, ChatBackend, ChatRequest, ChatResponse,
    FinishReason, ToolCall,
};

/// Chat-completions backend for OpenAI and compatible servers
pub struct OpenAiBackend {
    client: reqwest::Client,
    config: BackendConfig,
}

impl OpenAiBackend {
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        if config.api_key.trim().is_empty() {
            return Err(BackendError::ConfigError(
                "an API key is required".to_string(),
            ));
        }

        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    fn build_body(request: &ChatRequest<'_>) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": request.messages,
            "temperature": request.temperature,
        });

        if let Some(tools) = request.tools {
            let tools: Vec<serde_json::Value> = tools
                .iter()
                .map(|tool| {
                    serde_json::json!({
                        "type": "function",
                        "function": {
                            "name": tool.name,
                            "description": tool.description,
                            "parameters": tool.parameters,
                        }
                    })
                })
                .collect();
            body["tools"] = serde_json::json!(tools);
        }

        body
    }
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    fn name(&self) -> &str {
        "OpenAI"
    }

    async fn complete(&self, request: &ChatRequest<'_>) -> Result<ChatResponse, BackendError> {
        let body = Self::build_body(request);

        debug!(
            model = request.model,
            messages = request.messages.len(),
            tools = request.tools.map_or(0, |t| t.len()),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(BackendError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        trace!(body = %text, "Chat completion response");

        let parsed: WireResponse = serde_json::from_str(&text).map_err(|e| {
            BackendError::InvalidResponse(format!("Failed to parse response: {}", e))
        })?;

        let Some(choice) = parsed.choices.into_iter().next() else {
            debug!("Response contained no choices");
            return Ok(ChatResponse::default());
        };

        let message = choice.message.map(|m| AssistantReply {
            content: m.content,
            tool_calls: m.tool_calls.unwrap_or_default(),
        });

        Ok(ChatResponse {
            finish_reason: choice.finish_reason.map(FinishReason::from),
            message,
        })
    }
}

// Wire types for the chat-completions response
#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: Option<WireMessage>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ToolCall>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChatMessage, ToolDefinition};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(server: &MockServer) -> OpenAiBackend {
        OpenAiBackend::new(BackendConfig::new("sk-test").with_base_url(server.uri())).unwrap()
    }

    fn messages() -> Vec<ChatMessage> {
        vec![
            ChatMessage::system("You write docs"),
            ChatMessage::user("Update README.md"),
        ]
    }

    #[test]
    fn test_empty_api_key_rejected() {
        let result = OpenAiBackend::new(BackendConfig::new("  "));
        assert!(matches!(result, Err(BackendError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_complete_returns_text() {
        let server = MockServer::start().await;

        let response_json = r#"{
            "id": "chatcmpl-1",
            "model": "gpt-4.1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "Hello"}, "finish_reason": "stop"}
            ]
        }"#;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_string(response_json))
            .expect(1)
            .mount(&server)
            .await;

        let messages = messages();
        let request = ChatRequest {
            model: "gpt-4.1",
            temperature: 0.7,
            messages: &messages,
            tools: None,
        };

        let response = backend(&server).complete(&request).await.unwrap();

        assert_eq!(response.finish_reason, Some(FinishReason::Stop));
        assert_eq!(response.message, Some(AssistantReply::text("Hello")));

        let received = server.received_requests().await.unwrap();
        let body: serde_json::Value = received[0].body_json().unwrap();
        assert_eq!(body["model"], "gpt-4.1");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "Update README.md");
        assert!(body.get("tools").is_none());
    }

    #[tokio::test]
    async fn test_complete_parses_tool_calls_and_sends_manifest() {
        let server = MockServer::start().await;

        let response_json = r#"{
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {"name": "read", "arguments": "{\"path\":\"README.md\"}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        }"#;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_string(response_json))
            .mount(&server)
            .await;

        let messages = messages();
        let tools = vec![ToolDefinition {
            name: "read".to_string(),
            description: "Read a file".to_string(),
            parameters: serde_json::json!({"type": "object", "properties": {}}),
        }];
        let request = ChatRequest {
            model: "gpt-4.1",
            temperature: 0.2,
            messages: &messages,
            tools: Some(&tools),
        };

        let response = backend(&server).complete(&request).await.unwrap();

        assert_eq!(response.finish_reason, Some(FinishReason::ToolCalls));
        let reply = response.message.unwrap();
        assert_eq!(reply.content, None);
        assert_eq!(reply.tool_calls.len(), 1);
        assert_eq!(reply.tool_calls[0].id, "call_abc");
        assert_eq!(reply.tool_calls[0].name(), "read");
        assert_eq!(reply.tool_calls[0].arguments(), r#"{"path":"README.md"}"#);

        let received = server.received_requests().await.unwrap();
        let body: serde_json::Value = received[0].body_json().unwrap();
        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tools"][0]["function"]["name"], "read");
    }

    #[tokio::test]
    async fn test_empty_choices_yield_no_message() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"choices": []}"#))
            .mount(&server)
            .await;

        let messages = messages();
        let request = ChatRequest {
            model: "gpt-4.1",
            temperature: 0.7,
            messages: &messages,
            tools: None,
        };

        let response = backend(&server).complete(&request).await.unwrap();
        assert!(response.message.is_none());
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let messages = messages();
        let request = ChatRequest {
            model: "gpt-4.1",
            temperature: 0.7,
            messages: &messages,
            tools: None,
        };

        let err = backend(&server).complete(&request).await.unwrap_err();
        match err {
            BackendError::Api { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "invalid api key");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_invalid_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let messages = messages();
        let request = ChatRequest {
            model: "gpt-4.1",
            temperature: 0.7,
            messages: &messages,
            tools: None,
        };

        let err = backend(&server).complete(&request).await.unwrap_err();
        assert!(matches!(err, BackendError::InvalidResponse(_)));
    }
}
