//! OpenAI-compatible chat-completions client (OpenAI, Ollama, OpenRouter, ...).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{ChatProvider, ModelResponse, ToolInvocation, ToolSchema};
use crate::config::AiConfig;
use crate::error::{ConfigError, GenerateError};

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Serialize, Debug)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize, Debug)]
struct Tool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: &'a ToolSchema,
}

#[derive(Serialize, Debug)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    tools: Vec<Tool<'a>>,
}

#[derive(Deserialize, Debug)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Deserialize, Debug)]
struct ResponseToolCall {
    function: FunctionCall,
}

#[derive(Deserialize, Debug)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ResponseToolCall>>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: ResponseMessage,
    #[allow(dead_code)]
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
#[allow(dead_code)]
struct Usage {
    prompt_tokens: Option<u64>,
    completion_tokens: Option<u64>,
    total_tokens: Option<u64>,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    model: Option<String>,
    usage: Option<Usage>,
}

/// Client for any endpoint speaking the chat-completions protocol.
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiClient {
    /// Create a client. Fails when `api_key` is empty.
    pub fn new(
        model: impl Into<String>,
        api_key: impl Into<String>,
        base_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            model: model.into(),
            base_url: base_url
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        })
    }

    /// Create a client from the `[ai]` configuration section.
    pub fn from_config(config: &AiConfig) -> Result<Self, ConfigError> {
        let api_key = config.api_key.clone().ok_or(ConfigError::MissingApiKey)?;
        Self::new(
            config.model.clone(),
            api_key,
            config.base_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn api_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

fn transport_error(err: reqwest::Error) -> GenerateError {
    if err.is_timeout() {
        GenerateError::Transport(format!("request timed out: {err}"))
    } else {
        GenerateError::Transport(err.to_string())
    }
}

#[async_trait]
impl ChatProvider for OpenAiClient {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        tools: &[ToolSchema],
    ) -> Result<ModelResponse, GenerateError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: system,
                },
                Message {
                    role: "user",
                    content: user,
                },
            ],
            tools: tools
                .iter()
                .map(|function| Tool {
                    kind: "function",
                    function,
                })
                .collect(),
        };

        let url = self.api_url();
        debug!(
            system_prompt_len = system.len(),
            user_prompt_len = user.len(),
            tool_count = tools.len(),
            "Built chat completion request"
        );
        info!(url = %url, model = %self.model, "Sending request to chat completions API");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerateError::Transport(format!("HTTP {status}: {body}")));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenerateError::Transport(format!("invalid response body: {e}")))?;

        debug!(
            choice_count = chat.choices.len(),
            model = ?chat.model,
            usage = ?chat.usage,
            "Received chat completion response"
        );

        let choice = chat
            .choices
            .into_iter()
            .next()
            .ok_or(GenerateError::EmptyResponse)?;

        let tool_call = choice
            .message
            .tool_calls
            .and_then(|calls| calls.into_iter().next())
            .map(|call| ToolInvocation {
                name: call.function.name,
                arguments: call.function.arguments,
            });

        Ok(ModelResponse {
            tool_call,
            content: choice.message.content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> OpenAiClient {
        OpenAiClient::new(
            "gpt-test",
            "sk-test",
            Some(server.uri()),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn echo_tool() -> ToolSchema {
        ToolSchema {
            name: "echo".to_string(),
            description: "Echo".to_string(),
            parameters: json!({"type": "object", "properties": {}}),
        }
    }

    #[test]
    fn test_missing_api_key_is_rejected() {
        let err = OpenAiClient::new("m", "", None, Duration::from_secs(1))
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::MissingApiKey));
    }

    #[test]
    fn test_from_config_without_key() {
        let config = AiConfig::default();
        assert!(matches!(
            OpenAiClient::from_config(&config),
            Err(ConfigError::MissingApiKey)
        ));
    }

    #[test]
    fn test_default_base_url_and_trailing_slash() {
        let client = OpenAiClient::new("m", "k", None, Duration::from_secs(1)).unwrap();
        assert_eq!(client.api_url(), "https://api.openai.com/v1/chat/completions");

        let client = OpenAiClient::new(
            "m",
            "k",
            Some("http://localhost:11434/v1/".to_string()),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(client.api_url(), "http://localhost:11434/v1/chat/completions");
    }

    #[tokio::test]
    async fn test_complete_maps_tool_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-test",
                "messages": [
                    {"role": "system", "content": "sys"},
                    {"role": "user", "content": "usr"}
                ],
                "tools": [{"type": "function", "function": {"name": "echo"}}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "gpt-test",
                "choices": [{
                    "finish_reason": "tool_calls",
                    "message": {
                        "role": "assistant",
                        "content": null,
                        "tool_calls": [{
                            "id": "call_1",
                            "type": "function",
                            "function": {"name": "echo", "arguments": "{\"x\":1}"}
                        }]
                    }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = client_for(&server)
            .complete("sys", "usr", &[echo_tool()])
            .await
            .unwrap();

        assert_eq!(
            response.tool_call,
            Some(ToolInvocation {
                name: "echo".to_string(),
                arguments: "{\"x\":1}".to_string(),
            })
        );
        assert_eq!(response.content, None);
    }

    #[tokio::test]
    async fn test_complete_maps_text_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "fix: typo"}}]
            })))
            .mount(&server)
            .await;

        let response = client_for(&server)
            .complete("sys", "usr", &[])
            .await
            .unwrap();
        assert_eq!(response.tool_call, None);
        assert_eq!(response.content.as_deref(), Some("fix: typo"));
    }

    #[tokio::test]
    async fn test_zero_choices_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .complete("sys", "usr", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, GenerateError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_http_error_is_transport() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .complete("sys", "usr", &[])
            .await
            .unwrap_err();
        match err {
            GenerateError::Transport(msg) => {
                assert!(msg.contains("401"));
                assert!(msg.contains("invalid api key"));
            }
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_timeout_is_transport() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"choices": []}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let client = OpenAiClient::new(
            "gpt-test",
            "sk-test",
            Some(server.uri()),
            Duration::from_millis(100),
        )
        .unwrap();
        let err = client.complete("sys", "usr", &[]).await.unwrap_err();
        assert!(matches!(err, GenerateError::Transport(_)));
    }
}
