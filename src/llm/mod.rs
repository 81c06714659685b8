//! Language-model provider seam and the OpenAI-compatible client.

pub mod openai;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::GenerateError;

pub use openai::{DEFAULT_BASE_URL, OpenAiClient};

/// A function tool offered to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    /// JSON Schema of the tool arguments.
    pub parameters: serde_json::Value,
}

/// A tool call returned by the model. `arguments` is the raw JSON text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub name: String,
    pub arguments: String,
}

/// The part of a chat completion the commit protocol cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelResponse {
    pub tool_call: Option<ToolInvocation>,
    pub content: Option<String>,
}

/// A chat model that can answer with a tool call or text.
///
/// This abstraction allows mocking the model in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Send one system + user exchange offering `tools`.
    async fn complete(
        &self,
        system: &str,
        user: &str,
        tools: &[ToolSchema],
    ) -> Result<ModelResponse, GenerateError>;
}
