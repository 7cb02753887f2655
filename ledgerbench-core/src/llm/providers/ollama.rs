//! Ollama tool-calling agent

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::BackendConfig;
use crate::error::{LedgerbenchError, Result};
use crate::llm::{Agent, AgentError};
use crate::tools::{ToolDefinition, Toolbox};

/// Agent that chats with a local Ollama server and executes the tool calls
/// the model makes.
pub struct OllamaAgent {
    client: reqwest::Client,
    config: BackendConfig,
}

impl OllamaAgent {
    /// Create an agent for the configured backend
    pub fn new(config: BackendConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| {
                LedgerbenchError::Configuration(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self { client, config })
    }

    /// Base URL of the Ollama server
    pub fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    async fn chat(&self, request: &ChatRequest<'_>) -> std::result::Result<ChatResponse, AgentError> {
        let url = format!("{}/api/chat", self.base_url());

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                AgentError::Transport(format!(
                    "Failed to send request to Ollama: {}. Make sure Ollama is running.",
                    e
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AgentError::Api { status, body });
        }

        let text = response
            .text()
            .await
            .map_err(|e| AgentError::Transport(format!("Failed to read Ollama response: {}", e)))?;

        serde_json::from_str(&text)
            .map_err(|e| AgentError::Protocol(format!("Failed to parse Ollama response: {}", e)))
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    tools: &'a [ToolSpec],
    stream: bool,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Serialize)]
struct ToolSpec {
    #[serde(rename = "type")]
    kind: &'static str,
    function: ToolDefinition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_name: Option<String>,
}

impl ChatMessage {
    fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
            tool_calls: Vec::new(),
            tool_name: None,
        }
    }

    fn tool(name: &str, content: String) -> Self {
        Self {
            role: "tool".to_string(),
            content,
            tool_calls: Vec::new(),
            tool_name: Some(name.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ToolCall {
    function: FunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

/// Some models send the arguments object as a JSON string
fn decode_arguments(arguments: &Value) -> Value {
    match arguments {
        Value::String(raw) => serde_json::from_str(raw).unwrap_or_else(|_| arguments.clone()),
        Value::Null => Value::Object(Default::default()),
        other => other.clone(),
    }
}

/// Tool message content returned to the model for one call
fn execute_call(toolbox: &Toolbox, call: &FunctionCall) -> String {
    let args = decode_arguments(&call.arguments);
    match toolbox.invoke(&call.name, &args) {
        Ok(outcome) => outcome.to_string(),
        Err(e) => format!("Error: {}", e),
    }
}

#[async_trait]
impl Agent for OllamaAgent {
    async fn respond(
        &self,
        model: &str,
        prompt: &str,
        toolbox: &Toolbox,
    ) -> std::result::Result<String, AgentError> {
        let tools: Vec<ToolSpec> = toolbox
            .definitions()
            .into_iter()
            .map(|function| ToolSpec {
                kind: "function",
                function,
            })
            .collect();
        let mut messages = vec![ChatMessage::user(prompt)];

        for turn in 0..self.config.max_tool_turns {
            let request = ChatRequest {
                model,
                messages: &messages,
                tools: &tools,
                stream: false,
                options: ChatOptions {
                    temperature: self.config.temperature,
                },
            };

            let response = self.chat(&request).await?;
            let message = response.message;

            if message.tool_calls.is_empty() {
                return Ok(message.content);
            }

            debug!(model = %model, turn, calls = message.tool_calls.len(), "Model requested tools");
            let results: Vec<ChatMessage> = message
                .tool_calls
                .iter()
                .map(|call| ChatMessage::tool(&call.function.name, execute_call(toolbox, &call.function)))
                .collect();

            messages.push(message);
            messages.extend(results);
        }

        warn!(model = %model, turns = self.config.max_tool_turns, "Tool-call turn limit reached");
        Err(AgentError::TurnLimit(self.config.max_tool_turns))
    }

    async fn health_check(&self) -> std::result::Result<(), AgentError> {
        let url = format!("{}/api/tags", self.base_url());
        let response = self
            .client
            .get(&url)
            .timeout(self.config.health_timeout)
            .send()
            .await
            .map_err(|e| AgentError::Transport(e.to_string()))?;

        if response.status().as_u16() == 200 {
            Ok(())
        } else {
            Err(AgentError::Api {
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            })
        }
    }

    fn provider(&self) -> &str {
        "ollama"
    }
}
