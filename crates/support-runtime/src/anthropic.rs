//! Anthropic LLM Provider
//!
//! Implementation of `LlmProvider` for the hosted Anthropic messages
//! endpoint, with native tool use.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use support_core::{
    error::{AgentError, Result},
    message::{Message, Role},
    provider::{
        Completion, ContentBlock, FinishReason, GenerationOptions, LlmProvider, ProviderInfo,
        TokenUsage,
    },
    tool::ToolSchema,
};

const API_VERSION: &str = "2023-06-01";

/// Anthropic provider configuration
#[derive(Clone, Debug)]
pub struct AnthropicConfig {
    /// API base URL
    pub base_url: String,

    /// API key
    pub api_key: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl AnthropicConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: "https://api.anthropic.com".into(),
            api_key: api_key.into(),
            timeout_secs: 120,
        }
    }

    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| AgentError::Config("ANTHROPIC_API_KEY is not set".into()))?;
        let mut config = Self::new(api_key);

        if let Ok(base_url) = std::env::var("ANTHROPIC_BASE_URL") {
            config.base_url = base_url;
        }

        Ok(config)
    }
}

/// Anthropic LLM provider
pub struct AnthropicProvider {
    client: reqwest::Client,
    config: AnthropicConfig,
}

impl AnthropicProvider {
    /// Create from configuration
    pub fn from_config(config: AnthropicConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_config(AnthropicConfig::from_env()?)
    }

    /// Convert transcript messages to API message objects.
    ///
    /// Assistant turns keep their tool-use blocks verbatim (ids included);
    /// tool turns become user turns carrying `tool_result` blocks keyed by
    /// `tool_use_id`, which is how the endpoint pairs results with requests.
    fn convert_messages(messages: &[Message]) -> Vec<Value> {
        messages
            .iter()
            .filter_map(|m| match m.role {
                Role::System => None,
                Role::User => Some(json!({
                    "role": "user",
                    "content": [{"type": "text", "text": m.content}],
                })),
                Role::Assistant => {
                    let mut content = Vec::new();
                    if !m.content.is_empty() {
                        content.push(json!({"type": "text", "text": m.content}));
                    }
                    for call in &m.tool_calls {
                        content.push(json!({
                            "type": "tool_use",
                            "id": call.id,
                            "name": call.name,
                            "input": call.arguments,
                        }));
                    }
                    Some(json!({"role": "assistant", "content": content}))
                }
                Role::Tool => {
                    let content: Vec<Value> = m
                        .tool_results
                        .iter()
                        .map(|r| {
                            json!({
                                "type": "tool_result",
                                "tool_use_id": r.id,
                                "content": r.output,
                                "is_error": !r.success,
                            })
                        })
                        .collect();
                    Some(json!({"role": "user", "content": content}))
                }
            })
            .collect()
    }

    /// Convert tool schemas to the endpoint's tool definitions
    fn convert_tools(tools: &[ToolSchema]) -> Vec<Value> {
        tools
            .iter()
            .map(|t| {
                let mut properties = serde_json::Map::new();
                let mut required = Vec::new();

                for param in &t.parameters {
                    let mut spec = serde_json::Map::new();
                    spec.insert("type".into(), json!(param.param_type));
                    spec.insert("description".into(), json!(param.description));
                    if let Some(values) = &param.enum_values {
                        spec.insert("enum".into(), json!(values));
                    }
                    properties.insert(param.name.clone(), Value::Object(spec));
                    if param.required {
                        required.push(param.name.clone());
                    }
                }

                json!({
                    "name": t.name,
                    "description": t.description,
                    "input_schema": {
                        "type": "object",
                        "properties": properties,
                        "required": required,
                    },
                })
            })
            .collect()
    }

    /// Parse the response body into a completion
    fn parse_completion(body: &Value) -> Result<Completion> {
        let content = body
            .get("content")
            .and_then(Value::as_array)
            .ok_or_else(|| AgentError::Parse("response missing content array".into()))?;

        let mut blocks = Vec::new();
        for block in content {
            match block.get("type").and_then(Value::as_str) {
                Some("text") => {
                    let text = block
                        .get("text")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string();
                    blocks.push(ContentBlock::Text { text });
                }
                Some("tool_use") => {
                    let id = block
                        .get("id")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string();
                    let name = block
                        .get("name")
                        .and_then(Value::as_str)
                        .ok_or_else(|| AgentError::Parse("tool_use block missing name".into()))?
                        .to_string();
                    let input = block.get("input").cloned().unwrap_or(json!({}));
                    blocks.push(ContentBlock::ToolUse { id, name, input });
                }
                // Thinking and other block types carry no tool semantics
                _ => {}
            }
        }

        let finish_reason = body
            .get("stop_reason")
            .and_then(Value::as_str)
            .map(|r| match r {
                "tool_use" => FinishReason::ToolUse,
                "max_tokens" => FinishReason::Length,
                _ => FinishReason::Stop,
            });

        let usage = body.get("usage").map(|u| {
            let prompt = u.get("input_tokens").and_then(Value::as_u64).unwrap_or(0) as u32;
            let completion = u.get("output_tokens").and_then(Value::as_u64).unwrap_or(0) as u32;
            TokenUsage {
                prompt_tokens: prompt,
                completion_tokens: completion,
                total_tokens: prompt + completion,
            }
        });

        Ok(Completion {
            blocks,
            model: body
                .get("model")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            usage,
            finish_reason,
        })
    }

    fn status_error(status: reqwest::StatusCode, body: String) -> AgentError {
        match status.as_u16() {
            401 | 403 => AgentError::Auth(body),
            429 => AgentError::RateLimited(body),
            500..=599 => AgentError::ProviderUnavailable(body),
            _ => AgentError::Provider(format!("HTTP {}: {}", status, body)),
        }
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    async fn info(&self) -> Result<ProviderInfo> {
        Ok(ProviderInfo {
            name: "Anthropic".into(),
            version: Some(API_VERSION.into()),
            supports_tools: true,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/v1/models", self.config.base_url);
        match self
            .client
            .get(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", API_VERSION)
            .send()
            .await
        {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) => {
                tracing::warn!("completion endpoint health check failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolSchema],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        let mut body = json!({
            "model": options.model,
            "max_tokens": options.max_tokens,
            "temperature": options.temperature,
            "messages": Self::convert_messages(messages),
        });

        if let Some(system) = &options.system_prompt {
            body["system"] = json!(system);
        }
        if !tools.is_empty() {
            body["tools"] = json!(Self::convert_tools(tools));
        }
        if !options.stop_sequences.is_empty() {
            body["stop_sequences"] = json!(options.stop_sequences);
        }

        let url = format!("{}/v1/messages", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::ProviderUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Self::status_error(status, text));
        }

        let parsed: Value = response
            .json()
            .await
            .map_err(|e| AgentError::Parse(e.to_string()))?;

        Self::parse_completion(&parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use support_core::tool::ParameterSchema;
    use support_core::tool::{ToolCall, ToolResult};

    #[test]
    fn test_message_conversion_pairs_results_by_id() {
        let messages = vec![
            Message::user("where is 42?"),
            Message::assistant_with_calls(
                "Checking.",
                vec![ToolCall::new("toolu_1", "find_by_id", json!({"id": "42"}))],
            ),
            Message::tool_results(vec![
                ToolResult::success("find_by_id", "found it").with_id("toolu_1")
            ]),
        ];

        let converted = AnthropicProvider::convert_messages(&messages);
        assert_eq!(converted.len(), 3);
        assert_eq!(converted[1]["content"][1]["id"], "toolu_1");
        assert_eq!(converted[2]["role"], "user");
        assert_eq!(converted[2]["content"][0]["tool_use_id"], "toolu_1");
    }

    #[test]
    fn test_tool_schema_conversion() {
        let schema = ToolSchema {
            name: "find_by_id".into(),
            description: "Look up an identifier".into(),
            parameters: vec![ParameterSchema::string("id", "identifier", true)],
            has_side_effects: false,
        };

        let converted = AnthropicProvider::convert_tools(&[schema]);
        assert_eq!(converted[0]["name"], "find_by_id");
        assert_eq!(converted[0]["input_schema"]["required"][0], "id");
    }

    #[test]
    fn test_parse_completion_blocks() {
        let body = json!({
            "model": "claude-sonnet-4-5",
            "stop_reason": "tool_use",
            "content": [
                {"type": "text", "text": "Let me look."},
                {"type": "tool_use", "id": "toolu_9", "name": "find_by_id", "input": {"id": "7"}},
            ],
            "usage": {"input_tokens": 10, "output_tokens": 5},
        });

        let completion = AnthropicProvider::parse_completion(&body).unwrap();
        assert_eq!(completion.blocks.len(), 2);
        assert_eq!(completion.finish_reason, Some(FinishReason::ToolUse));
        assert_eq!(completion.tool_calls()[0].id, "toolu_9");
        assert_eq!(completion.usage.unwrap().total_tokens, 15);
    }
}
