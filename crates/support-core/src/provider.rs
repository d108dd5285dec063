//! LLM Provider Strategy Pattern
//!
//! Defines a common interface for hosted completion services so the reasoning
//! loop works with any backend without code changes. A completion is a
//! sequence of content blocks: free text interleaved with structured tool
//! invocations, plus the service's stop signal.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use support_core::provider::{LlmProvider, GenerationOptions};
//!
//! let completion = provider.complete(transcript.messages(), &schemas, &options).await?;
//! for call in completion.tool_calls() { /* dispatch */ }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::Message;
use crate::tool::{ToolCall, ToolSchema};

/// Configuration for LLM generation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model identifier (e.g., "claude-sonnet-4-5", "gpt-4o")
    pub model: String,

    /// Temperature for sampling (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Stop sequences
    #[serde(default)]
    pub stop_sequences: Vec<String>,

    /// System prompt, sent alongside (not inside) the transcript
    #[serde(default)]
    pub system_prompt: Option<String>,
}

fn default_temperature() -> f32 { 0.2 }
fn default_max_tokens() -> u32 { 2048 }

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-5".into(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            stop_sequences: Vec::new(),
            system_prompt: None,
        }
    }
}

impl GenerationOptions {
    /// Replace the system prompt
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }
}

/// One block of a completion
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Free text
    Text { text: String },

    /// Structured tool invocation
    ToolUse {
        /// Invocation identifier assigned by the model
        id: String,
        /// Tool name
        name: String,
        /// Tool input as a JSON object
        input: serde_json::Value,
    },
}

/// Reason the service stopped generating
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolUse,
    ContentFilter,
    Error,
}

/// Token usage statistics
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Response from an LLM completion
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Completion {
    /// Ordered content blocks (text and tool invocations)
    pub blocks: Vec<ContentBlock>,

    /// Model that generated this response
    pub model: String,

    /// Token usage statistics (if available)
    pub usage: Option<TokenUsage>,

    /// Stop signal from the service
    pub finish_reason: Option<FinishReason>,
}

impl Completion {
    /// A text-only completion (handy for tests and scripted sequences)
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            blocks: vec![ContentBlock::Text { text: text.into() }],
            model: String::new(),
            usage: None,
            finish_reason: Some(FinishReason::Stop),
        }
    }

    pub fn with_finish_reason(mut self, reason: FinishReason) -> Self {
        self.finish_reason = Some(reason);
        self
    }

    /// Concatenated free text of all text blocks
    pub fn text(&self) -> String {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::ToolUse { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Tool invocations, preserving the model's identifiers.
    ///
    /// An invocation arriving without an id (some backends omit them) gets a
    /// generated one so results can still be keyed.
    pub fn tool_calls(&self) -> Vec<ToolCall> {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                ContentBlock::ToolUse { id, name, input } => {
                    let id = if id.is_empty() {
                        uuid::Uuid::new_v4().to_string()
                    } else {
                        id.clone()
                    };
                    Some(ToolCall::new(id, name.clone(), input.clone()))
                }
                ContentBlock::Text { .. } => None,
            })
            .collect()
    }

    /// Whether the service signalled intent to continue with tools
    pub fn signals_tool_use(&self) -> bool {
        self.finish_reason == Some(FinishReason::ToolUse)
    }
}

/// Provider metadata
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// Provider name (e.g., "Anthropic")
    pub name: String,

    /// Provider version
    pub version: Option<String>,

    /// Whether native tool/function calling is supported
    pub supports_tools: bool,
}

/// Strategy trait for LLM providers
///
/// Implement this trait to add support for new completion backends.
/// The reasoning loop works exclusively through this interface.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get provider information and capabilities
    async fn info(&self) -> Result<ProviderInfo>;

    /// Check if the provider is available and configured correctly
    async fn health_check(&self) -> Result<bool>;

    /// Generate a completion from the transcript, tool schemas, and options
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolSchema],
        options: &GenerationOptions,
    ) -> Result<Completion>;
}
