//! # support-core
//!
//! Core support-agent logic: provider-agnostic LLM abstraction, a closed tool
//! system, and the bounded reasoning loop that ties them together.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Agent                                │
//! │  ┌─────────────┐  ┌─────────────┐  ┌──────────────────────┐  │
//! │  │  Reasoning  │  │    Tool     │  │    LlmProvider       │  │
//! │  │    Loop     │──│   Registry  │──│    (Strategy)        │  │
//! │  └──────┬──────┘  └─────────────┘  └──────────────────────┘  │
//! │         │ ResponseFilter (masking boundary seam)             │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `LlmProvider` trait enables swapping between hosted completion
//! services (or the deterministic [`scripted::ScriptedProvider`]) without
//! changing agent logic. The `ResponseFilter` seam lets the domain layer
//! sanitize every tool result before the model observes it.

pub mod error;
pub mod filter;
pub mod message;
pub mod provider;
pub mod reasoning;
pub mod scripted;
pub mod tool;

pub use error::{AgentError, Result};
pub use filter::ResponseFilter;
pub use message::{Message, Role, Transcript};
pub use provider::{Completion, ContentBlock, FinishReason, GenerationOptions, LlmProvider};
pub use reasoning::{Agent, AgentBuilder, AgentConfig, AgentRun};
pub use scripted::ScriptedProvider;
pub use tool::{Tool, ToolCall, ToolRegistry, ToolResult, ToolSchema};
