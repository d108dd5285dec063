//! Reasoning Loop
//!
//! The bounded multi-round state machine driving one inbound request:
//!
//! ```text
//! ROUND_START -> LLM_CALL -> { no tool calls -> DONE
//!                            | tool calls    -> EXECUTE_TOOLS -> ROUND_START }
//! ```
//!
//! The round ceiling is a defined terminal outcome, not an error: a
//! non-deterministic planner must be bounded in cost and latency. Rounds are
//! strictly sequential; the invocations inside one round all execute
//! concurrently.

use std::sync::Arc;

use futures::future::join_all;

use crate::error::Result;
use crate::filter::{NoopFilter, ResponseFilter};
use crate::message::{Message, Transcript};
use crate::provider::{GenerationOptions, LlmProvider};
use crate::tool::{ToolRegistry, ToolResult};

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// Hard ceiling on LLM rounds per request
    pub max_rounds: usize,

    /// Fixed answer returned when the ceiling is hit
    pub round_limit_message: String,

    /// Generation options (model, sampling, system prompt)
    pub generation: GenerationOptions,
}

pub const DEFAULT_MAX_ROUNDS: usize = 5;

pub const ROUND_LIMIT_MESSAGE: &str =
    "That question took too many steps to answer. Could you ask something more specific?";

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
            round_limit_message: ROUND_LIMIT_MESSAGE.into(),
            generation: GenerationOptions::default(),
        }
    }
}

/// Outcome of one full loop run
#[derive(Clone, Debug)]
pub struct AgentRun {
    /// Final answer text (already sanitized tool context, not yet audited)
    pub answer: String,

    /// Rounds consumed
    pub rounds: usize,

    /// Whether the round ceiling terminated the run
    pub hit_round_limit: bool,

    /// Whether any executed tool carries side effects (e.g., opened a ticket),
    /// for downstream interaction accounting
    pub ticket_created: bool,

    /// Tool names requested per round, in request order
    pub requested_tools: Vec<Vec<String>>,
}

/// The reasoning loop over one provider, one tool registry, one filter
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    filter: Arc<dyn ResponseFilter>,
    config: AgentConfig,
}

impl Agent {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tools: Arc<ToolRegistry>,
        filter: Arc<dyn ResponseFilter>,
        config: AgentConfig,
    ) -> Self {
        Self {
            provider,
            tools,
            filter,
            config,
        }
    }

    /// Run the loop to completion over a per-request transcript.
    ///
    /// Returns `Err` only for failures the caller converts to its generic
    /// apology (e.g., the completion endpoint unreachable). The round ceiling
    /// and tool failures are defined outcomes, never errors.
    pub async fn run(&self, transcript: &mut Transcript) -> Result<AgentRun> {
        let schemas = self.tools.schemas();
        let mut requested_tools: Vec<Vec<String>> = Vec::new();
        let mut ticket_created = false;

        for round in 1..=self.config.max_rounds {
            let completion = self
                .provider
                .complete(transcript.messages(), &schemas, &self.config.generation)
                .await?;

            let calls = completion.tool_calls();
            let text = completion.text();

            if calls.is_empty() {
                // Terminal regardless of the service's continue signal: a
                // model that claims it wants tools but emits none must not
                // spin the loop.
                if completion.signals_tool_use() {
                    tracing::debug!(round, "stop reason signalled tool use without invocations; treating as terminal");
                }
                transcript.push(Message::assistant(&text));
                return Ok(AgentRun {
                    answer: text,
                    rounds: round,
                    hit_round_limit: false,
                    ticket_created,
                    requested_tools,
                });
            }

            let names: Vec<String> = calls.iter().map(|c| c.name.clone()).collect();
            tracing::info!(round, tools = ?names, "tools requested");
            requested_tools.push(names);

            ticket_created |= calls
                .iter()
                .any(|c| self.tools.has_side_effects(&c.name));

            // Assistant turn goes in verbatim, invocation ids included, so
            // the next round's context pairs results with requests.
            transcript.push(Message::assistant_with_calls(text, calls.clone()));

            // Fan out every invocation of the round; no ordering guarantee
            // among siblings beyond all completing before the round ends.
            let results: Vec<ToolResult> =
                join_all(calls.iter().map(|call| self.tools.dispatch(call))).await;

            let sanitized: Vec<ToolResult> = results
                .into_iter()
                .map(|r| {
                    tracing::debug!(tool = %r.name, id = %r.id, success = r.success, "tool finished");
                    r.map_output(|raw| self.filter.sanitize(raw))
                })
                .collect();

            transcript.push(Message::tool_results(sanitized));
        }

        tracing::info!(max_rounds = self.config.max_rounds, "round ceiling reached");
        Ok(AgentRun {
            answer: self.config.round_limit_message.clone(),
            rounds: self.config.max_rounds,
            hit_round_limit: true,
            ticket_created,
            requested_tools,
        })
    }

    /// Get the tool registry
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Get configuration
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }
}

/// Builder for Agent configuration
pub struct AgentBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    tools: ToolRegistry,
    filter: Arc<dyn ResponseFilter>,
    config: AgentConfig,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            tools: ToolRegistry::new(),
            filter: Arc::new(NoopFilter),
            config: AgentConfig::default(),
        }
    }

    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn tool<T: crate::tool::Tool + 'static>(mut self, tool: T) -> Self {
        self.tools.register(tool);
        self
    }

    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn filter(mut self, filter: Arc<dyn ResponseFilter>) -> Self {
        self.filter = filter;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.generation.system_prompt = Some(prompt.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.generation.model = model.into();
        self
    }

    pub fn max_rounds(mut self, max: usize) -> Self {
        self.config.max_rounds = max;
        self
    }

    pub fn build(self) -> Result<Agent> {
        let provider = self
            .provider
            .ok_or_else(|| crate::error::AgentError::Config("Provider is required".into()))?;

        Ok(Agent::new(
            provider,
            Arc::new(self.tools),
            self.filter,
            self.config,
        ))
    }
}
