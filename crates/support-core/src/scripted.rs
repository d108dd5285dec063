//! Scripted Provider
//!
//! Deterministic [`LlmProvider`] that replays a queued completion sequence.
//! This is how the reasoning loop is tested without a live model: every
//! transition is driven by already-materialized data, so ceiling and terminal
//! behavior assert exactly.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{AgentError, Result};
use crate::message::Message;
use crate::provider::{Completion, GenerationOptions, LlmProvider, ProviderInfo};
use crate::tool::ToolSchema;

/// Snapshot of one `complete` call, for assertions
#[derive(Clone, Debug)]
pub struct RecordedCall {
    /// Number of transcript messages sent
    pub message_count: usize,

    /// Tool names offered in the schema
    pub tool_names: Vec<String>,

    /// System prompt sent with the call
    pub system_prompt: Option<String>,
}

enum Script {
    /// Pop completions in order; error when exhausted
    Sequence(VecDeque<Completion>),
    /// Return the same completion forever (a planner that never terminates)
    Repeating(Completion),
}

/// Provider that replays a scripted completion sequence
pub struct ScriptedProvider {
    script: Mutex<Script>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedProvider {
    /// Replay the given completions in order
    pub fn new(completions: Vec<Completion>) -> Self {
        Self {
            script: Mutex::new(Script::Sequence(completions.into())),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Return the same completion on every call
    pub fn repeating(completion: Completion) -> Self {
        Self {
            script: Mutex::new(Script::Repeating(completion)),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Calls observed so far
    pub fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of completions served
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn info(&self) -> Result<ProviderInfo> {
        Ok(ProviderInfo {
            name: "Scripted".into(),
            version: None,
            supports_tools: true,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolSchema],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                message_count: messages.len(),
                tool_names: tools.iter().map(|t| t.name.clone()).collect(),
                system_prompt: options.system_prompt.clone(),
            });
        }

        let mut script = self
            .script
            .lock()
            .map_err(|_| AgentError::Provider("script lock poisoned".into()))?;

        match &mut *script {
            Script::Sequence(queue) => queue
                .pop_front()
                .ok_or_else(|| AgentError::Provider("scripted sequence exhausted".into())),
            Script::Repeating(completion) => Ok(completion.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sequence_pops_in_order() {
        let provider = ScriptedProvider::new(vec![
            Completion::from_text("first"),
            Completion::from_text("second"),
        ]);

        let opts = GenerationOptions::default();
        let a = provider.complete(&[], &[], &opts).await.unwrap();
        let b = provider.complete(&[], &[], &opts).await.unwrap();
        assert_eq!(a.text(), "first");
        assert_eq!(b.text(), "second");

        let c = provider.complete(&[], &[], &opts).await;
        assert!(c.is_err());
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_repeating_never_exhausts() {
        let provider = ScriptedProvider::repeating(Completion::from_text("again"));
        let opts = GenerationOptions::default();
        for _ in 0..10 {
            let c = provider.complete(&[], &[], &opts).await.unwrap();
            assert_eq!(c.text(), "again");
        }
    }
}
