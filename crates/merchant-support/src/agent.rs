//! Support Agent Entrypoint
//!
//! `handle(message) -> answerText` is the whole inbound surface: platform
//! adapters call it and render the returned text. Per message: resolve the
//! tenant (or refuse), build the per-request tool registry and transcript,
//! run the bounded reasoning loop, audit the final answer against the vendor
//! table, and convert any unhandled failure into the generic apology.

use std::sync::Arc;

use chrono::NaiveDateTime;

use support_core::{
    filter::ResponseFilter,
    message::{Message, Transcript},
    provider::{GenerationOptions, LlmProvider},
    reasoning::{Agent, AgentConfig},
};

use crate::config::SupportConfig;
use crate::error::Result;
use crate::ledger::LedgerStore;
use crate::masking::VendorNameTable;
use crate::model::{InboundMessage, TenantContext};
use crate::tenant::TenantResolver;
use crate::tools::{self, TicketSink};

/// Fixed refusal for channels with no tenant binding. Returned with zero
/// downstream calls.
pub const UNMAPPED_CHANNEL_MESSAGE: &str =
    "This channel isn't connected to a merchant account yet, so I can't look anything up \
     from here. Please ask your onboarding contact to link it.";

/// Fixed generic apology for unhandled failures. The underlying error is
/// logged, never shown.
pub const APOLOGY_MESSAGE: &str =
    "Sorry, something went wrong while I was working on that. Please try again in a moment.";

/// The merchant support agent
pub struct SupportAgent {
    resolver: Arc<TenantResolver>,
    store: Arc<dyn LedgerStore>,
    vendors: Arc<VendorNameTable>,
    provider: Arc<dyn LlmProvider>,
    ticket_sink: Arc<dyn TicketSink>,
    config: SupportConfig,
}

impl SupportAgent {
    pub fn new(
        resolver: Arc<TenantResolver>,
        store: Arc<dyn LedgerStore>,
        vendors: Arc<VendorNameTable>,
        provider: Arc<dyn LlmProvider>,
        ticket_sink: Arc<dyn TicketSink>,
        config: SupportConfig,
    ) -> Self {
        Self {
            resolver,
            store,
            vendors,
            provider,
            ticket_sink,
            config,
        }
    }

    /// Answer one inbound message. Never fails: every outcome is text.
    pub async fn handle(&self, message: &InboundMessage) -> String {
        self.handle_at(message, chrono::Local::now().naive_local())
            .await
    }

    async fn handle_at(&self, message: &InboundMessage, now: NaiveDateTime) -> String {
        let Some(ctx) = self
            .resolver
            .resolve(message.platform, &message.channel_id)
        else {
            tracing::info!(
                channel = %message.channel_id,
                platform = %message.platform,
                "message from unmapped channel"
            );
            return UNMAPPED_CHANNEL_MESSAGE.to_string();
        };

        match self.answer(&ctx, message, now).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    channel = %message.channel_id,
                    tenant = %ctx.display_name,
                    "support request failed"
                );
                APOLOGY_MESSAGE.to_string()
            }
        }
    }

    async fn answer(
        &self,
        ctx: &TenantContext,
        message: &InboundMessage,
        now: NaiveDateTime,
    ) -> Result<String> {
        let registry = tools::build_registry(
            ctx,
            Arc::clone(&self.store),
            Arc::clone(&self.vendors),
            Arc::clone(&self.ticket_sink),
            now,
        );

        let generation = GenerationOptions {
            model: self.config.model.clone(),
            ..GenerationOptions::default()
        }
        .with_system_prompt(system_prompt(ctx, now));

        let agent = Agent::new(
            Arc::clone(&self.provider),
            Arc::new(registry),
            Arc::clone(&self.vendors) as Arc<dyn ResponseFilter>,
            AgentConfig {
                max_rounds: self.config.max_rounds,
                generation,
                ..AgentConfig::default()
            },
        );

        let mut transcript = Transcript::new();
        transcript.push(Message::user(&message.text).with_name(&message.user_name));

        let run = agent.run(&mut transcript).await?;

        if run.ticket_created {
            tracing::info!(
                channel = %message.channel_id,
                tenant = %ctx.display_name,
                "interaction opened a support ticket"
            );
        }

        Ok(self.audit(run.answer))
    }

    /// Final-answer audit: should never fire on a healthy masking table.
    /// A hit means the substitution map and forbidden set disagree, or the
    /// model echoed an injected identifier.
    fn audit(&self, answer: String) -> String {
        let violations = self.vendors.violations(&answer);
        if violations.is_empty() {
            return answer;
        }

        tracing::warn!(
            ?violations,
            "forbidden vendor identifiers in final answer, re-sanitizing"
        );
        self.vendors.sanitize(&answer)
    }
}

/// Tenant-parameterized system prompt, rebuilt per request
fn system_prompt(ctx: &TenantContext, now: NaiveDateTime) -> String {
    format!(
        r#"You are the payments support assistant for {name}.

Today's date is {date}.

## Ground Rules

1. Answer only from tool results - never guess amounts, statuses, or dates
2. Everything you can see belongs to {name}; never speculate about other merchants
3. Describe payment methods only by their public category names
4. When an identifier isn't found, relay the not-found message as given
5. Quote ids, references, and amounts exactly as the tools report them

## Tools Available

- `transaction_volume` / `acceptance_rate` / `top_decline_reasons` / `status_breakdown` - period analytics
- `list_transactions` - recent transactions, optionally filtered by status
- `find_by_id` - look up any identifier across transactions, withdrawals, and deposits
- `create_support_ticket` - escalate to a human when asked or when tools can't answer

Keep answers short and concrete."#,
        name = ctx.display_name,
        date = now.format("%A, %Y-%m-%d"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryLedgerStore;
    use crate::model::{Platform, TenantId};
    use crate::tenant::{ChannelBinding, MappingStore, StaticMappingStore};
    use crate::tools::LogTicketSink;
    use chrono::NaiveDate;
    use serde_json::json;
    use support_core::provider::{Completion, ContentBlock, FinishReason};
    use support_core::reasoning::ROUND_LIMIT_MESSAGE;
    use support_core::scripted::ScriptedProvider;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 2, 11)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn vendors() -> Arc<VendorNameTable> {
        Arc::new(
            VendorNameTable::from_entries(
                &[("paynetix", "card payments"), ("paynetix_v2", "card payments")],
                &[&["paynetix", "paynetix_v2"]],
            )
            .unwrap(),
        )
    }

    async fn resolver() -> Arc<TenantResolver> {
        let store: Arc<dyn MappingStore> = Arc::new(StaticMappingStore::new(vec![
            ChannelBinding::new(Platform::Slack, "C100", TenantId(11), "Acme Retail"),
        ]));
        Arc::new(TenantResolver::with_initial_load(store).await.unwrap())
    }

    fn ledger_store(vendors: &Arc<VendorNameTable>) -> Arc<MemoryLedgerStore> {
        Arc::new(MemoryLedgerStore::with_documents(
            Arc::clone(vendors),
            vec![json!({
                "merchant_id": 11, "payment_id": 777, "reference": "REF-7",
                "status": "paid", "amount": 45.5, "currency": "MXN",
                "payment_method": "paynetix_v2", "created_at": "2026-02-11T09:00:00",
            })],
            vec![],
            vec![],
        ))
    }

    async fn support_agent(
        provider: Arc<ScriptedProvider>,
    ) -> (SupportAgent, Arc<MemoryLedgerStore>) {
        let vendors = vendors();
        let store = ledger_store(&vendors);
        let agent = SupportAgent::new(
            resolver().await,
            Arc::clone(&store) as Arc<dyn LedgerStore>,
            vendors,
            provider,
            Arc::new(LogTicketSink),
            SupportConfig::default(),
        );
        (agent, store)
    }

    fn inbound(channel: &str, text: &str) -> InboundMessage {
        InboundMessage::new(channel, Platform::Slack, "U1", "Dana", text)
    }

    #[tokio::test]
    async fn test_unmapped_channel_short_circuits() {
        let provider = Arc::new(ScriptedProvider::new(vec![Completion::from_text("unused")]));
        let (agent, store) = support_agent(Arc::clone(&provider)).await;

        let answer = agent.handle_at(&inbound("C404", "hello?"), now()).await;

        assert_eq!(answer, UNMAPPED_CHANNEL_MESSAGE);
        // Zero downstream calls: no completion requested, no ledger touched.
        assert_eq!(provider.call_count(), 0);
        assert!(store.recorded_searches().is_empty());
    }

    #[tokio::test]
    async fn test_lookup_round_trip() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Completion {
                blocks: vec![ContentBlock::ToolUse {
                    id: "toolu_1".into(),
                    name: "find_by_id".into(),
                    input: json!({"id": "REF-7"}),
                }],
                model: "test".into(),
                usage: None,
                finish_reason: Some(FinishReason::ToolUse),
            },
            Completion::from_text("Payment 777 for 45.50 MXN is paid."),
        ]));
        let (agent, store) = support_agent(Arc::clone(&provider)).await;

        let answer = agent
            .handle_at(&inbound("C100", "what happened to REF-7?"), now())
            .await;

        assert_eq!(answer, "Payment 777 for 45.50 MXN is paid.");

        // Every ledger query the request issued was tenant-scoped.
        let searches = store.recorded_searches();
        assert_eq!(searches.len(), 3);
        assert!(searches.iter().all(|q| q.tenant_ids == vec![TenantId(11)]));

        // Round two saw the grown transcript and the tenant-parameterized prompt.
        let calls = provider.recorded_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].message_count, 1);
        assert_eq!(calls[1].message_count, 3);
        assert!(calls[0]
            .system_prompt
            .as_deref()
            .is_some_and(|p| p.contains("Acme Retail")));
        assert!(calls[0].tool_names.contains(&"find_by_id".to_string()));
    }

    #[tokio::test]
    async fn test_round_ceiling_through_handle() {
        let loop_forever = Completion {
            blocks: vec![ContentBlock::ToolUse {
                id: "toolu_x".into(),
                name: "transaction_volume".into(),
                input: json!({}),
            }],
            model: "test".into(),
            usage: None,
            finish_reason: Some(FinishReason::ToolUse),
        };
        let provider = Arc::new(ScriptedProvider::repeating(loop_forever));
        let (agent, _) = support_agent(Arc::clone(&provider)).await;

        let answer = agent.handle_at(&inbound("C100", "volume?"), now()).await;

        assert_eq!(answer, ROUND_LIMIT_MESSAGE);
        assert_eq!(provider.call_count(), 5);
    }

    #[tokio::test]
    async fn test_provider_failure_becomes_apology() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let (agent, _) = support_agent(provider).await;

        let answer = agent.handle_at(&inbound("C100", "hi"), now()).await;
        assert_eq!(answer, APOLOGY_MESSAGE);
    }

    #[tokio::test]
    async fn test_final_answer_audit_resanitizes() {
        // The model leaks an internal vendor id into its final answer.
        let provider = Arc::new(ScriptedProvider::new(vec![Completion::from_text(
            "Your payment went through Paynetix successfully.",
        )]));
        let (agent, _) = support_agent(provider).await;

        let answer = agent.handle_at(&inbound("C100", "which rail?"), now()).await;
        assert_eq!(answer, "Your payment went through card payments successfully.");
    }
}
