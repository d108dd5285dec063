//! Universal Identifier Lookup Tool
//!
//! Thin tool wrapper around the cross-store lookup engine. The single `id`
//! parameter takes whatever the merchant pasted: payment id, order id, bank
//! reference, tracking code, deposit or withdrawal id.

use async_trait::async_trait;

use support_core::{
    tool::{ParameterSchema, Tool, ToolCall, ToolResult, ToolSchema},
    Result as CoreResult,
};

use crate::lookup::CrossStoreLookup;
use crate::model::{LookupOutcome, TenantContext};

/// Tool resolving an identifier across all three ledgers
pub struct FindByIdTool {
    engine: CrossStoreLookup,
    ctx: TenantContext,
}

impl FindByIdTool {
    pub fn new(engine: CrossStoreLookup, ctx: TenantContext) -> Self {
        Self { engine, ctx }
    }
}

#[async_trait]
impl Tool for FindByIdTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "find_by_id".into(),
            description: "Find a transaction, withdrawal, or deposit by any identifier the \
                          merchant has: payment id, order id, reference, bank reference, \
                          tracking code, deposit or withdrawal id. Returns up to five of the \
                          most recent matches per ledger; use dates and amounts from the \
                          conversation to disambiguate multiple matches."
                .into(),
            parameters: vec![ParameterSchema::string(
                "id",
                "The identifier exactly as the merchant supplied it",
                true,
            )],
            has_side_effects: false,
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let id = call.str_arg("id").unwrap_or_default();

        let outcome = self
            .engine
            .find(&self.ctx, id)
            .await
            .map_err(|e| support_core::AgentError::ToolExecution(e.to_string()))?;

        let output = match &outcome {
            LookupOutcome::NotFound { message } => message.clone(),
            LookupOutcome::Found { hits } => {
                format!(
                    "{} match(es):\n{}",
                    hits.len(),
                    serde_json::to_string_pretty(hits)
                        .map_err(support_core::AgentError::Json)?
                )
            }
        };

        Ok(ToolResult::success("find_by_id", output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{LedgerStore, MemoryLedgerStore};
    use crate::masking::VendorNameTable;
    use crate::model::{Platform, TenantId};
    use serde_json::json;
    use std::sync::Arc;

    fn ctx() -> TenantContext {
        TenantContext {
            tenant_ids: vec![TenantId(11)],
            display_name: "Acme Retail".into(),
            platform: Platform::Slack,
            channel_id: "C100".into(),
        }
    }

    fn tool() -> FindByIdTool {
        let vendors = Arc::new(
            VendorNameTable::from_entries(&[("paynetix", "card payments")], &[]).unwrap(),
        );
        let store = Arc::new(MemoryLedgerStore::with_documents(
            Arc::clone(&vendors),
            vec![json!({
                "merchant_id": 11, "payment_id": 777, "reference": "REF-7",
                "status": "paid", "amount": 45.5, "currency": "MXN",
                "payment_method": "paynetix", "created_at": "2026-02-11T09:00:00",
            })],
            vec![],
            vec![],
        ));
        FindByIdTool::new(
            CrossStoreLookup::new(store as Arc<dyn LedgerStore>, vendors),
            ctx(),
        )
    }

    #[tokio::test]
    async fn test_found_output_is_structured() {
        let call = ToolCall::new("c1", "find_by_id", json!({"id": "REF-7"}));
        let result = tool().execute(&call).await.unwrap();

        assert!(result.success);
        assert!(result.output.contains("1 match(es)"));
        assert!(result.output.contains("\"transactions\""));
        assert!(result.output.contains("card payments"));
        assert!(!result.output.contains("paynetix"));
    }

    #[tokio::test]
    async fn test_miss_is_quotable_text() {
        let call = ToolCall::new("c2", "find_by_id", json!({"id": "nothing-here"}));
        let result = tool().execute(&call).await.unwrap();

        assert!(result.success);
        assert!(result.output.contains("Acme Retail"));
        assert!(result.output.contains("nothing-here"));
    }
}
