//! Transaction Listing Tool
//!
//! Bounded listing over the transaction ledger with an optional status
//! filter. The row cap is a hard bound; whatever limit the model asks for is
//! clamped to it.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;

use support_core::{
    tool::{ParameterSchema, Tool, ToolCall, ToolResult, ToolSchema},
    Result as CoreResult,
};

use super::params;
use crate::ledger::{decimal_at, instant_at, string_at, LedgerStore, ListQuery};
use crate::model::TenantContext;

/// Hard row cap for listings
pub const LISTING_LIMIT: usize = 25;

const DEFAULT_LIMIT: usize = 10;

/// Tool listing recent transactions
pub struct ListTransactionsTool {
    store: Arc<dyn LedgerStore>,
    ctx: TenantContext,
    now: NaiveDateTime,
}

impl ListTransactionsTool {
    pub fn new(store: Arc<dyn LedgerStore>, ctx: TenantContext, now: NaiveDateTime) -> Self {
        Self { store, ctx, now }
    }
}

#[async_trait]
impl Tool for ListTransactionsTool {
    fn schema(&self) -> ToolSchema {
        let mut parameters = params::date_range_parameters();
        parameters.push(ParameterSchema::string(
            "status",
            "Only list transactions with this status (e.g. paid, declined, pending, refunded)",
            false,
        ));
        parameters.push(ParameterSchema {
            name: "limit".into(),
            param_type: "number".into(),
            description: format!("Maximum rows to return (capped at {})", LISTING_LIMIT),
            required: false,
            enum_values: None,
        });

        ToolSchema {
            name: "list_transactions".into(),
            description: "List recent transactions for a period, most recent first.".into(),
            parameters,
            has_side_effects: false,
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let range = params::resolve_range(call, self.now);
        let limit = call
            .int_arg("limit")
            .map_or(DEFAULT_LIMIT, |n| n.clamp(1, LISTING_LIMIT as i64) as usize);

        let mut query = ListQuery::new(self.ctx.scope(), range.clone(), limit);
        if let Some(status) = call.str_arg("status") {
            query = query.with_status(status);
        }

        let rows = self
            .store
            .list_transactions(&query)
            .await
            .map_err(|e| support_core::AgentError::ToolExecution(e.to_string()))?;

        if rows.is_empty() {
            return Ok(ToolResult::success(
                "list_transactions",
                format!("No matching transactions for {}.", range.label),
            ));
        }

        let mut output = format!("Transactions for {} ({} shown):\n", range.label, rows.len());
        for doc in &rows {
            let instant = instant_at(doc, "created_at")
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "unknown time".into());
            let amount = decimal_at(doc, "amount")
                .map(|a| format!("{:.2}", a))
                .unwrap_or_else(|| "?".into());
            let currency = string_at(doc, "currency").unwrap_or_default();
            let status = string_at(doc, "status").unwrap_or_else(|| "unknown".into());
            let reference = string_at(doc, "reference").unwrap_or_else(|| "-".into());
            let method = string_at(doc, "payment_method").unwrap_or_else(|| "-".into());

            output.push_str(&format!(
                "  {} | id {} | {} {} | {} | {} | ref {}\n",
                instant,
                crate::lookup::display_payment_id(doc),
                amount,
                currency,
                status,
                method,
                reference,
            ));
        }

        Ok(ToolResult::success("list_transactions", output.trim_end()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryLedgerStore;
    use crate::masking::VendorNameTable;
    use crate::model::{Platform, TenantId};
    use chrono::NaiveDate;
    use serde_json::json;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 2, 11)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn ctx() -> TenantContext {
        TenantContext {
            tenant_ids: vec![TenantId(11)],
            display_name: "Acme Retail".into(),
            platform: Platform::Slack,
            channel_id: "C100".into(),
        }
    }

    fn store_with(count: usize) -> Arc<dyn LedgerStore> {
        let vendors = Arc::new(VendorNameTable::from_entries(&[], &[]).unwrap());
        let docs = (0..count)
            .map(|i| {
                json!({
                    "merchant_id": 11, "payment_id": i, "status": "paid",
                    "amount": 10, "currency": "MXN", "reference": format!("R-{}", i),
                    "created_at": format!("2026-02-11T{:02}:00:00", i % 24),
                })
            })
            .collect();
        Arc::new(MemoryLedgerStore::with_documents(vendors, docs, vec![], vec![]))
    }

    #[tokio::test]
    async fn test_limit_clamped_to_cap() {
        let tool = ListTransactionsTool::new(store_with(40), ctx(), now());
        let call = ToolCall::new("c1", "list_transactions", json!({"limit": 100}));

        let result = tool.execute(&call).await.unwrap();
        assert!(result.output.contains(&format!("({} shown)", LISTING_LIMIT)));
    }

    #[tokio::test]
    async fn test_empty_listing_message() {
        let tool = ListTransactionsTool::new(store_with(0), ctx(), now());
        let call = ToolCall::new("c2", "list_transactions", json!({"status": "refunded"}));

        let result = tool.execute(&call).await.unwrap();
        assert!(result.output.contains("No matching transactions"));
    }
}
