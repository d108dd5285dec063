//! Aggregate Analytics Tools
//!
//! Volume, acceptance rate, decline ranking, and status breakdown over the
//! transaction ledger, all scoped to the request's tenant context.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;

use support_core::{
    tool::{Tool, ToolCall, ToolResult, ToolSchema},
    Result as CoreResult,
};

use super::params;
use crate::error::SupportError;
use crate::ledger::{LedgerStore, RangeQuery};
use crate::model::TenantContext;

fn store_error(e: SupportError) -> support_core::AgentError {
    support_core::AgentError::ToolExecution(e.to_string())
}

/// Tool for transaction volume over a period
pub struct TransactionVolumeTool {
    store: Arc<dyn LedgerStore>,
    ctx: TenantContext,
    now: NaiveDateTime,
}

impl TransactionVolumeTool {
    pub fn new(store: Arc<dyn LedgerStore>, ctx: TenantContext, now: NaiveDateTime) -> Self {
        Self { store, ctx, now }
    }
}

#[async_trait]
impl Tool for TransactionVolumeTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "transaction_volume".into(),
            description: "Total transaction count and volume for a period, with the paid subset."
                .into(),
            parameters: params::date_range_parameters(),
            has_side_effects: false,
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let range = params::resolve_range(call, self.now);
        let query = RangeQuery::new(self.ctx.scope(), range.clone());
        let stats = self
            .store
            .transaction_stats(&query)
            .await
            .map_err(store_error)?;

        Ok(ToolResult::success(
            "transaction_volume",
            format!(
                "Period {}: {} transactions, total volume {:.2}; {} paid with paid volume {:.2}.",
                range.label,
                stats.total_count,
                stats.total_volume,
                stats.paid_count,
                stats.paid_volume,
            ),
        ))
    }
}

/// Tool for the paid share of transactions
pub struct AcceptanceRateTool {
    store: Arc<dyn LedgerStore>,
    ctx: TenantContext,
    now: NaiveDateTime,
}

impl AcceptanceRateTool {
    pub fn new(store: Arc<dyn LedgerStore>, ctx: TenantContext, now: NaiveDateTime) -> Self {
        Self { store, ctx, now }
    }
}

#[async_trait]
impl Tool for AcceptanceRateTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "acceptance_rate".into(),
            description: "Share of transactions that were successfully paid in a period.".into(),
            parameters: params::date_range_parameters(),
            has_side_effects: false,
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let range = params::resolve_range(call, self.now);
        let query = RangeQuery::new(self.ctx.scope(), range.clone());
        let stats = self
            .store
            .transaction_stats(&query)
            .await
            .map_err(store_error)?;

        if stats.total_count == 0 {
            return Ok(ToolResult::success(
                "acceptance_rate",
                format!("No transactions found for {}.", range.label),
            ));
        }

        Ok(ToolResult::success(
            "acceptance_rate",
            format!(
                "Acceptance for {}: {:.1}% ({} of {} transactions paid).",
                range.label,
                stats.acceptance_rate(),
                stats.paid_count,
                stats.total_count,
            ),
        ))
    }
}

/// Tool ranking decline reasons by frequency
pub struct DeclineRankingTool {
    store: Arc<dyn LedgerStore>,
    ctx: TenantContext,
    now: NaiveDateTime,
}

impl DeclineRankingTool {
    pub fn new(store: Arc<dyn LedgerStore>, ctx: TenantContext, now: NaiveDateTime) -> Self {
        Self { store, ctx, now }
    }
}

#[async_trait]
impl Tool for DeclineRankingTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "top_decline_reasons".into(),
            description: "Declined transactions in a period, grouped by reason and ranked.".into(),
            parameters: params::date_range_parameters(),
            has_side_effects: false,
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let range = params::resolve_range(call, self.now);
        let query = RangeQuery::new(self.ctx.scope(), range.clone());
        let ranking = self
            .store
            .decline_reasons(&query)
            .await
            .map_err(store_error)?;

        if ranking.is_empty() {
            return Ok(ToolResult::success(
                "top_decline_reasons",
                format!("No declined transactions for {}.", range.label),
            ));
        }

        let mut output = format!("Decline reasons for {}:\n", range.label);
        for (i, entry) in ranking.iter().enumerate() {
            output.push_str(&format!("  {}. {} - {} declines\n", i + 1, entry.reason, entry.count));
        }

        Ok(ToolResult::success("top_decline_reasons", output.trim_end()))
    }
}

/// Tool breaking transactions down by status
pub struct StatusBreakdownTool {
    store: Arc<dyn LedgerStore>,
    ctx: TenantContext,
    now: NaiveDateTime,
}

impl StatusBreakdownTool {
    pub fn new(store: Arc<dyn LedgerStore>, ctx: TenantContext, now: NaiveDateTime) -> Self {
        Self { store, ctx, now }
    }
}

#[async_trait]
impl Tool for StatusBreakdownTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "status_breakdown".into(),
            description: "Transaction counts grouped by status for a period.".into(),
            parameters: params::date_range_parameters(),
            has_side_effects: false,
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let range = params::resolve_range(call, self.now);
        let query = RangeQuery::new(self.ctx.scope(), range.clone());
        let breakdown = self
            .store
            .status_breakdown(&query)
            .await
            .map_err(store_error)?;

        if breakdown.is_empty() {
            return Ok(ToolResult::success(
                "status_breakdown",
                format!("No transactions found for {}.", range.label),
            ));
        }

        let mut output = format!("Status breakdown for {}:\n", range.label);
        for entry in &breakdown {
            output.push_str(&format!("  {}: {}\n", entry.status, entry.count));
        }

        Ok(ToolResult::success("status_breakdown", output.trim_end()))
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

    fn store() -> Arc<dyn LedgerStore> {
        let vendors = Arc::new(VendorNameTable::from_entries(&[], &[]).unwrap());
        Arc::new(MemoryLedgerStore::with_documents(
            vendors,
            vec![
                json!({"merchant_id": 11, "payment_id": 1, "status": "paid",
                       "amount": 100, "created_at": "2026-02-11T08:00:00"}),
                json!({"merchant_id": 11, "payment_id": 2, "status": "declined",
                       "decline_reason": "card_expired", "amount": 50,
                       "created_at": "2026-02-11T09:00:00"}),
                json!({"merchant_id": 99, "payment_id": 3, "status": "paid",
                       "amount": 400, "created_at": "2026-02-11T10:00:00"}),
            ],
            vec![],
            vec![],
        ))
    }

    #[tokio::test]
    async fn test_volume_scoped_to_tenant() {
        let tool = TransactionVolumeTool::new(store(), ctx(), now());
        let call = ToolCall::new("c1", "transaction_volume", json!({}));

        let result = tool.execute(&call).await.unwrap();
        assert!(result.success);
        assert!(result.output.contains("2 transactions"));
        assert!(result.output.contains("150.00"));
    }

    #[tokio::test]
    async fn test_acceptance_rate() {
        let tool = AcceptanceRateTool::new(store(), ctx(), now());
        let call = ToolCall::new("c2", "acceptance_rate", json!({"date_range": "today"}));

        let result = tool.execute(&call).await.unwrap();
        assert!(result.output.contains("50.0%"));
    }

    #[tokio::test]
    async fn test_decline_ranking() {
        let tool = DeclineRankingTool::new(store(), ctx(), now());
        let call = ToolCall::new("c3", "top_decline_reasons", json!({}));

        let result = tool.execute(&call).await.unwrap();
        assert!(result.output.contains("card_expired"));
        assert!(result.output.contains("1 declines"));
    }

    #[tokio::test]
    async fn test_breakdown_empty_range() {
        let tool = StatusBreakdownTool::new(store(), ctx(), now());
        let call = ToolCall::new("c4", "status_breakdown", json!({"date_range": "2025-01-01"}));

        let result = tool.execute(&call).await.unwrap();
        assert!(result.output.contains("No transactions"));
    }
}
