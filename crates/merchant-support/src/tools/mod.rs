//! Tool Set
//!
//! The fixed tool set offered to the LLM: aggregate analytics, bounded
//! listings, the universal identifier lookup, and ticket escalation. One
//! registry is built per request, closed over that request's tenant context;
//! nothing here can be reached without a resolved tenant scope.

mod analytics;
mod listing;
mod lookup;
mod params;
mod ticket;

pub use analytics::{AcceptanceRateTool, DeclineRankingTool, StatusBreakdownTool, TransactionVolumeTool};
pub use listing::{ListTransactionsTool, LISTING_LIMIT};
pub use lookup::FindByIdTool;
pub use ticket::{CreateTicketTool, LogTicketSink, TicketRequest, TicketSink};

use std::sync::Arc;

use chrono::NaiveDateTime;
use support_core::tool::ToolRegistry;

use crate::ledger::LedgerStore;
use crate::lookup::CrossStoreLookup;
use crate::masking::VendorNameTable;
use crate::model::TenantContext;

/// Build the per-request registry over the fixed tool set
pub fn build_registry(
    ctx: &TenantContext,
    store: Arc<dyn LedgerStore>,
    vendors: Arc<VendorNameTable>,
    sink: Arc<dyn TicketSink>,
    now: NaiveDateTime,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    registry.register(TransactionVolumeTool::new(
        Arc::clone(&store),
        ctx.clone(),
        now,
    ));
    registry.register(AcceptanceRateTool::new(Arc::clone(&store), ctx.clone(), now));
    registry.register(DeclineRankingTool::new(Arc::clone(&store), ctx.clone(), now));
    registry.register(StatusBreakdownTool::new(Arc::clone(&store), ctx.clone(), now));
    registry.register(ListTransactionsTool::new(Arc::clone(&store), ctx.clone(), now));
    registry.register(FindByIdTool::new(
        CrossStoreLookup::new(store, vendors),
        ctx.clone(),
    ));
    registry.register(CreateTicketTool::new(sink, ctx.clone()));

    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryLedgerStore;
    use crate::model::{Platform, TenantId};
    use chrono::NaiveDate;

    #[test]
    fn test_registry_holds_the_fixed_tool_set() {
        let vendors = Arc::new(VendorNameTable::from_entries(&[], &[]).unwrap());
        let store = Arc::new(MemoryLedgerStore::new(Arc::clone(&vendors)));
        let ctx = TenantContext {
            tenant_ids: vec![TenantId(1)],
            display_name: "Acme".into(),
            platform: Platform::Slack,
            channel_id: "C1".into(),
        };
        let now = NaiveDate::from_ymd_opt(2026, 2, 11)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();

        let registry = build_registry(&ctx, store, vendors, Arc::new(LogTicketSink), now);

        assert_eq!(
            registry.names(),
            vec![
                "acceptance_rate",
                "create_support_ticket",
                "find_by_id",
                "list_transactions",
                "status_breakdown",
                "top_decline_reasons",
                "transaction_volume",
            ]
        );
        assert!(registry.has_side_effects("create_support_ticket"));
        assert!(!registry.has_side_effects("find_by_id"));
    }
}
