//! Cross-Store Identifier Lookup
//!
//! Resolves a user-supplied identifier of unknown type (numeric id, UUID,
//! bank reference, tracking code) against the three ledgers at once. The raw
//! input is parsed once; when it also parses as an integer, both
//! interpretations are probed, because the same logical id may be stored as a
//! number in one ledger and a string in another. All three queries run
//! concurrently and every one of them is tenant-scoped by construction.
//!
//! Multiple matches are legitimate: up to five rows per ledger come back,
//! most recent first, and the caller disambiguates from surrounding context.

use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;
use crate::ledger::{
    decimal_at, instant_at, string_at, FieldKind, Ledger, LedgerQuery, LedgerSpec, LedgerStore,
    DEPOSITS_SPEC, TRANSACTIONS_SPEC, WITHDRAWALS_SPEC,
};
use crate::masking::VendorNameTable;
use crate::model::{LookupHit, LookupOutcome, TenantContext};

/// Row cap per ledger
pub const LOOKUP_LIMIT: usize = 5;

/// The cross-store lookup engine
pub struct CrossStoreLookup {
    store: Arc<dyn LedgerStore>,
    vendors: Arc<VendorNameTable>,
}

impl CrossStoreLookup {
    pub fn new(store: Arc<dyn LedgerStore>, vendors: Arc<VendorNameTable>) -> Self {
        Self { store, vendors }
    }

    /// Search all three ledgers for an identifier.
    ///
    /// Hits come back in fixed order (transactions, withdrawals, deposits),
    /// each projected into the common shape. An empty merged result is a
    /// structured not-found carrying a ready-to-quote message.
    pub async fn find(&self, ctx: &TenantContext, raw_id: &str) -> Result<LookupOutcome> {
        let needle = raw_id.trim();
        let as_int: Option<i64> = needle.parse().ok();

        let tx_query = build_query(&TRANSACTIONS_SPEC, ctx, needle, as_int);
        let wd_query = build_query(&WITHDRAWALS_SPEC, ctx, needle, as_int);
        let dp_query = build_query(&DEPOSITS_SPEC, ctx, needle, as_int);

        let (tx, wd, dp) = tokio::join!(
            self.store.search(&tx_query),
            self.store.search(&wd_query),
            self.store.search(&dp_query),
        );

        let mut hits: Vec<LookupHit> = Vec::new();
        hits.extend(tx?.into_iter().map(|doc| self.project_transaction(&doc)));
        hits.extend(wd?.into_iter().map(|doc| project_withdrawal(&doc)));
        hits.extend(dp?.into_iter().map(|doc| project_deposit(&doc)));

        if hits.is_empty() {
            tracing::debug!(id = needle, tenant = %ctx.display_name, "identifier not found in any ledger");
            return Ok(LookupOutcome::NotFound {
                message: format!(
                    "I couldn't find any transaction, withdrawal, or deposit matching \"{}\" \
                     for {}. Please double-check the identifier, or share the approximate \
                     date and amount so I can search another way.",
                    needle, ctx.display_name
                ),
            });
        }

        Ok(LookupOutcome::Found { hits })
    }

    fn project_transaction(&self, doc: &Value) -> LookupHit {
        LookupHit {
            source: Ledger::Transactions,
            id: display_id(doc, "payment_id"),
            status: string_at(doc, "status"),
            amount: decimal_at(doc, "amount"),
            currency: string_at(doc, "currency"),
            created_at: instant_at(doc, "created_at").map(|t| t.and_utc()),
            reference: string_at(doc, "reference"),
            // Masked before the hit ever leaves the engine.
            payment_method: string_at(doc, "payment_method")
                .map(|method| self.vendors.mask_field(&method)),
        }
    }
}

fn build_query(
    spec: &LedgerSpec,
    ctx: &TenantContext,
    needle: &str,
    as_int: Option<i64>,
) -> LedgerQuery {
    let mut query = LedgerQuery::new(spec.ledger, ctx.scope(), LOOKUP_LIMIT);

    for field in spec.lookup_fields {
        match field.kind {
            FieldKind::Text => {
                query = query.matching_text(field.path, needle);
            }
            FieldKind::Numeric => {
                if let Some(n) = as_int {
                    query = query.matching_number(field.path, n);
                }
            }
            FieldKind::Either => {
                query = query.matching_text(field.path, needle);
                if let Some(n) = as_int {
                    query = query.matching_number(field.path, n);
                }
            }
        }
    }

    query
}

fn project_withdrawal(doc: &Value) -> LookupHit {
    LookupHit {
        source: Ledger::Withdrawals,
        id: display_id(doc, "withdrawal_id"),
        status: string_at(doc, "status"),
        amount: decimal_at(doc, "amount"),
        currency: string_at(doc, "currency"),
        created_at: instant_at(doc, "requested_at").map(|t| t.and_utc()),
        reference: string_at(doc, "order_reference"),
        payment_method: None,
    }
}

fn project_deposit(doc: &Value) -> LookupHit {
    LookupHit {
        source: Ledger::Deposits,
        id: display_id(doc, "deposit_id"),
        status: string_at(doc, "status"),
        amount: decimal_at(doc, "amount"),
        currency: string_at(doc, "currency"),
        created_at: instant_at(doc, "received_at").map(|t| t.and_utc()),
        reference: string_at(doc, "reference"),
        payment_method: None,
    }
}

/// Transaction id rendered for display (listings share this with the engine)
pub(crate) fn display_payment_id(doc: &Value) -> String {
    display_id(doc, "payment_id")
}

/// Identifier field rendered for display, whether stored numeric or string
fn display_id(doc: &Value, field: &str) -> String {
    match doc.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryLedgerStore;
    use crate::model::{Platform, TenantId};
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn ctx() -> TenantContext {
        TenantContext {
            tenant_ids: vec![TenantId(11), TenantId(12)],
            display_name: "Acme Retail".into(),
            platform: Platform::Slack,
            channel_id: "C100".into(),
        }
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

    fn engine_with_documents(
        transactions: Vec<Value>,
        withdrawals: Vec<Value>,
        deposits: Vec<Value>,
    ) -> (CrossStoreLookup, Arc<MemoryLedgerStore>) {
        let vendors = vendors();
        let store = Arc::new(MemoryLedgerStore::with_documents(
            Arc::clone(&vendors),
            transactions,
            withdrawals,
            deposits,
        ));
        (
            CrossStoreLookup::new(Arc::clone(&store) as Arc<dyn LedgerStore>, vendors),
            store,
        )
    }

    #[tokio::test]
    async fn test_every_query_is_tenant_scoped() {
        let (engine, store) = engine_with_documents(vec![], vec![], vec![]);
        let _ = engine.find(&ctx(), "anything").await.unwrap();

        let searches = store.recorded_searches();
        assert_eq!(searches.len(), 3);
        for query in searches {
            assert_eq!(query.tenant_ids, vec![TenantId(11), TenantId(12)]);
            assert!(!query.tenant_ids.is_empty());
        }
    }

    #[tokio::test]
    async fn test_numeric_duality() {
        // order_id is stored only as a number in deposits; the user supplies
        // its string form.
        let (engine, _) = engine_with_documents(
            vec![],
            vec![],
            vec![json!({
                "client_id": 11, "deposit_id": "dep_9", "order_id": 123456,
                "status": "credited", "amount": 700.0, "currency": "MXN",
                "received_at": "2026-02-10T08:00:00",
            })],
        );

        let outcome = engine.find(&ctx(), "123456").await.unwrap();
        let LookupOutcome::Found { hits } = outcome else {
            panic!("expected a hit");
        };
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].source, Ledger::Deposits);
        assert_eq!(hits[0].id, "dep_9");
        assert_eq!(hits[0].amount, Some(dec!(700)));
    }

    #[tokio::test]
    async fn test_fixed_source_order_and_masking() {
        let (engine, _) = engine_with_documents(
            vec![json!({
                "merchant_id": 11, "payment_id": 555, "order_id": 1,
                "reference": "SHARED-REF", "status": "paid", "amount": 10.0,
                "currency": "MXN", "payment_method": "paynetix_v2",
                "created_at": "2026-02-11T09:00:00",
            })],
            vec![json!({
                "company_id": 12, "withdrawal_id": "wd_1",
                "order_reference": "SHARED-REF", "status": "pending",
                "amount": 20.0, "currency": "MXN",
                "requested_at": "2026-02-11T10:00:00",
            })],
            vec![json!({
                "client_id": 11, "deposit_id": "dep_2", "reference": "SHARED-REF",
                "status": "credited", "amount": 30.0, "currency": "MXN",
                "received_at": "2026-02-11T11:00:00",
            })],
        );

        let outcome = engine.find(&ctx(), "SHARED-REF").await.unwrap();
        let LookupOutcome::Found { hits } = outcome else {
            panic!("expected hits");
        };

        let sources: Vec<Ledger> = hits.iter().map(|h| h.source).collect();
        assert_eq!(
            sources,
            vec![Ledger::Transactions, Ledger::Withdrawals, Ledger::Deposits]
        );
        assert_eq!(hits[0].payment_method.as_deref(), Some("card payments"));
    }

    #[tokio::test]
    async fn test_not_found_quotes_tenant_and_id() {
        let (engine, _) = engine_with_documents(vec![], vec![], vec![]);

        let outcome = engine.find(&ctx(), " ZX-404 ").await.unwrap();
        let LookupOutcome::NotFound { message } = outcome else {
            panic!("expected not-found");
        };
        assert!(message.contains("Acme Retail"));
        assert!(message.contains("\"ZX-404\""));
    }

    #[tokio::test]
    async fn test_tenant_isolation() {
        // The identifier exists, but under another tenant's scope.
        let (engine, _) = engine_with_documents(
            vec![json!({
                "merchant_id": 99, "payment_id": 555, "reference": "REF-X",
                "status": "paid", "amount": 10.0, "currency": "MXN",
                "payment_method": "paynetix", "created_at": "2026-02-11T09:00:00",
            })],
            vec![],
            vec![],
        );

        let outcome = engine.find(&ctx(), "555").await.unwrap();
        assert!(matches!(outcome, LookupOutcome::NotFound { .. }));
    }
}
