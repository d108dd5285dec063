//! In-Memory Ledger Store
//!
//! For tests and demos. Documents are plain JSON values shaped like the
//! production ledgers; matching, scoping, sorting, and the layer-1 vendor
//! collapse behave like the real store so the engine above is exercised
//! faithfully. Search queries are recorded so tests can assert on the exact
//! query specs the engine issued.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;

use super::{
    decimal_at, instant_at, value_at_path, FieldMatch, Ledger, LedgerQuery, LedgerSpec,
    LedgerStore, ListQuery, MatchValue, RangeQuery,
};
use crate::error::Result;
use crate::masking::VendorNameTable;
use crate::model::{DeclineReason, StatusCount, TenantId, TransactionStats};

/// In-memory ledger store backed by JSON documents
pub struct MemoryLedgerStore {
    transactions: Vec<Value>,
    withdrawals: Vec<Value>,
    deposits: Vec<Value>,
    vendors: Arc<VendorNameTable>,
    recorded: Mutex<Vec<LedgerQuery>>,
}

impl MemoryLedgerStore {
    pub fn new(vendors: Arc<VendorNameTable>) -> Self {
        Self {
            transactions: Vec::new(),
            withdrawals: Vec::new(),
            deposits: Vec::new(),
            vendors,
            recorded: Mutex::new(Vec::new()),
        }
    }

    pub fn with_documents(
        vendors: Arc<VendorNameTable>,
        transactions: Vec<Value>,
        withdrawals: Vec<Value>,
        deposits: Vec<Value>,
    ) -> Self {
        let mut store = Self::new(vendors);
        store.transactions = transactions;
        store.withdrawals = withdrawals;
        store.deposits = deposits;
        store
    }

    /// Search queries observed so far (for query-spec assertions)
    pub fn recorded_searches(&self) -> Vec<LedgerQuery> {
        self.recorded.lock().unwrap().clone()
    }

    fn documents(&self, ledger: Ledger) -> &[Value] {
        match ledger {
            Ledger::Transactions => &self.transactions,
            Ledger::Withdrawals => &self.withdrawals,
            Ledger::Deposits => &self.deposits,
        }
    }

    fn in_scope(doc: &Value, tenant_field: &str, scope: &[TenantId]) -> bool {
        value_at_path(doc, tenant_field)
            .and_then(Value::as_i64)
            .is_some_and(|id| scope.contains(&TenantId(id)))
    }

    fn matches_any(doc: &Value, clauses: &[FieldMatch]) -> bool {
        clauses.iter().any(|clause| {
            match (&clause.value, value_at_path(doc, &clause.path)) {
                (MatchValue::Text(expected), Some(Value::String(actual))) => actual == expected,
                (MatchValue::Number(expected), Some(actual)) => actual.as_i64() == Some(*expected),
                _ => false,
            }
        })
    }

    fn sort_recent_first(docs: &mut [Value], timestamp_field: &str) {
        docs.sort_by(|a, b| {
            let ta = instant_at(a, timestamp_field);
            let tb = instant_at(b, timestamp_field);
            tb.cmp(&ta)
        });
    }

    /// Layer-1 collapse: interchangeable vendor generations merge into one
    /// logical bucket before the row leaves storage.
    fn collapse_vendor(&self, mut doc: Value) -> Value {
        if let Some(method) = doc.get("payment_method").and_then(Value::as_str) {
            let collapsed = self.vendors.collapse(method).to_string();
            doc["payment_method"] = Value::String(collapsed);
        }
        doc
    }

    fn transactions_in_range<'a>(&'a self, query: &'a RangeQuery) -> impl Iterator<Item = &'a Value> {
        let spec = &super::TRANSACTIONS_SPEC;
        self.transactions.iter().filter(move |doc| {
            Self::in_scope(doc, spec.tenant_field, &query.tenant_ids)
                && instant_at(doc, spec.timestamp_field)
                    .is_some_and(|t| query.range.contains(t))
        })
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn search(&self, query: &LedgerQuery) -> Result<Vec<Value>> {
        self.recorded.lock().unwrap().push(query.clone());

        let spec = LedgerSpec::for_ledger(query.ledger);
        let mut hits: Vec<Value> = self
            .documents(query.ledger)
            .iter()
            .filter(|doc| Self::in_scope(doc, spec.tenant_field, &query.tenant_ids))
            .filter(|doc| Self::matches_any(doc, &query.any_of))
            .cloned()
            .collect();

        Self::sort_recent_first(&mut hits, spec.timestamp_field);
        hits.truncate(query.limit);

        if query.ledger == Ledger::Transactions {
            hits = hits.into_iter().map(|doc| self.collapse_vendor(doc)).collect();
        }

        Ok(hits)
    }

    async fn transaction_stats(&self, query: &RangeQuery) -> Result<TransactionStats> {
        let mut stats = TransactionStats::default();

        for doc in self.transactions_in_range(query) {
            let amount = decimal_at(doc, "amount").unwrap_or(Decimal::ZERO);
            stats.total_count += 1;
            stats.total_volume += amount;

            if doc.get("status").and_then(Value::as_str) == Some("paid") {
                stats.paid_count += 1;
                stats.paid_volume += amount;
            }
        }

        Ok(stats)
    }

    async fn decline_reasons(&self, query: &RangeQuery) -> Result<Vec<DeclineReason>> {
        let mut counts: std::collections::HashMap<String, u64> = std::collections::HashMap::new();

        for doc in self.transactions_in_range(query) {
            if doc.get("status").and_then(Value::as_str) != Some("declined") {
                continue;
            }
            let reason = doc
                .get("decline_reason")
                .and_then(Value::as_str)
                .unwrap_or("unspecified")
                .to_string();
            *counts.entry(reason).or_insert(0) += 1;
        }

        let mut ranking: Vec<DeclineReason> = counts
            .into_iter()
            .map(|(reason, count)| DeclineReason { reason, count })
            .collect();
        ranking.sort_by(|a, b| b.count.cmp(&a.count).then(a.reason.cmp(&b.reason)));
        Ok(ranking)
    }

    async fn status_breakdown(&self, query: &RangeQuery) -> Result<Vec<StatusCount>> {
        let mut counts: std::collections::HashMap<String, u64> = std::collections::HashMap::new();

        for doc in self.transactions_in_range(query) {
            let status = doc
                .get("status")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string();
            *counts.entry(status).or_insert(0) += 1;
        }

        let mut breakdown: Vec<StatusCount> = counts
            .into_iter()
            .map(|(status, count)| StatusCount { status, count })
            .collect();
        breakdown.sort_by(|a, b| b.count.cmp(&a.count).then(a.status.cmp(&b.status)));
        Ok(breakdown)
    }

    async fn list_transactions(&self, query: &ListQuery) -> Result<Vec<Value>> {
        let range_query = RangeQuery::new(&query.tenant_ids, query.range.clone());
        let mut rows: Vec<Value> = self
            .transactions_in_range(&range_query)
            .filter(|doc| {
                query
                    .status
                    .as_deref()
                    .is_none_or(|wanted| doc.get("status").and_then(Value::as_str) == Some(wanted))
            })
            .cloned()
            .collect();

        Self::sort_recent_first(&mut rows, super::TRANSACTIONS_SPEC.timestamp_field);
        rows.truncate(query.limit);
        Ok(rows.into_iter().map(|doc| self.collapse_vendor(doc)).collect())
    }
}
