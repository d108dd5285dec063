//! Ledger Access
//!
//! Abstractions over the three backing document-store ledgers. The stores are
//! independently schemaed: equivalent concepts live under different field
//! names, and the "same" identifier may be numeric in one ledger and a string
//! in another. Candidate lookup fields are declared per ledger as data, not
//! conditionals, so adding a ledger or a field is a table change.
//!
//! Every query type carries the tenant scope by construction; there is no way
//! to build one without it.

mod memory;

pub use memory::MemoryLedgerStore;

use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::daterange::DateRange;
use crate::error::Result;
use crate::model::{DeclineReason, StatusCount, TenantId, TransactionStats};

/// One of the three backing stores
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ledger {
    Transactions,
    Withdrawals,
    Deposits,
}

impl std::fmt::Display for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ledger::Transactions => write!(f, "transactions"),
            Ledger::Withdrawals => write!(f, "withdrawals"),
            Ledger::Deposits => write!(f, "deposits"),
        }
    }
}

/// How a candidate field stores the identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// Stored as a string; probe with the raw input
    Text,
    /// Stored as a number; probe with the integer interpretation only
    Numeric,
    /// Seen both ways across documents; probe with both interpretations
    Either,
}

/// One candidate lookup field of a ledger. `path` is dotted for nested
/// documents (e.g. `bank_details.tracking_code`).
#[derive(Clone, Copy, Debug)]
pub struct LedgerFieldSpec {
    pub path: &'static str,
    pub kind: FieldKind,
}

const fn field(path: &'static str, kind: FieldKind) -> LedgerFieldSpec {
    LedgerFieldSpec { path, kind }
}

/// Per-ledger schema description: tenant scoping field, recency field, and
/// the candidate identifier fields
#[derive(Clone, Copy, Debug)]
pub struct LedgerSpec {
    pub ledger: Ledger,
    pub tenant_field: &'static str,
    pub timestamp_field: &'static str,
    pub lookup_fields: &'static [LedgerFieldSpec],
}

pub const TRANSACTIONS_SPEC: LedgerSpec = LedgerSpec {
    ledger: Ledger::Transactions,
    tenant_field: "merchant_id",
    timestamp_field: "created_at",
    lookup_fields: &[
        field("reference", FieldKind::Text),
        field("order_reference", FieldKind::Text),
        field("tracking_code", FieldKind::Text),
        field("payment_id", FieldKind::Either),
        field("order_id", FieldKind::Either),
    ],
};

pub const WITHDRAWALS_SPEC: LedgerSpec = LedgerSpec {
    ledger: Ledger::Withdrawals,
    tenant_field: "company_id",
    timestamp_field: "requested_at",
    lookup_fields: &[
        field("withdrawal_id", FieldKind::Text),
        field("order_reference", FieldKind::Text),
        field("tracking_code", FieldKind::Text),
    ],
};

pub const DEPOSITS_SPEC: LedgerSpec = LedgerSpec {
    ledger: Ledger::Deposits,
    tenant_field: "client_id",
    timestamp_field: "received_at",
    lookup_fields: &[
        field("deposit_id", FieldKind::Text),
        field("checkout_id", FieldKind::Text),
        field("reference", FieldKind::Text),
        field("provider_reference", FieldKind::Text),
        field("order_id", FieldKind::Numeric),
        field("bank_details.tracking_code", FieldKind::Text),
    ],
};

impl LedgerSpec {
    pub fn for_ledger(ledger: Ledger) -> &'static LedgerSpec {
        match ledger {
            Ledger::Transactions => &TRANSACTIONS_SPEC,
            Ledger::Withdrawals => &WITHDRAWALS_SPEC,
            Ledger::Deposits => &DEPOSITS_SPEC,
        }
    }
}

/// A probe value in one of its two interpretations
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MatchValue {
    Text(String),
    Number(i64),
}

/// One field-equals-value clause of an OR-list
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMatch {
    /// Dotted field path
    pub path: String,
    pub value: MatchValue,
}

/// Identifier search against one ledger: tenant scope AND (any clause)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerQuery {
    pub ledger: Ledger,

    /// Tenant scope; always present, never empty for a well-formed request
    pub tenant_ids: Vec<TenantId>,

    /// OR-list of candidate field matches
    pub any_of: Vec<FieldMatch>,

    /// Row cap, most recent first
    pub limit: usize,
}

impl LedgerQuery {
    /// A query is only constructible with an explicit tenant scope.
    pub fn new(ledger: Ledger, scope: &[TenantId], limit: usize) -> Self {
        Self {
            ledger,
            tenant_ids: scope.to_vec(),
            any_of: Vec::new(),
            limit,
        }
    }

    pub fn matching_text(mut self, path: &str, value: impl Into<String>) -> Self {
        self.any_of.push(FieldMatch {
            path: path.to_string(),
            value: MatchValue::Text(value.into()),
        });
        self
    }

    pub fn matching_number(mut self, path: &str, value: i64) -> Self {
        self.any_of.push(FieldMatch {
            path: path.to_string(),
            value: MatchValue::Number(value),
        });
        self
    }
}

/// Aggregate query over a date range, tenant-scoped by construction
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RangeQuery {
    pub tenant_ids: Vec<TenantId>,
    pub range: DateRange,
}

impl RangeQuery {
    pub fn new(scope: &[TenantId], range: DateRange) -> Self {
        Self {
            tenant_ids: scope.to_vec(),
            range,
        }
    }
}

/// Bounded listing query with an optional status filter
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ListQuery {
    pub tenant_ids: Vec<TenantId>,
    pub range: DateRange,
    pub status: Option<String>,
    pub limit: usize,
}

impl ListQuery {
    pub fn new(scope: &[TenantId], range: DateRange, limit: usize) -> Self {
        Self {
            tenant_ids: scope.to_vec(),
            range,
            status: None,
            limit,
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}

/// Read-only access to the three ledgers.
///
/// Implementations own the wire protocol to the document store; this core
/// never sees connection details. The in-memory [`MemoryLedgerStore`] doubles
/// as the query-spec test vehicle: every method receives the full query
/// object, so tests can assert tenant scoping is always present.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Identifier search (used by the cross-store lookup engine)
    async fn search(&self, query: &LedgerQuery) -> Result<Vec<Value>>;

    /// Volume and acceptance aggregates over transactions
    async fn transaction_stats(&self, query: &RangeQuery) -> Result<TransactionStats>;

    /// Declined transactions grouped by reason, descending
    async fn decline_reasons(&self, query: &RangeQuery) -> Result<Vec<DeclineReason>>;

    /// Transactions grouped by status, descending
    async fn status_breakdown(&self, query: &RangeQuery) -> Result<Vec<StatusCount>>;

    /// Bounded transaction listing, most recent first
    async fn list_transactions(&self, query: &ListQuery) -> Result<Vec<Value>>;
}

/// Walk a dotted path through nested objects
pub(crate) fn value_at_path<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = doc;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

pub(crate) fn string_at(doc: &Value, path: &str) -> Option<String> {
    value_at_path(doc, path)
        .and_then(Value::as_str)
        .map(ToString::to_string)
}

pub(crate) fn decimal_at(doc: &Value, path: &str) -> Option<Decimal> {
    match value_at_path(doc, path)? {
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        Value::String(s) => Decimal::from_str(s).ok(),
        _ => None,
    }
}

pub(crate) fn instant_at(doc: &Value, path: &str) -> Option<NaiveDateTime> {
    let raw = value_at_path(doc, path)?.as_str()?;
    parse_instant(raw)
}

/// Parse the timestamp formats the ledgers actually contain
pub(crate) fn parse_instant(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .ok()
        .or_else(|| {
            chrono::DateTime::parse_from_rfc3339(raw)
                .map(|t| t.naive_utc())
                .ok()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_specs_declare_tenant_and_recency_fields() {
        for ledger in [Ledger::Transactions, Ledger::Withdrawals, Ledger::Deposits] {
            let spec = LedgerSpec::for_ledger(ledger);
            assert_eq!(spec.ledger, ledger);
            assert!(!spec.tenant_field.is_empty());
            assert!(!spec.timestamp_field.is_empty());
            assert!(!spec.lookup_fields.is_empty());
        }
    }

    #[test]
    fn test_query_carries_scope_by_construction() {
        let scope = [TenantId(5), TenantId(6)];
        let query = LedgerQuery::new(Ledger::Transactions, &scope, 5)
            .matching_text("reference", "ABC-1")
            .matching_number("order_id", 42);

        assert_eq!(query.tenant_ids, scope.to_vec());
        assert_eq!(query.any_of.len(), 2);
    }
}
