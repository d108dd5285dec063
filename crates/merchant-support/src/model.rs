//! Domain Models
//!
//! Core data types for the merchant support system. Tenant ids are opaque:
//! nothing here interprets them beyond equality and scoping.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Opaque tenant (merchant account) identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(pub i64);

impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Chat platform a channel lives on
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Slack,
    Telegram,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Slack => write!(f, "slack"),
            Platform::Telegram => write!(f, "telegram"),
        }
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "slack" => Ok(Platform::Slack),
            "telegram" => Ok(Platform::Telegram),
            other => Err(format!("unknown platform: {}", other)),
        }
    }
}

/// One inbound chat message, as delivered by a platform adapter
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Channel the message arrived on
    pub channel_id: String,

    /// Platform the channel lives on
    pub platform: Platform,

    /// Platform-scoped user id
    pub user_id: String,

    /// Display name of the sender
    pub user_name: String,

    /// Message text
    pub text: String,

    /// Thread id, when the platform threads replies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

impl InboundMessage {
    pub fn new(
        channel_id: impl Into<String>,
        platform: Platform,
        user_id: impl Into<String>,
        user_name: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            channel_id: channel_id.into(),
            platform,
            user_id: user_id.into(),
            user_name: user_name.into(),
            text: text.into(),
            thread_id: None,
        }
    }

    pub fn in_thread(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }
}

/// Resolved tenant scope for one request.
///
/// Derived fresh per message from the current mapping snapshot, never
/// persisted. One channel may be bound to several related tenants; their
/// display name is the deduplicated merge.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TenantContext {
    /// All tenant ids bound to the channel
    pub tenant_ids: Vec<TenantId>,

    /// Merged, deduplicated display name
    pub display_name: String,

    /// Source channel binding
    pub platform: Platform,
    pub channel_id: String,
}

impl TenantContext {
    /// Tenant scope every ledger query must carry
    pub fn scope(&self) -> &[TenantId] {
        &self.tenant_ids
    }
}

/// Aggregate transaction statistics over a date range
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TransactionStats {
    /// All transactions in range
    pub total_count: u64,

    /// Successfully paid transactions
    pub paid_count: u64,

    /// Volume across all transactions
    pub total_volume: Decimal,

    /// Volume across paid transactions
    pub paid_volume: Decimal,
}

impl TransactionStats {
    /// Paid share of all transactions, as a percentage
    pub fn acceptance_rate(&self) -> Decimal {
        if self.total_count == 0 {
            return Decimal::ZERO;
        }
        Decimal::from(self.paid_count) / Decimal::from(self.total_count) * Decimal::from(100)
    }
}

/// One entry of the decline ranking
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeclineReason {
    pub reason: String,
    pub count: u64,
}

/// One entry of the status breakdown
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: String,
    pub count: u64,
}

/// A cross-store lookup hit projected into the common field set
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LookupHit {
    /// Ledger the hit came from
    pub source: crate::ledger::Ledger,

    /// Record identifier in that ledger
    pub id: String,

    /// Record status, when the ledger carries one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Monetary amount
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,

    /// Currency code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    /// Creation instant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Merchant-facing reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    /// Payment method, already masked to its public category
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
}

/// Result of a cross-store identifier lookup
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum LookupOutcome {
    /// Hits in fixed ledger order (transactions, withdrawals, deposits)
    Found { hits: Vec<LookupHit> },

    /// Nothing matched in any ledger; the message is ready to quote
    NotFound { message: String },
}

impl LookupOutcome {
    pub fn found(&self) -> bool {
        matches!(self, LookupOutcome::Found { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_acceptance_rate() {
        let stats = TransactionStats {
            total_count: 200,
            paid_count: 150,
            total_volume: dec!(10000),
            paid_volume: dec!(8000),
        };
        assert_eq!(stats.acceptance_rate(), dec!(75));

        let empty = TransactionStats::default();
        assert_eq!(empty.acceptance_rate(), Decimal::ZERO);
    }

    #[test]
    fn test_platform_parse() {
        assert_eq!("Slack".parse::<Platform>().unwrap(), Platform::Slack);
        assert_eq!("telegram".parse::<Platform>().unwrap(), Platform::Telegram);
        assert!("irc".parse::<Platform>().is_err());
    }
}
