//! # merchant-support
//!
//! Multi-tenant merchant support agent. One call answers one chat message:
//!
//! ```text
//! inbound message
//!      │
//!      ▼
//! ┌───────────────┐     unmapped      fixed refusal, zero downstream calls
//! │ TenantResolver│ ───────────────▶
//! └──────┬────────┘
//!        ▼
//! ┌───────────────┐  per round  ┌──────────────┐
//! │ Reasoning Loop│◀───────────▶│ LLM provider │
//! └──────┬────────┘             └──────────────┘
//!        ▼ tool invocations (concurrent)
//! ┌───────────────┐   ┌──────────────────────┐   ┌───────────────┐
//! │ Tool Registry │──▶│ Cross-Store Lookup / │──▶│ three ledgers │
//! └──────┬────────┘   │ analytics / listings │   └───────────────┘
//!        │            └──────────────────────┘
//!        ▼
//!   VendorNameTable masking (query collapse, result sanitize, final audit)
//!        ▼
//!   answer text
//! ```
//!
//! Isolation invariants: no tenant ever sees another tenant's data (every
//! ledger query is tenant-scoped by construction), and no internal vendor
//! identifier ever reaches a merchant (three masking layers over one shared
//! table).

pub mod agent;
pub mod config;
pub mod daterange;
pub mod error;
pub mod ledger;
pub mod lookup;
pub mod masking;
pub mod model;
pub mod tenant;
pub mod tools;

pub use agent::{SupportAgent, APOLOGY_MESSAGE, UNMAPPED_CHANNEL_MESSAGE};
pub use config::SupportConfig;
pub use daterange::DateRange;
pub use error::{Result, SupportError};
pub use ledger::{Ledger, LedgerStore, MemoryLedgerStore};
pub use lookup::CrossStoreLookup;
pub use masking::VendorNameTable;
pub use model::{InboundMessage, LookupHit, LookupOutcome, Platform, TenantContext, TenantId};
pub use tenant::{ChannelBinding, MappingSnapshot, MappingStore, StaticMappingStore, TenantResolver};
pub use tools::{LogTicketSink, TicketSink};
