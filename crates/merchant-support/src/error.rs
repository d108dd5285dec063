//! Error Types for the Merchant Support Domain

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SupportError>;

#[derive(Error, Debug)]
pub enum SupportError {
    #[error("Mapping store error: {0}")]
    MappingStore(String),

    #[error("Ledger error: {0}")]
    Ledger(String),

    #[error("Ticket sink error: {0}")]
    TicketSink(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Agent error: {0}")]
    Agent(#[from] support_core::AgentError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
