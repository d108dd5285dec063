//! # support-runtime
//!
//! Runtime providers for the merchant support agent. The core stays
//! provider-agnostic; this crate supplies the hosted completion backends.

pub mod anthropic;

pub use anthropic::{AnthropicConfig, AnthropicProvider};
