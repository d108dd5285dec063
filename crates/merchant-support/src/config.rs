//! Configuration

use crate::error::{Result, SupportError};

/// Runtime configuration for the support agent
#[derive(Clone, Debug)]
pub struct SupportConfig {
    /// Completion model identifier
    pub model: String,

    /// Hard ceiling on LLM rounds per request
    pub max_rounds: usize,

    /// Mapping snapshot refresh period, seconds
    pub refresh_interval_secs: u64,
}

impl Default for SupportConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-5".into(),
            max_rounds: support_core::reasoning::DEFAULT_MAX_ROUNDS,
            refresh_interval_secs: 300,
        }
    }
}

impl SupportConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(model) = std::env::var("SUPPORT_MODEL") {
            config.model = model;
        }
        if let Ok(raw) = std::env::var("SUPPORT_MAX_ROUNDS") {
            config.max_rounds = raw
                .parse()
                .map_err(|_| SupportError::Config(format!("SUPPORT_MAX_ROUNDS: {}", raw)))?;
        }
        if let Ok(raw) = std::env::var("SUPPORT_MAPPING_REFRESH_SECS") {
            config.refresh_interval_secs = raw
                .parse()
                .map_err(|_| {
                    SupportError::Config(format!("SUPPORT_MAPPING_REFRESH_SECS: {}", raw))
                })?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SupportConfig::default();
        assert_eq!(config.max_rounds, 5);
        assert_eq!(config.refresh_interval_secs, 300);
    }
}
