//! Response Filtering
//!
//! Seam for the masking boundary: every tool-result string passes through
//! [`ResponseFilter::sanitize`] before the LLM observes it, and the final
//! answer is audited with [`ResponseFilter::violations`] before release.
//! Both operations must be backed by the same substitution table.

/// Text boundary applied to everything leaving the engine
pub trait ResponseFilter: Send + Sync {
    /// Rewrite text so no internal identifier survives
    fn sanitize(&self, text: &str) -> String;

    /// Forbidden identifiers still present in the text.
    ///
    /// Non-empty on already-sanitized text means the substitution map and the
    /// forbidden set drifted apart, or the model echoed an injected value;
    /// callers log it and force the text back through [`Self::sanitize`].
    fn violations(&self, text: &str) -> Vec<String>;
}

/// Filter that passes text through unchanged
pub struct NoopFilter;

impl ResponseFilter for NoopFilter {
    fn sanitize(&self, text: &str) -> String {
        text.to_string()
    }

    fn violations(&self, _text: &str) -> Vec<String> {
        Vec::new()
    }
}
