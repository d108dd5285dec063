//! Vendor-Name Masking
//!
//! Single source of truth for the vendor masking boundary. Three layers share
//! this one table and must never drift apart:
//!
//! 1. query-time collapse of interchangeable internal ids inside the ledger
//!    store ([`VendorNameTable::collapse`]),
//! 2. substitution over every raw tool-result string before the LLM observes
//!    it ([`VendorNameTable::sanitize`]),
//! 3. final-answer audit before release ([`VendorNameTable::violations`]).

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use support_core::filter::ResponseFilter;

use crate::error::{Result, SupportError};

/// The fixed production table. Interchangeable gateway generations collapse
/// into one logical vendor before masking.
static STANDARD_TABLE: LazyLock<Arc<VendorNameTable>> = LazyLock::new(|| {
    Arc::new(
        VendorNameTable::from_entries(
            &[
                ("paynetix", "card payments"),
                ("paynetix_v2", "card payments"),
                ("transfermax", "bank transfer"),
                ("cashlink", "cash payment"),
                ("swiftdeposit", "bank deposit"),
            ],
            &[&["paynetix", "paynetix_v2"]],
        )
        .expect("Invalid vendor table"),
    )
});

/// Bidirectional vendor table: internal id -> public category, plus the
/// authoritative forbidden-id set used by the final-answer audit.
pub struct VendorNameTable {
    /// lowercase internal id -> public display name
    display: HashMap<String, String>,

    /// lowercase internal id -> canonical internal id (layer-1 collapse)
    canonical: HashMap<String, String>,

    /// One compiled case-insensitive word-boundary alternation over every
    /// forbidden id; `None` only for an empty table.
    pattern: Option<Regex>,
}

impl VendorNameTable {
    /// Build a table from (internal id, public name) pairs and groups of
    /// interchangeable ids. The first id of each group is its canonical form.
    pub fn from_entries(entries: &[(&str, &str)], interchangeable: &[&[&str]]) -> Result<Self> {
        let mut display = HashMap::new();
        for (internal, public) in entries {
            display.insert(internal.to_lowercase(), (*public).to_string());
        }

        let mut canonical = HashMap::new();
        for group in interchangeable {
            if let Some(head) = group.first() {
                for member in *group {
                    canonical.insert(member.to_lowercase(), (*head).to_string());
                }
            }
        }

        let pattern = if display.is_empty() {
            None
        } else {
            // Longest first so e.g. "paynetix_v2" wins over "paynetix".
            let mut ids: Vec<String> = display.keys().map(|k| regex::escape(k)).collect();
            ids.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
            let source = format!(r"(?i)\b(?:{})\b", ids.join("|"));
            Some(
                Regex::new(&source)
                    .map_err(|e| SupportError::Config(format!("vendor table regex: {}", e)))?,
            )
        };

        Ok(Self {
            display,
            canonical,
            pattern,
        })
    }

    /// The fixed production table
    pub fn standard() -> Arc<Self> {
        Arc::clone(&STANDARD_TABLE)
    }

    /// Public display name for an internal id, if the id is known
    pub fn public_name(&self, internal: &str) -> Option<&str> {
        self.display.get(&internal.to_lowercase()).map(String::as_str)
    }

    /// Layer 1: merge interchangeable internal ids into one logical vendor.
    /// Unknown ids pass through unchanged.
    pub fn collapse<'a>(&'a self, vendor: &'a str) -> &'a str {
        self.canonical
            .get(&vendor.to_lowercase())
            .map_or(vendor, String::as_str)
    }

    /// Mask a vendor field value: collapse, then substitute the public name.
    /// Values that are not internal ids pass through unchanged.
    pub fn mask_field(&self, vendor: &str) -> String {
        let collapsed = self.collapse(vendor);
        self.public_name(collapsed)
            .map_or_else(|| collapsed.to_string(), ToString::to_string)
    }

    /// Layer 2: global case-insensitive word-boundary substitution of every
    /// internal id with its public name. Idempotent: public names are not in
    /// the forbidden set, so re-running changes nothing.
    pub fn sanitize(&self, text: &str) -> String {
        let Some(pattern) = &self.pattern else {
            return text.to_string();
        };

        pattern
            .replace_all(text, |caps: &regex::Captures<'_>| {
                let matched = &caps[0];
                self.display
                    .get(&matched.to_lowercase())
                    .cloned()
                    .unwrap_or_else(|| matched.to_string())
            })
            .into_owned()
    }

    /// Layer 3: forbidden internal ids still present in the text
    pub fn violations(&self, text: &str) -> Vec<String> {
        let Some(pattern) = &self.pattern else {
            return Vec::new();
        };

        pattern
            .find_iter(text)
            .map(|m| m.as_str().to_lowercase())
            .collect()
    }

    /// The authoritative forbidden-id set
    pub fn forbidden_ids(&self) -> impl Iterator<Item = &str> {
        self.display.keys().map(String::as_str)
    }
}

impl ResponseFilter for VendorNameTable {
    fn sanitize(&self, text: &str) -> String {
        VendorNameTable::sanitize(self, text)
    }

    fn violations(&self, text: &str) -> Vec<String> {
        VendorNameTable::violations(self, text)
    }
}
