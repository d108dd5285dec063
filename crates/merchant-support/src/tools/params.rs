//! Shared Tool Parameters
//!
//! Every analytics and listing tool accepts the same date-range parameters:
//! a keyword expression, or an explicit ISO start/end pair. Omitting both
//! means "today".

use chrono::NaiveDateTime;
use support_core::tool::{ParameterSchema, ToolCall};

use crate::daterange::{self, DateRange};

pub(crate) fn date_range_parameters() -> Vec<ParameterSchema> {
    vec![
        ParameterSchema::string(
            "date_range",
            "Period expression: today, yesterday, this/last week, this/last month, \
             this/last weekend, 'last N days', 'last N hours', a single ISO date, or \
             'YYYY-MM-DD to YYYY-MM-DD'. Defaults to today when omitted.",
            false,
        ),
        ParameterSchema::string(
            "start_date",
            "Explicit ISO start date (YYYY-MM-DD); use with end_date instead of date_range",
            false,
        ),
        ParameterSchema::string("end_date", "Explicit ISO end date (YYYY-MM-DD)", false),
    ]
}

/// Normalize the shared date-range parameter. An explicit ISO pair wins over
/// the keyword expression; a fallback is surfaced in the range label and the
/// log, never as a failure.
pub(crate) fn resolve_range(call: &ToolCall, now: NaiveDateTime) -> DateRange {
    let range = match (call.str_arg("start_date"), call.str_arg("end_date")) {
        (Some(start), Some(end)) => daterange::resolve_pair(start, end, now),
        _ => call
            .str_arg("date_range")
            .map_or_else(|| daterange::today(now), |expr| daterange::resolve(expr, now)),
    };

    if range.label.contains("unrecognized") {
        tracing::debug!(tool = %call.name, label = %range.label, "date expression fell back to today");
    }

    range
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 2, 11)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_explicit_pair_wins_over_keyword() {
        let call = ToolCall::new(
            "c1",
            "transaction_volume",
            json!({"date_range": "last week", "start_date": "2026-01-01", "end_date": "2026-01-31"}),
        );
        let range = resolve_range(&call, now());
        assert_eq!(range.label, "2026-01-01 to 2026-01-31");
    }

    #[test]
    fn test_omitted_defaults_to_today() {
        let call = ToolCall::new("c2", "transaction_volume", json!({}));
        let range = resolve_range(&call, now());
        assert_eq!(range.label, "today");
        assert_eq!(range.start.date(), now().date());
    }
}
