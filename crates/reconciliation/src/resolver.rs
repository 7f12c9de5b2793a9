//! Conversion-value resolution — turns aggregated revenue or direct value
//! observations into a single per-connection number.

use crate::matcher::MatchOutcome;
use crate::validator::{parse_date, RecordValidator};
use chrono::NaiveDate;
use marketpulse_core::types::ExtractionPolicy;
use marketpulse_core::Table;

/// Round to 2 decimal places; conversion values are monetary.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Derived-ratio strategy: `total_revenue / total_conversions`, where the
/// conversion count comes from the ad-side snapshot. Undefined when the
/// campaign has no conversions.
pub fn derived_ratio(total_revenue: f64, conversions: f64) -> Option<f64> {
    if conversions > 0.0 && conversions.is_finite() {
        Some(round2(total_revenue / conversions))
    } else {
        None
    }
}

/// One candidate observation for the direct-value strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub value: f64,
    pub observed_on: Option<NaiveDate>,
}

/// Pull direct-value candidates out of the matched rows of every tab.
pub fn collect_candidates(
    tabs: &[(&Table, MatchOutcome)],
    value_field: &str,
    date_field: Option<&str>,
    validator: &mut RecordValidator,
) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    for (table, outcome) in tabs {
        let Some(value_col) = table.column_index(value_field) else {
            continue;
        };
        let date_col = date_field.and_then(|f| table.column_index(f));
        for &row in &outcome.rows {
            if let Some(value) = validator.parse_cell("conversion_value", table.cell(row, value_col))
            {
                let observed_on = date_col.and_then(|col| parse_date(table.cell(row, col)));
                candidates.push(Candidate { value, observed_on });
            }
        }
    }
    candidates
}

/// Direct-value strategy: select one number out of many candidate
/// observations.
///
/// `Latest` picks the value with the most recent parseable date; `Median`
/// (the default) takes the statistical median, mean-of-two-central for even
/// counts. The result is rounded to 2 decimal places.
pub fn direct_value(candidates: &[Candidate], policy: ExtractionPolicy) -> Option<f64> {
    let picked = match policy {
        ExtractionPolicy::Latest => candidates
            .iter()
            .filter(|c| c.observed_on.is_some())
            .max_by_key(|c| c.observed_on)
            .map(|c| c.value)?,
        ExtractionPolicy::Median => {
            if candidates.is_empty() {
                return None;
            }
            let mut values: Vec<f64> = candidates.iter().map(|c| c.value).collect();
            values.sort_by(|a, b| a.total_cmp(b));
            let mid = values.len() / 2;
            if values.len() % 2 == 1 {
                values[mid]
            } else {
                (values[mid - 1] + values[mid]) / 2.0
            }
        }
    };
    Some(round2(picked))
}
