//! Data-quality scoring — one 0-100 confidence rating and letter grade per
//! reconciliation run.

use marketpulse_core::CanonicalMetric;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataQuality {
    pub score: f64,
    pub grade: String,
    pub warnings: Vec<String>,
}

/// Cross-metric relationship checks over the ad-side counters. Violations
/// are reported, never silently corrected.
pub fn relationship_checks(
    counters: &BTreeMap<CanonicalMetric, f64>,
    conversion_tolerance: f64,
) -> Vec<String> {
    let get = |metric: CanonicalMetric| counters.get(&metric).copied();
    let mut failures = Vec::new();

    if let (Some(clicks), Some(impressions)) =
        (get(CanonicalMetric::Clicks), get(CanonicalMetric::Impressions))
    {
        if clicks > impressions {
            failures.push(format!(
                "clicks ({clicks}) exceed impressions ({impressions})"
            ));
        }
    }
    if let (Some(conversions), Some(clicks)) =
        (get(CanonicalMetric::Conversions), get(CanonicalMetric::Clicks))
    {
        // Tolerance band for legitimately multi-touch conversions.
        if conversions > clicks * conversion_tolerance {
            failures.push(format!(
                "conversions ({conversions}) exceed clicks ({clicks}) beyond tolerance"
            ));
        }
    }
    if let (Some(leads), Some(impressions)) =
        (get(CanonicalMetric::Leads), get(CanonicalMetric::Impressions))
    {
        if leads > impressions {
            failures.push(format!("leads ({leads}) exceed impressions ({impressions})"));
        }
    }

    failures
}

/// `100 * passed / total`, reduced by `penalty` points per relationship
/// failure, clamped to [0, 100]. A run with no observations scores from a
/// base of 100.
pub fn score(total: usize, passed: usize, relationship_failures: usize, penalty: f64) -> f64 {
    let base = if total > 0 {
        100.0 * passed as f64 / total as f64
    } else {
        100.0
    };
    (base - penalty * relationship_failures as f64).clamp(0.0, 100.0)
}

/// Fixed grade bands over the 0-100 score.
pub fn grade(score: f64) -> &'static str {
    if score >= 90.0 {
        "A"
    } else if score >= 75.0 {
        "B"
    } else if score >= 60.0 {
        "C"
    } else if score >= 40.0 {
        "D"
    } else {
        "F"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counters(pairs: &[(CanonicalMetric, f64)]) -> BTreeMap<CanonicalMetric, f64> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn grade_bands() {
        assert_eq!(grade(100.0), "A");
        assert_eq!(grade(90.0), "A");
        assert_eq!(grade(89.9), "B");
        assert_eq!(grade(75.0), "B");
        assert_eq!(grade(60.0), "C");
        assert_eq!(grade(40.0), "D");
        assert_eq!(grade(39.9), "F");
    }

    #[test]
    fn score_applies_relationship_penalty() {
        assert_eq!(score(10, 10, 0, 10.0), 100.0);
        assert_eq!(score(10, 9, 1, 10.0), 80.0);
        assert_eq!(score(0, 0, 0, 10.0), 100.0);
        assert_eq!(score(2, 0, 5, 10.0), 0.0);
    }

    #[test]
    fn clicks_cannot_exceed_impressions() {
        let failures = relationship_checks(
            &counters(&[
                (CanonicalMetric::Clicks, 500.0),
                (CanonicalMetric::Impressions, 100.0),
            ]),
            1.1,
        );
        assert_eq!(failures.len(), 1);
        assert!(failures[0].contains("clicks"));
    }

    #[test]
    fn conversion_tolerance_allows_multi_touch() {
        let within = counters(&[
            (CanonicalMetric::Conversions, 105.0),
            (CanonicalMetric::Clicks, 100.0),
        ]);
        assert!(relationship_checks(&within, 1.1).is_empty());

        let beyond = counters(&[
            (CanonicalMetric::Conversions, 150.0),
            (CanonicalMetric::Clicks, 100.0),
        ]);
        assert_eq!(relationship_checks(&beyond, 1.1).len(), 1);
    }

    #[test]
    fn missing_counters_skip_their_checks() {
        let failures = relationship_checks(&counters(&[(CanonicalMetric::Clicks, 500.0)]), 1.1);
        assert!(failures.is_empty());
    }
}
