//! Record validation — schema and range checks on individual observations
//! before they enter aggregation.

use chrono::NaiveDate;
use marketpulse_core::CanonicalMetric;
use serde::Serialize;

/// Declared unit for rate-like observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateUnit {
    /// Bounded by [0, 100].
    Percent,
    /// Bounded by [0, 1].
    Fraction,
}

/// One failed observation, kept for the data-quality scorer and the report
/// warning list.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationError {
    pub metric: String,
    pub value: String,
    pub campaign: String,
    pub reason: String,
}

/// Collects pass/fail outcomes across one reconciliation run.
pub struct RecordValidator {
    campaign: String,
    total: usize,
    passed: usize,
    errors: Vec<ValidationError>,
}

impl RecordValidator {
    pub fn new(campaign: impl Into<String>) -> Self {
        Self {
            campaign: campaign.into(),
            total: 0,
            passed: 0,
            errors: Vec::new(),
        }
    }

    /// Validate an ad-side counter against the canonical vocabulary rules.
    pub fn check_metric(&mut self, metric: CanonicalMetric, value: f64) -> bool {
        if metric.is_count_like() {
            self.check(metric.as_str(), value, value.is_finite() && value >= 0.0, "count must be a finite, non-negative number")
        } else {
            self.check_rate(metric.as_str(), value, RateUnit::Percent)
        }
    }

    /// Validate a rate-like observation against its declared unit.
    pub fn check_rate(&mut self, name: &str, value: f64, unit: RateUnit) -> bool {
        let (upper, reason) = match unit {
            RateUnit::Percent => (100.0, "rate must lie in [0, 100]"),
            RateUnit::Fraction => (1.0, "rate must lie in [0, 1]"),
        };
        let ok = value.is_finite() && (0.0..=upper).contains(&value);
        self.check(name, value, ok, reason)
    }

    /// Parse a loosely-typed numeric cell. Empty cells carry no observation
    /// and are skipped; non-empty unparseable cells fail closed and are
    /// recorded against the quality score.
    pub fn parse_cell(&mut self, metric: &str, raw: &str) -> Option<f64> {
        if raw.trim().is_empty() {
            return None;
        }
        self.total += 1;
        match parse_numeric(raw) {
            Some(value) => {
                self.passed += 1;
                Some(value)
            }
            None => {
                self.record_failure(metric, raw, "value is not parseable as a number");
                None
            }
        }
    }

    fn check(&mut self, metric: &str, value: f64, ok: bool, reason: &str) -> bool {
        self.total += 1;
        if ok {
            self.passed += 1;
        } else {
            self.record_failure(metric, &value.to_string(), reason);
        }
        ok
    }

    fn record_failure(&mut self, metric: &str, value: &str, reason: &str) {
        self.errors.push(ValidationError {
            metric: metric.to_string(),
            value: value.to_string(),
            campaign: self.campaign.clone(),
            reason: reason.to_string(),
        });
    }

    pub fn totals(&self) -> (usize, usize) {
        (self.total, self.passed)
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }
}

/// Parse a numeric cell after stripping currency symbols, thousands
/// separators, and surrounding whitespace. Rejects non-finite results.
pub fn parse_numeric(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | '€' | '£' | '¥' | ',' | ' '))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a date cell, tolerating the formats revenue sources commonly use.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    // RFC 3339 timestamps: keep the date part.
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.date_naive());
    }
    for format in ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }
    None
}
