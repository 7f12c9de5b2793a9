//! KPI derivation — pure function from base counters (plus the chosen
//! conversion value) to the dependent metric map.

use marketpulse_core::CanonicalMetric;
use std::collections::BTreeMap;

/// Derived KPI map plus sanity flags for implausible values.
#[derive(Debug, Clone, Default)]
pub struct DerivedMetrics {
    pub values: BTreeMap<String, f64>,
    pub warnings: Vec<String>,
}

/// Compute the dependent KPI set. Each formula runs only when its
/// denominator is strictly positive; otherwise the key is omitted, never set
/// to zero or NaN. Rate-like results beyond plausible bounds are flagged,
/// not clamped.
pub fn derive(
    counters: &BTreeMap<CanonicalMetric, f64>,
    conversion_value: Option<f64>,
) -> DerivedMetrics {
    let get = |metric: CanonicalMetric| counters.get(&metric).copied();
    let impressions = get(CanonicalMetric::Impressions);
    let clicks = get(CanonicalMetric::Clicks);
    let spend = get(CanonicalMetric::Spend);
    let conversions = get(CanonicalMetric::Conversions);
    let leads = get(CanonicalMetric::Leads);
    let engagements = get(CanonicalMetric::Engagements);

    let mut out = DerivedMetrics::default();

    ratio(&mut out, "ctr", clicks, impressions, 100.0);
    ratio(&mut out, "cpc", spend, clicks, 1.0);
    ratio(&mut out, "cpm", spend, impressions, 1000.0);
    ratio(&mut out, "cvr", conversions, clicks, 100.0);
    ratio(&mut out, "cpa", spend, conversions, 1.0);
    ratio(&mut out, "cpl", spend, leads, 1.0);
    ratio(&mut out, "engagement_rate", engagements, impressions, 100.0);

    if let (Some(value), Some(conversions)) = (conversion_value, conversions) {
        let revenue = conversions * value;
        out.values.insert("revenue".into(), revenue);
        if let Some(spend) = spend {
            out.values.insert("profit".into(), revenue - spend);
            if spend > 0.0 {
                out.values.insert("roi".into(), (revenue - spend) / spend * 100.0);
                out.values.insert("roas".into(), revenue / spend);
            }
        }
        if revenue > 0.0 {
            if let Some(spend) = spend {
                out.values
                    .insert("profit_margin".into(), (revenue - spend) / revenue * 100.0);
            }
        }
    }

    for rate in ["ctr", "cvr", "engagement_rate"] {
        if let Some(&value) = out.values.get(rate) {
            if value > 100.0 {
                out.warnings
                    .push(format!("{rate} is {value:.1}, beyond the plausible 100% bound"));
            }
        }
    }

    out
}

fn ratio(
    out: &mut DerivedMetrics,
    key: &str,
    numerator: Option<f64>,
    denominator: Option<f64>,
    scale: f64,
) {
    if let (Some(numerator), Some(denominator)) = (numerator, denominator) {
        if denominator > 0.0 {
            out.values.insert(key.into(), numerator / denominator * scale);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counters(pairs: &[(CanonicalMetric, f64)]) -> BTreeMap<CanonicalMetric, f64> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn full_kpi_set_with_conversion_value() {
        let counters = counters(&[
            (CanonicalMetric::Impressions, 10_000.0),
            (CanonicalMetric::Clicks, 200.0),
            (CanonicalMetric::Spend, 500.0),
            (CanonicalMetric::Conversions, 20.0),
        ]);
        let derived = derive(&counters, Some(200.0));
        let v = &derived.values;
        assert_eq!(v["ctr"], 2.0);
        assert_eq!(v["cpc"], 2.5);
        assert_eq!(v["cpm"], 50.0);
        assert_eq!(v["cvr"], 10.0);
        assert_eq!(v["cpa"], 25.0);
        assert_eq!(v["revenue"], 4000.0);
        assert_eq!(v["profit"], 3500.0);
        assert_eq!(v["roi"], 700.0);
        assert_eq!(v["roas"], 8.0);
        assert_eq!(v["profit_margin"], 87.5);
        assert!(derived.warnings.is_empty());
    }

    #[test]
    fn zero_denominators_omit_keys_entirely() {
        let counters = counters(&[
            (CanonicalMetric::Impressions, 10_000.0),
            (CanonicalMetric::Clicks, 0.0),
            (CanonicalMetric::Spend, 500.0),
        ]);
        let derived = derive(&counters, None);
        assert_eq!(derived.values["ctr"], 0.0);
        assert!(!derived.values.contains_key("cpc"));
        assert!(!derived.values.contains_key("cvr"));
        assert!(!derived.values.contains_key("revenue"));
    }

    #[test]
    fn missing_counters_omit_their_metrics() {
        let counters = counters(&[(CanonicalMetric::Clicks, 50.0)]);
        let derived = derive(&counters, None);
        assert!(derived.values.is_empty());
    }

    #[test]
    fn implausible_rates_are_flagged_not_clamped() {
        let counters = counters(&[
            (CanonicalMetric::Impressions, 10.0),
            (CanonicalMetric::Clicks, 50.0),
        ]);
        let derived = derive(&counters, None);
        assert_eq!(derived.values["ctr"], 500.0);
        assert_eq!(derived.warnings.len(), 1);
        assert!(derived.warnings[0].contains("ctr"));
    }
}
