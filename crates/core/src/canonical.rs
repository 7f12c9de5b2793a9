//! Canonical metric vocabulary — maps provider-specific key spellings onto a
//! closed set of internal metric names.

use serde::{Deserialize, Serialize};

/// The closed set of metric keys the reconciliation pipeline understands.
///
/// Every provider import is normalized onto this vocabulary before it enters
/// aggregation; downstream code matches exhaustively on these variants
/// instead of string-comparing provider spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalMetric {
    Impressions,
    Clicks,
    Spend,
    Conversions,
    Leads,
    Engagements,
    Reach,
    Sessions,
    Users,
    Pageviews,
    BounceRate,
}

impl CanonicalMetric {
    /// Normalize a raw provider key onto the canonical vocabulary.
    ///
    /// Lower-cases and strips all non-alphanumeric characters before matching
    /// against known synonym lists. Unknown keys return `None` and are
    /// ignored by downstream aggregation, never a hard failure.
    pub fn from_raw(raw: &str) -> Option<Self> {
        let folded: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        let metric = match folded.as_str() {
            "impressions" | "impression" | "totalimpressions" | "adimpressions" => {
                Self::Impressions
            }
            "clicks" | "click" | "totalclicks" | "linkclicks" | "adclicks" => Self::Clicks,
            "spend" | "cost" | "totalspend" | "amountspent" | "costinlocalcurrency" => Self::Spend,
            "conversions"
            | "conversion"
            | "externalwebsiteconversions"
            | "websiteconversions"
            | "purchases"
            | "goalcompletions" => Self::Conversions,
            "leads" | "lead" | "leadgenerationmailinterestedclicks" | "oneclickleads" => {
                Self::Leads
            }
            "engagements" | "engagement" | "totalengagements" | "postengagements" => {
                Self::Engagements
            }
            "reach" | "uniquereach" | "approximateuniqueimpressions" => Self::Reach,
            "sessions" | "gasessions" => Self::Sessions,
            "users" | "gausers" | "uniqueusers" => Self::Users,
            "pageviews" | "gapageviews" | "pageview" => Self::Pageviews,
            "bouncerate" | "gabouncerate" => Self::BounceRate,
            _ => return None,
        };
        Some(metric)
    }

    /// Snake_case name used as a map key in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Impressions => "impressions",
            Self::Clicks => "clicks",
            Self::Spend => "spend",
            Self::Conversions => "conversions",
            Self::Leads => "leads",
            Self::Engagements => "engagements",
            Self::Reach => "reach",
            Self::Sessions => "sessions",
            Self::Users => "users",
            Self::Pageviews => "pageviews",
            Self::BounceRate => "bounce_rate",
        }
    }

    /// Whether this key carries a non-negative count or amount (as opposed
    /// to a bounded rate).
    pub fn is_count_like(&self) -> bool {
        !matches!(self, Self::BounceRate)
    }
}

impl std::fmt::Display for CanonicalMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
