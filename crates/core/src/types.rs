//! Shared domain types for the MarketPulse dashboard backend.

use crate::canonical::CanonicalMetric;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Active,
    Paused,
    Completed,
    Draft,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub name: String,
    pub campaign_type: String,
    pub platform: String,
    pub status: CampaignStatus,
    /// Campaign-level conversion value chosen by the precedence manager.
    /// Null whenever no single revenue source is authoritative.
    pub conversion_value: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The ad platform's own identity for a campaign, used by the matcher to
/// recognize rows in arbitrary revenue sources.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CampaignIdentity {
    pub ids: Vec<u64>,
    pub name: String,
}

/// One ingestion of ad-platform counters at a point in time.
///
/// Append-only: newer snapshots supersede older ones by `imported_at`, they
/// never overwrite them. Reconciliation always reads the latest snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdImportSnapshot {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub imported_at: DateTime<Utc>,
    pub metrics: BTreeMap<CanonicalMetric, f64>,
    pub conversion_value: Option<f64>,
}

impl AdImportSnapshot {
    /// Build a snapshot from raw provider (key, value) pairs, normalizing
    /// keys onto the canonical vocabulary. Unknown keys are dropped.
    pub fn from_raw<I, S>(campaign_id: Uuid, imported_at: DateTime<Utc>, raw: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut metrics = BTreeMap::new();
        for (key, value) in raw {
            if let Some(metric) = CanonicalMetric::from_raw(key.as_ref()) {
                metrics.insert(metric, value);
            }
        }
        Self {
            id: Uuid::new_v4(),
            campaign_id,
            imported_at,
            metrics,
            conversion_value: None,
        }
    }

    pub fn metric(&self, metric: CanonicalMetric) -> Option<f64> {
        self.metrics.get(&metric).copied()
    }
}

/// Closed set of revenue-source provider kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    TabularSheet,
    CrmDeal,
    CrmOpportunity,
    OrderLedger,
}

/// Whether revenue from a source is already counted by the ad platform's own
/// conversion tracking (onsite) or is incremental to it (offsite).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevenueClassification {
    Onsite,
    Offsite,
}

impl Default for RevenueClassification {
    fn default() -> Self {
        Self::Onsite
    }
}

/// How a direct conversion-value figure is extracted when the source carries
/// several candidate observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionPolicy {
    /// Most recent observation by the mapped date column.
    Latest,
    /// Statistical median of all candidates; robust to one anomalous tab.
    Median,
}

impl Default for ExtractionPolicy {
    fn default() -> Self {
        Self::Median
    }
}

/// User-declared semantics for one revenue connection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MappingConfig {
    /// Column holding ad-platform campaign IDs.
    pub id_field: Option<String>,
    /// Column holding campaign names.
    pub name_field: Option<String>,
    /// Explicit crosswalk selection: one identifier value the user picked.
    pub selected_identifier: Option<String>,
    /// Column holding raw transaction revenue (derived-ratio strategy).
    pub revenue_field: Option<String>,
    /// Column holding a pre-computed conversion-value figure (direct-value
    /// strategy). Takes precedence over `revenue_field` when both are set.
    pub value_field: Option<String>,
    pub date_field: Option<String>,
    pub currency_field: Option<String>,
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
    #[serde(default)]
    pub classification: RevenueClassification,
    #[serde(default)]
    pub extraction: ExtractionPolicy,
}

fn default_lookback_days() -> u32 {
    30
}

impl MappingConfig {
    /// A mapping qualifies for revenue tracking only when it declares both an
    /// identifier column and a revenue-or-value column. Partial mappings are
    /// treated as non-tracking.
    pub fn is_complete(&self) -> bool {
        let has_identifier = self.id_field.is_some() || self.name_field.is_some();
        let has_value = self.revenue_field.is_some() || self.value_field.is_some();
        has_identifier && has_value
    }

    /// Whether the connection supplies a pre-computed conversion value rather
    /// than raw revenue.
    pub fn uses_direct_value(&self) -> bool {
        self.value_field.is_some()
    }
}

/// A configured link to one revenue-bearing business system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueConnection {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub kind: ProviderKind,
    pub active: bool,
    pub used_for_revenue_tracking: bool,
    pub mapping: Option<MappingConfig>,
    /// This connection's own resolved conversion value, retained for
    /// drill-down even when the campaign-level value is blanked.
    pub conversion_value: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RevenueConnection {
    pub fn new(campaign_id: Uuid, kind: ProviderKind) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            campaign_id,
            kind,
            active: true,
            used_for_revenue_tracking: false,
            mapping: None,
            conversion_value: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// True only for active connections flagged for revenue tracking whose
    /// mapping is complete. An incomplete mapping demotes the connection to
    /// non-tracking rather than failing the run.
    pub fn is_revenue_tracking(&self) -> bool {
        self.active
            && self.used_for_revenue_tracking
            && self.mapping.as_ref().is_some_and(MappingConfig::is_complete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_ingestion_normalizes_and_drops_unknown_keys() {
        let snapshot = AdImportSnapshot::from_raw(
            Uuid::new_v4(),
            Utc::now(),
            vec![
                ("externalWebsiteConversions".to_string(), 20.0),
                ("impressions".to_string(), 10_000.0),
                ("videoQuartile25".to_string(), 55.0),
            ],
        );
        assert_eq!(snapshot.metric(CanonicalMetric::Conversions), Some(20.0));
        assert_eq!(snapshot.metric(CanonicalMetric::Impressions), Some(10_000.0));
        assert_eq!(snapshot.metrics.len(), 2);
    }

    #[test]
    fn partial_mapping_is_not_revenue_tracking() {
        let mut conn = RevenueConnection::new(Uuid::new_v4(), ProviderKind::TabularSheet);
        conn.used_for_revenue_tracking = true;
        assert!(!conn.is_revenue_tracking());

        // Identifier without a revenue column stays non-tracking.
        conn.mapping = Some(MappingConfig {
            id_field: Some("Campaign ID".into()),
            ..Default::default()
        });
        assert!(!conn.is_revenue_tracking());

        let mapping = conn.mapping.as_mut().unwrap();
        mapping.revenue_field = Some("Revenue".into());
        assert!(conn.is_revenue_tracking());
    }

    #[test]
    fn inactive_connection_never_tracks() {
        let mut conn = RevenueConnection::new(Uuid::new_v4(), ProviderKind::OrderLedger);
        conn.used_for_revenue_tracking = true;
        conn.mapping = Some(MappingConfig {
            id_field: Some("campaign".into()),
            revenue_field: Some("total".into()),
            ..Default::default()
        });
        conn.active = false;
        assert!(!conn.is_revenue_tracking());
    }
}
