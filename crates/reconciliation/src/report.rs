//! Reconciliation report shapes — the data contract exposed to HTTP layers
//! and schedulers. Ephemeral: nothing here is persisted beyond the
//! triggering response.

use crate::matcher::MatchMethod;
use crate::quality::DataQuality;
use chrono::{DateTime, Utc};
use marketpulse_core::types::{ProviderKind, RevenueClassification};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Per-connection outcome, kept even when the campaign-level value is
/// blanked so drill-down UIs can show each source's contribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceResolution {
    pub connection_id: Uuid,
    pub kind: ProviderKind,
    pub resolved_value: Option<f64>,
    pub matched_row_count: usize,
    /// `None` when the provider never produced rows (unavailable or
    /// unmapped).
    pub match_method: Option<MatchMethod>,
    pub classification: Option<RevenueClassification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl SourceResolution {
    /// A resolution for a connection that could not contribute.
    pub fn unavailable(connection_id: Uuid, kind: ProviderKind, warning: String) -> Self {
        Self {
            connection_id,
            kind,
            resolved_value: None,
            matched_row_count: 0,
            match_method: None,
            classification: None,
            warning: Some(warning),
        }
    }
}

/// The full outcome of one reconciliation run for one campaign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub campaign_id: Uuid,
    pub conversion_value: Option<f64>,
    pub derived_metrics: BTreeMap<String, f64>,
    pub revenue_by_source: Vec<SourceResolution>,
    pub data_quality: DataQuality,
    pub generated_at: DateTime<Utc>,
}
