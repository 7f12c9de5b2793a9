//! External-collaborator contracts for the reconciliation engine.
//!
//! Provider auth, token refresh, and wire-level HTTP live entirely behind
//! these traits; the engine never sees raw tokens or transport errors, only
//! `PulseResult` values it can isolate per connection.

use chrono::{Duration, NaiveDate, Utc};
use marketpulse_core::types::{
    AdImportSnapshot, CampaignIdentity, MappingConfig, ProviderKind, RevenueConnection,
};
use marketpulse_core::{PulseResult, Table};
use std::collections::HashMap;
use uuid::Uuid;

/// Inclusive date window for a revenue fetch, derived from the mapping's
/// lookback setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FetchWindow {
    pub fn from_lookback(days: u32) -> Self {
        let end = Utc::now().date_naive();
        Self {
            start: end - Duration::days(i64::from(days)),
            end,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// The authoritative ad-delivery source: engagement counters and the ad
/// platform's own identity for each campaign.
pub trait AdPlatformClient: Send + Sync {
    /// Latest import of ad-side counters, by `imported_at`. `None` when the
    /// campaign has never been imported.
    fn latest_snapshot(&self, campaign_id: Uuid) -> PulseResult<Option<AdImportSnapshot>>;

    /// The campaign identifiers the ad platform knows this campaign by.
    fn known_identifiers(&self, campaign_id: Uuid) -> PulseResult<CampaignIdentity>;

    /// Propagate (or clear) the campaign-level conversion value on the
    /// latest import session. No-op when the campaign has no snapshot.
    fn store_conversion_value(&self, campaign_id: Uuid, value: Option<f64>) -> PulseResult<()>;
}

/// One revenue-bearing business system (spreadsheet, CRM object, order
/// ledger). A fetch returns every selected tab/page of the connection.
pub trait RevenueSourceClient: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn fetch_tables(
        &self,
        connection: &RevenueConnection,
        window: &FetchWindow,
    ) -> PulseResult<Vec<Table>>;
}

/// Persistence seam for user-declared mapping configs.
pub trait MappingStore: Send + Sync {
    fn get_mapping(&self, connection_id: Uuid) -> Option<MappingConfig>;
    fn save_mapping(&self, connection_id: Uuid, mapping: MappingConfig);
}

/// Routes each provider kind to its configured client.
#[derive(Default)]
pub struct ClientRegistry {
    clients: HashMap<ProviderKind, Box<dyn RevenueSourceClient>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, client: Box<dyn RevenueSourceClient>) {
        self.clients.insert(client.kind(), client);
    }

    pub fn get(&self, kind: ProviderKind) -> Option<&dyn RevenueSourceClient> {
        self.clients.get(&kind).map(Box::as_ref)
    }
}
