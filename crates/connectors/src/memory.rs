//! In-memory client and store implementations, used by the binary in
//! development mode and by tests. Production deployments substitute real
//! provider clients behind the same traits.

use crate::provider::{AdPlatformClient, FetchWindow, MappingStore, RevenueSourceClient};
use dashmap::DashMap;
use marketpulse_core::types::{
    AdImportSnapshot, CampaignIdentity, MappingConfig, ProviderKind, RevenueConnection,
};
use marketpulse_core::{MarketPulseError, PulseResult, Table};
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

/// Ad-platform client backed by an append-only snapshot log per campaign.
#[derive(Default)]
pub struct InMemoryAdPlatform {
    snapshots: DashMap<Uuid, Vec<AdImportSnapshot>>,
    identities: DashMap<Uuid, CampaignIdentity>,
}

impl InMemoryAdPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a snapshot. Older imports are superseded, never deleted.
    pub fn record_import(&self, snapshot: AdImportSnapshot) {
        self.snapshots
            .entry(snapshot.campaign_id)
            .or_default()
            .push(snapshot);
    }

    pub fn set_identity(&self, campaign_id: Uuid, identity: CampaignIdentity) {
        self.identities.insert(campaign_id, identity);
    }

}

impl AdPlatformClient for InMemoryAdPlatform {
    fn latest_snapshot(&self, campaign_id: Uuid) -> PulseResult<Option<AdImportSnapshot>> {
        Ok(self.snapshots.get(&campaign_id).and_then(|entry| {
            entry
                .iter()
                .max_by_key(|s| s.imported_at)
                .cloned()
        }))
    }

    fn known_identifiers(&self, campaign_id: Uuid) -> PulseResult<CampaignIdentity> {
        Ok(self
            .identities
            .get(&campaign_id)
            .map(|i| i.clone())
            .unwrap_or_default())
    }

    fn store_conversion_value(&self, campaign_id: Uuid, value: Option<f64>) -> PulseResult<()> {
        if let Some(mut entry) = self.snapshots.get_mut(&campaign_id) {
            if let Some(latest) = entry.iter_mut().max_by_key(|s| s.imported_at) {
                latest.conversion_value = value;
            }
        }
        Ok(())
    }
}

/// Revenue-source client serving canned tables per connection. The
/// unavailability toggle exercises the engine's per-connection isolation.
pub struct InMemoryRevenueSource {
    kind: ProviderKind,
    tables: DashMap<Uuid, Vec<Table>>,
    unavailable: AtomicBool,
}

impl InMemoryRevenueSource {
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            tables: DashMap::new(),
            unavailable: AtomicBool::new(false),
        }
    }

    pub fn set_tables(&self, connection_id: Uuid, tables: Vec<Table>) {
        self.tables.insert(connection_id, tables);
    }

    /// Simulate an auth/network outage for this provider.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

impl RevenueSourceClient for InMemoryRevenueSource {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn fetch_tables(
        &self,
        connection: &RevenueConnection,
        _window: &FetchWindow,
    ) -> PulseResult<Vec<Table>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(MarketPulseError::ProviderUnavailable(format!(
                "{:?} provider is not reachable",
                self.kind
            )));
        }
        Ok(self
            .tables
            .get(&connection.id)
            .map(|t| t.clone())
            .unwrap_or_default())
    }
}

/// Mapping store backed by a concurrent map.
#[derive(Default)]
pub struct InMemoryMappingStore {
    mappings: DashMap<Uuid, MappingConfig>,
}

impl InMemoryMappingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MappingStore for InMemoryMappingStore {
    fn get_mapping(&self, connection_id: Uuid) -> Option<MappingConfig> {
        self.mappings.get(&connection_id).map(|m| m.clone())
    }

    fn save_mapping(&self, connection_id: Uuid, mapping: MappingConfig) {
        tracing::debug!(%connection_id, "Mapping config saved");
        self.mappings.insert(connection_id, mapping);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn latest_snapshot_wins_by_imported_at() {
        let ad = InMemoryAdPlatform::new();
        let campaign = Uuid::new_v4();

        let older = AdImportSnapshot::from_raw(
            campaign,
            Utc::now() - Duration::hours(2),
            vec![("clicks", 100.0)],
        );
        let newer =
            AdImportSnapshot::from_raw(campaign, Utc::now(), vec![("clicks", 250.0)]);
        // Insert out of order; ordering comes from timestamps, not append order.
        ad.record_import(newer.clone());
        ad.record_import(older);

        let latest = ad.latest_snapshot(campaign).unwrap().unwrap();
        assert_eq!(latest.id, newer.id);
    }

    #[test]
    fn unavailable_provider_returns_error_not_empty() {
        let source = InMemoryRevenueSource::new(ProviderKind::CrmDeal);
        source.set_unavailable(true);
        let connection = RevenueConnection::new(Uuid::new_v4(), ProviderKind::CrmDeal);
        let result = source.fetch_tables(&connection, &FetchWindow::from_lookback(30));
        assert!(matches!(
            result,
            Err(MarketPulseError::ProviderUnavailable(_))
        ));
    }
}
