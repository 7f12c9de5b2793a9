//! In-memory dashboard store backed by DashMap.
//!
//! Holds campaigns and their revenue connections. Production: replace with
//! PostgreSQL (sqlx) or similar ACID store; this provides the same API
//! surface for development and testing.

use chrono::Utc;
use dashmap::DashMap;
use marketpulse_core::types::{Campaign, CampaignStatus, MappingConfig, RevenueConnection};
use tracing::info;
use uuid::Uuid;

/// Thread-safe in-memory store for campaigns and revenue connections.
#[derive(Default)]
pub struct DashboardStore {
    campaigns: DashMap<Uuid, Campaign>,
    connections: DashMap<Uuid, RevenueConnection>,
}

impl DashboardStore {
    pub fn new() -> Self {
        info!("Dashboard store initialized (in-memory, development mode)");
        Self::default()
    }

    // ─── Campaigns ─────────────────────────────────────────────────────────

    pub fn create_campaign(
        &self,
        name: &str,
        campaign_type: &str,
        platform: &str,
        status: CampaignStatus,
    ) -> Campaign {
        let now = Utc::now();
        let campaign = Campaign {
            id: Uuid::new_v4(),
            name: name.to_string(),
            campaign_type: campaign_type.to_string(),
            platform: platform.to_string(),
            status,
            conversion_value: None,
            created_at: now,
            updated_at: now,
        };
        self.campaigns.insert(campaign.id, campaign.clone());
        campaign
    }

    pub fn get_campaign(&self, id: Uuid) -> Option<Campaign> {
        self.campaigns.get(&id).map(|c| c.clone())
    }

    pub fn list_campaigns(&self) -> Vec<Campaign> {
        let mut campaigns: Vec<Campaign> =
            self.campaigns.iter().map(|c| c.value().clone()).collect();
        campaigns.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        campaigns
    }

    pub fn delete_campaign(&self, id: Uuid) -> bool {
        // Connections owned by the campaign go with it.
        self.connections.retain(|_, c| c.campaign_id != id);
        self.campaigns.remove(&id).is_some()
    }

    pub fn set_campaign_conversion_value(&self, id: Uuid, value: Option<f64>) {
        if let Some(mut campaign) = self.campaigns.get_mut(&id) {
            campaign.conversion_value = value;
            campaign.updated_at = Utc::now();
        }
    }

    // ─── Revenue connections ───────────────────────────────────────────────

    pub fn add_connection(&self, connection: RevenueConnection) -> Uuid {
        let id = connection.id;
        self.connections.insert(id, connection);
        id
    }

    pub fn get_connection(&self, id: Uuid) -> Option<RevenueConnection> {
        self.connections.get(&id).map(|c| c.clone())
    }

    /// All connections for a campaign, active or not, newest first.
    pub fn connections_for_campaign(&self, campaign_id: Uuid) -> Vec<RevenueConnection> {
        let mut connections: Vec<RevenueConnection> = self
            .connections
            .iter()
            .filter(|c| c.campaign_id == campaign_id)
            .map(|c| c.value().clone())
            .collect();
        connections.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        connections
    }

    pub fn update_mapping(&self, connection_id: Uuid, mapping: MappingConfig) {
        if let Some(mut connection) = self.connections.get_mut(&connection_id) {
            connection.used_for_revenue_tracking = mapping.is_complete();
            connection.mapping = Some(mapping);
            connection.updated_at = Utc::now();
        }
    }

    /// Common removal path: the connection stays on record, inactive.
    pub fn deactivate_connection(&self, id: Uuid) -> Option<RevenueConnection> {
        let mut connection = self.connections.get_mut(&id)?;
        connection.active = false;
        connection.conversion_value = None;
        connection.updated_at = Utc::now();
        Some(connection.clone())
    }

    /// Hard delete. Callers must re-run precedence evaluation for the owning
    /// campaign whenever the removed connection was revenue-tracking.
    pub fn remove_connection(&self, id: Uuid) -> Option<RevenueConnection> {
        self.connections.remove(&id).map(|(_, c)| c)
    }

    pub fn set_connection_conversion_value(&self, id: Uuid, value: Option<f64>) {
        if let Some(mut connection) = self.connections.get_mut(&id) {
            connection.conversion_value = value;
            connection.updated_at = Utc::now();
        }
    }

    // ─── Demo data ─────────────────────────────────────────────────────────

    /// Seed the three demo campaigns the dashboard ships with.
    pub fn seed_demo_data(&self) -> Vec<Campaign> {
        let campaigns = vec![
            self.create_campaign(
                "Summer Sale Campaign",
                "conversions",
                "Facebook",
                CampaignStatus::Active,
            ),
            self.create_campaign(
                "Brand Awareness Push",
                "awareness",
                "Google Ads",
                CampaignStatus::Active,
            ),
            self.create_campaign(
                "Retargeting Campaign",
                "conversions",
                "LinkedIn",
                CampaignStatus::Paused,
            ),
        ];
        info!(count = campaigns.len(), "Seeded demo campaigns");
        campaigns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketpulse_core::types::ProviderKind;

    #[test]
    fn deactivation_clears_connection_value_but_keeps_record() {
        let store = DashboardStore::new();
        let campaign = store.create_campaign("Q4 Wine", "conversions", "LinkedIn", CampaignStatus::Active);

        let mut connection = RevenueConnection::new(campaign.id, ProviderKind::TabularSheet);
        connection.conversion_value = Some(42.0);
        let id = store.add_connection(connection);

        let deactivated = store.deactivate_connection(id).unwrap();
        assert!(!deactivated.active);
        assert_eq!(deactivated.conversion_value, None);
        assert!(store.get_connection(id).is_some());
    }

    #[test]
    fn update_mapping_promotes_complete_mappings_to_tracking() {
        let store = DashboardStore::new();
        let campaign = store.create_campaign("Q4 Wine", "conversions", "LinkedIn", CampaignStatus::Active);
        let id = store.add_connection(RevenueConnection::new(campaign.id, ProviderKind::CrmDeal));

        store.update_mapping(
            id,
            MappingConfig {
                id_field: Some("Campaign".into()),
                ..Default::default()
            },
        );
        assert!(!store.get_connection(id).unwrap().used_for_revenue_tracking);

        store.update_mapping(
            id,
            MappingConfig {
                id_field: Some("Campaign".into()),
                revenue_field: Some("Amount".into()),
                ..Default::default()
            },
        );
        assert!(store.get_connection(id).unwrap().is_revenue_tracking());
    }

    #[test]
    fn deleting_campaign_removes_its_connections() {
        let store = DashboardStore::new();
        let campaign = store.create_campaign("Q4 Wine", "conversions", "LinkedIn", CampaignStatus::Active);
        let id = store.add_connection(RevenueConnection::new(campaign.id, ProviderKind::OrderLedger));

        assert!(store.delete_campaign(campaign.id));
        assert!(store.get_connection(id).is_none());
    }
}
