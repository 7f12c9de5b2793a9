//! MarketPulse — marketing-campaign analytics dashboard backend.
//!
//! Entry point for development runs: seeds the in-memory stores with the
//! demo dashboard data and reconciles every campaign once, printing the
//! reports as JSON. Production deployments drive the same engine from a
//! scheduler and real provider clients.

use chrono::Utc;
use clap::Parser;
use marketpulse_connectors::{
    ClientRegistry, InMemoryAdPlatform, InMemoryMappingStore, InMemoryRevenueSource, MappingStore,
};
use marketpulse_core::types::{
    AdImportSnapshot, CampaignIdentity, MappingConfig, ProviderKind, RevenueConnection,
};
use marketpulse_core::{AppConfig, Table};
use marketpulse_reconciliation::ReconciliationEngine;
use marketpulse_store::DashboardStore;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "marketpulse")]
#[command(about = "Marketing-campaign analytics dashboard backend")]
#[command(version)]
struct Cli {
    /// Pretty-print reconciliation reports
    #[arg(long, default_value_t = true)]
    pretty: bool,

    /// Lookback window in days (overrides config)
    #[arg(long, env = "MARKETPULSE__RECONCILIATION__DEFAULT_LOOKBACK_DAYS")]
    lookback_days: Option<u32>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marketpulse=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("MarketPulse starting up");

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });
    if let Some(days) = cli.lookback_days {
        config.reconciliation.default_lookback_days = days;
    }

    let store = DashboardStore::new();
    let ad = InMemoryAdPlatform::new();
    let mappings = InMemoryMappingStore::new();
    let mut clients = ClientRegistry::new();

    let campaigns = store.seed_demo_data();
    seed_ad_imports(&ad, &store);
    seed_sheet_connection(&store, &mappings, &mut clients, &campaigns[0].id);

    let engine = ReconciliationEngine::new(&store, &ad, &clients, &mappings, config.reconciliation);

    for campaign in &campaigns {
        let report = engine.reconcile(campaign.id)?;
        let rendered = if cli.pretty {
            serde_json::to_string_pretty(&report)?
        } else {
            serde_json::to_string(&report)?
        };
        println!("{rendered}");
    }

    info!("Reconciliation sweep complete");
    Ok(())
}

/// Demo ad-side counters, one snapshot per seeded campaign.
fn seed_ad_imports(ad: &InMemoryAdPlatform, store: &DashboardStore) {
    let counters: &[&[(&str, f64)]] = &[
        &[
            ("impressions", 15_420.0),
            ("clicks", 892.0),
            ("spend", 456.78),
            ("conversions", 64.0),
        ],
        &[
            ("impressions", 28_900.0),
            ("clicks", 1_245.0),
            ("spend", 789.50),
            ("conversions", 0.0),
        ],
        &[
            ("impressions", 8_750.0),
            ("clicks", 425.0),
            ("spend", 234.25),
            ("externalWebsiteConversions", 31.0),
        ],
    ];

    for (campaign, raw) in store.list_campaigns().iter().rev().zip(counters) {
        ad.record_import(AdImportSnapshot::from_raw(
            campaign.id,
            Utc::now(),
            raw.iter().map(|&(k, v)| (k, v)),
        ));
        ad.set_identity(
            campaign.id,
            CampaignIdentity {
                ids: Vec::new(),
                name: campaign.name.clone(),
            },
        );
    }
}

/// One revenue-tracking spreadsheet connection for the first demo campaign.
fn seed_sheet_connection(
    store: &DashboardStore,
    mappings: &InMemoryMappingStore,
    clients: &mut ClientRegistry,
    campaign_id: &uuid::Uuid,
) {
    let sheet = InMemoryRevenueSource::new(ProviderKind::TabularSheet);
    let mut connection = RevenueConnection::new(*campaign_id, ProviderKind::TabularSheet);
    connection.used_for_revenue_tracking = true;

    sheet.set_tables(
        connection.id,
        vec![Table::new(
            "Orders",
            vec!["Campaign".into(), "Revenue".into(), "Date".into()],
            vec![
                vec![
                    "Summer Sale Campaign".into(),
                    "$5,400.00".into(),
                    Utc::now().date_naive().to_string(),
                ],
                vec![
                    "Summer Sale Campaign".into(),
                    "$6,200.00".into(),
                    Utc::now().date_naive().to_string(),
                ],
            ],
        )],
    );

    let mapping = MappingConfig {
        name_field: Some("Campaign".into()),
        revenue_field: Some("Revenue".into()),
        date_field: Some("Date".into()),
        ..Default::default()
    };
    mappings.save_mapping(connection.id, mapping.clone());
    connection.mapping = Some(mapping);
    store.add_connection(connection);
    clients.register(Box::new(sheet));
}
