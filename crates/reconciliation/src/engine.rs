//! Reconciliation pipeline — one campaign per call: match, aggregate,
//! resolve, apply precedence, derive KPIs, score quality.
//!
//! Each connection's pipeline is isolated; a single provider failure becomes
//! a warning on that source and never aborts the run. Recomputation is
//! always total, so re-running on unchanged inputs is idempotent.

use crate::matcher::{self, MatchMethod, MatchOutcome};
use crate::precedence::{self, TrackingSource};
use crate::quality::{self, DataQuality};
use crate::report::{ReconciliationReport, SourceResolution};
use crate::validator::RecordValidator;
use crate::{aggregator, derive, resolver};
use chrono::Utc;
use marketpulse_connectors::{AdPlatformClient, ClientRegistry, FetchWindow, MappingStore};
use marketpulse_core::config::ReconciliationConfig;
use marketpulse_core::types::{MappingConfig, RevenueConnection};
use marketpulse_core::{CanonicalMetric, MarketPulseError, PulseResult, Table};
use marketpulse_store::DashboardStore;
use tracing::{info, warn};
use uuid::Uuid;

pub struct ReconciliationEngine<'a> {
    store: &'a DashboardStore,
    ad: &'a dyn AdPlatformClient,
    clients: &'a ClientRegistry,
    mappings: &'a dyn MappingStore,
    config: ReconciliationConfig,
}

impl<'a> ReconciliationEngine<'a> {
    pub fn new(
        store: &'a DashboardStore,
        ad: &'a dyn AdPlatformClient,
        clients: &'a ClientRegistry,
        mappings: &'a dyn MappingStore,
        config: ReconciliationConfig,
    ) -> Self {
        Self {
            store,
            ad,
            clients,
            mappings,
            config,
        }
    }

    /// Reconcile one campaign. Only campaign-not-found escalates; every
    /// per-connection failure is folded into the report.
    pub fn reconcile(&self, campaign_id: Uuid) -> PulseResult<ReconciliationReport> {
        let campaign = self
            .store
            .get_campaign(campaign_id)
            .ok_or(MarketPulseError::CampaignNotFound(campaign_id))?;

        let mut warnings = Vec::new();

        let snapshot = match self.ad.latest_snapshot(campaign_id) {
            Ok(snapshot) => {
                if snapshot.is_none() {
                    warnings.push("no ad-side import snapshot; counters are empty".to_string());
                }
                snapshot
            }
            Err(e) => {
                warn!(%campaign_id, error = %e, "Ad platform unavailable");
                warnings.push(format!("ad platform unavailable: {e}"));
                None
            }
        };
        let counters = snapshot.map(|s| s.metrics).unwrap_or_default();

        let identity = match self.ad.known_identifiers(campaign_id) {
            Ok(identity) => identity,
            Err(e) => {
                warnings.push(format!("ad-platform identifiers unavailable: {e}"));
                Default::default()
            }
        };

        let mut validator = RecordValidator::new(&campaign.name);
        for (&metric, &value) in &counters {
            validator.check_metric(metric, value);
        }

        let mut sources = Vec::new();
        let mut tracking: Vec<TrackingSource> = Vec::new();
        for connection in self
            .store
            .connections_for_campaign(campaign_id)
            .into_iter()
            .filter(|c| c.active)
        {
            // The effective mapping is resolved once and drives both the
            // per-source resolution and the tracking decision below, so the
            // two can never disagree about a connection's status.
            let mapping = self.effective_mapping(&connection);
            let tracks = connection.used_for_revenue_tracking
                && mapping.as_ref().is_some_and(MappingConfig::is_complete);
            let resolution = match self.resolve_connection(
                &connection,
                mapping,
                &identity,
                &counters,
                &mut validator,
            ) {
                Ok(resolution) => resolution,
                Err(e) => {
                    warn!(
                        %campaign_id,
                        connection_id = %connection.id,
                        error = %e,
                        "Revenue connection failed; continuing with remaining sources"
                    );
                    SourceResolution::unavailable(connection.id, connection.kind, e.to_string())
                }
            };
            self.store
                .set_connection_conversion_value(connection.id, resolution.resolved_value);
            // Connections that were demoted (incomplete mapping) or never
            // flagged stay out of the precedence set.
            if tracks {
                tracking.push(TrackingSource {
                    connection_id: connection.id,
                    resolved_value: resolution.resolved_value,
                });
            }
            sources.push(resolution);
        }

        let conversion_value =
            precedence::evaluate(campaign_id, &tracking, self.store, self.ad)?;

        let derived = derive::derive(&counters, conversion_value);
        warnings.extend(derived.warnings);

        let relationship_failures =
            quality::relationship_checks(&counters, self.config.relationship_tolerance);
        let (total, passed) = validator.totals();
        let score = quality::score(
            total,
            passed,
            relationship_failures.len(),
            self.config.relationship_penalty,
        );
        warnings.extend(relationship_failures);
        for error in validator.errors() {
            warnings.push(format!(
                "invalid {} value {:?}: {}",
                error.metric, error.value, error.reason
            ));
        }
        warnings.extend(sources.iter().filter_map(|s| s.warning.clone()));

        info!(
            %campaign_id,
            sources = sources.len(),
            conversion_value = ?conversion_value,
            score,
            "Reconciliation complete"
        );

        Ok(ReconciliationReport {
            campaign_id,
            conversion_value,
            derived_metrics: derived.values,
            revenue_by_source: sources,
            data_quality: DataQuality {
                score,
                grade: quality::grade(score).to_string(),
                warnings,
            },
            generated_at: Utc::now(),
        })
    }

    /// Hard-delete a connection. Removal of a tracking source always
    /// triggers a full re-evaluation of the owning campaign, never a
    /// partial patch.
    pub fn remove_connection(&self, connection_id: Uuid) -> PulseResult<()> {
        let removed = self
            .store
            .remove_connection(connection_id)
            .ok_or(MarketPulseError::ConnectionNotFound(connection_id))?;
        let was_tracking = removed.active
            && removed.used_for_revenue_tracking
            && self
                .effective_mapping(&removed)
                .is_some_and(|m| m.is_complete());
        if was_tracking {
            self.reconcile(removed.campaign_id)?;
        }
        Ok(())
    }

    /// Deactivate a connection (the common removal path) and re-evaluate.
    pub fn deactivate_connection(&self, connection_id: Uuid) -> PulseResult<()> {
        let deactivated = self
            .store
            .deactivate_connection(connection_id)
            .ok_or(MarketPulseError::ConnectionNotFound(connection_id))?;
        self.reconcile(deactivated.campaign_id)?;
        Ok(())
    }

    /// The mapping in force for a connection: the persisted one from the
    /// mapping store when present, the inline one on the record otherwise.
    fn effective_mapping(&self, connection: &RevenueConnection) -> Option<MappingConfig> {
        self.mappings
            .get_mapping(connection.id)
            .or_else(|| connection.mapping.clone())
    }

    fn resolve_connection(
        &self,
        connection: &RevenueConnection,
        mapping: Option<MappingConfig>,
        identity: &marketpulse_core::types::CampaignIdentity,
        counters: &std::collections::BTreeMap<CanonicalMetric, f64>,
        validator: &mut RecordValidator,
    ) -> PulseResult<SourceResolution> {
        let Some(mapping) = mapping else {
            return Ok(SourceResolution::unavailable(
                connection.id,
                connection.kind,
                "no mapping configured".to_string(),
            ));
        };
        if !mapping.is_complete() {
            // Safe default: a partial mapping demotes the connection to
            // non-tracking instead of failing the run.
            return Ok(SourceResolution::unavailable(
                connection.id,
                connection.kind,
                "mapping incomplete; connection treated as non-tracking".to_string(),
            ));
        }

        let client = self.clients.get(connection.kind).ok_or_else(|| {
            MarketPulseError::ProviderUnavailable(format!(
                "no client registered for {:?}",
                connection.kind
            ))
        })?;
        let lookback = if mapping.lookback_days > 0 {
            mapping.lookback_days
        } else {
            self.config.default_lookback_days
        };
        let window = FetchWindow::from_lookback(lookback);
        let tables = client.fetch_tables(connection, &window)?;

        let tabs: Vec<(&Table, MatchOutcome)> = tables
            .iter()
            .map(|table| (table, matcher::match_rows(table, &mapping, identity)))
            .collect();
        let matched_row_count: usize = tabs.iter().map(|(_, outcome)| outcome.rows.len()).sum();
        // Confidence is only as good as the weakest tab.
        let match_method = tabs.iter().map(|(_, outcome)| outcome.method).max();
        let warning = (match_method == Some(MatchMethod::FallbackAllRows)).then(|| {
            "no identifier matched; all rows included (low confidence)".to_string()
        });

        let resolved_value = if let Some(value_field) = mapping.value_field.as_deref() {
            let candidates = resolver::collect_candidates(
                &tabs,
                value_field,
                mapping.date_field.as_deref(),
                validator,
            );
            resolver::direct_value(&candidates, mapping.extraction)
        } else {
            let aggregate =
                aggregator::aggregate_revenue(&tabs, &mapping, Some(&window), validator)?;
            let conversions = counters
                .get(&CanonicalMetric::Conversions)
                .copied()
                .unwrap_or(0.0);
            resolver::derived_ratio(aggregate.total, conversions)
        };

        Ok(SourceResolution {
            connection_id: connection.id,
            kind: connection.kind,
            resolved_value,
            matched_row_count,
            match_method,
            classification: Some(mapping.classification),
            warning,
        })
    }
}
