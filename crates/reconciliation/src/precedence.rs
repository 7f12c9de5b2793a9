//! Source precedence & invalidation — decides which revenue-tracking
//! connection (if any) supplies the campaign-level conversion value, and
//! cascades invalidation when none remains.

use marketpulse_connectors::AdPlatformClient;
use marketpulse_core::PulseResult;
use marketpulse_store::DashboardStore;
use tracing::{debug, info};
use uuid::Uuid;

/// One active revenue-tracking connection and its resolved value.
#[derive(Debug, Clone)]
pub struct TrackingSource {
    pub connection_id: Uuid,
    pub resolved_value: Option<f64>,
}

/// Decision over the set of active revenue-tracking connections.
#[derive(Debug, Clone, PartialEq)]
pub enum PrecedenceOutcome {
    /// No tracking source remains; every stored value must be cleared.
    NoTrackingSources,
    /// Exactly one tracking source; its value is authoritative.
    SingleAuthoritative {
        connection_id: Uuid,
        value: Option<f64>,
    },
    /// Two or more tracking sources; the campaign-level value stays null
    /// rather than guessing which source dominates.
    AmbiguousMultiple { count: usize },
}

pub fn decide(sources: &[TrackingSource]) -> PrecedenceOutcome {
    match sources {
        [] => PrecedenceOutcome::NoTrackingSources,
        [only] => PrecedenceOutcome::SingleAuthoritative {
            connection_id: only.connection_id,
            value: only.resolved_value,
        },
        many => PrecedenceOutcome::AmbiguousMultiple { count: many.len() },
    }
}

/// Write the decision through to every level that carries a conversion
/// value: the campaign record, the latest import session, and (on
/// invalidation) each connection.
pub fn apply(
    campaign_id: Uuid,
    outcome: &PrecedenceOutcome,
    store: &DashboardStore,
    ad: &dyn AdPlatformClient,
) -> PulseResult<Option<f64>> {
    match outcome {
        PrecedenceOutcome::NoTrackingSources => {
            store.set_campaign_conversion_value(campaign_id, None);
            ad.store_conversion_value(campaign_id, None)?;
            for connection in store.connections_for_campaign(campaign_id) {
                if connection.conversion_value.is_some() {
                    store.set_connection_conversion_value(connection.id, None);
                }
            }
            info!(%campaign_id, "No revenue-tracking source; conversion value invalidated");
            Ok(None)
        }
        PrecedenceOutcome::SingleAuthoritative {
            connection_id,
            value,
        } => {
            store.set_campaign_conversion_value(campaign_id, *value);
            ad.store_conversion_value(campaign_id, *value)?;
            debug!(%campaign_id, %connection_id, ?value, "Single authoritative revenue source");
            Ok(*value)
        }
        PrecedenceOutcome::AmbiguousMultiple { count } => {
            store.set_campaign_conversion_value(campaign_id, None);
            ad.store_conversion_value(campaign_id, None)?;
            debug!(
                %campaign_id,
                sources = count,
                "Multiple revenue-tracking sources; campaign-level value left null"
            );
            Ok(None)
        }
    }
}

/// Convenience wrapper: decide and apply in one step. Callers re-run this
/// whole evaluation whenever a tracking connection is removed; the decision
/// is never patched incrementally.
pub fn evaluate(
    campaign_id: Uuid,
    sources: &[TrackingSource],
    store: &DashboardStore,
    ad: &dyn AdPlatformClient,
) -> PulseResult<Option<f64>> {
    apply(campaign_id, &decide(sources), store, ad)
}
