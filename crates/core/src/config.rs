use serde::Deserialize;

/// Root application configuration. Loaded from environment variables with
/// the prefix `MARKETPULSE__`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub reconciliation: ReconciliationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReconciliationConfig {
    /// Lookback window applied when a mapping does not declare its own.
    #[serde(default = "default_lookback_days")]
    pub default_lookback_days: u32,
    /// Multiplier allowed on `conversions <= clicks` before the relationship
    /// check fails; multi-touch conversions legitimately exceed clicks by a
    /// small margin.
    #[serde(default = "default_relationship_tolerance")]
    pub relationship_tolerance: f64,
    /// Points deducted from the data-quality score per relationship failure.
    #[serde(default = "default_relationship_penalty")]
    pub relationship_penalty: f64,
    /// Timeout callers should impose on each external fetch, milliseconds.
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
}

fn default_lookback_days() -> u32 {
    30
}
fn default_relationship_tolerance() -> f64 {
    1.1
}
fn default_relationship_penalty() -> f64 {
    10.0
}
fn default_fetch_timeout_ms() -> u64 {
    15_000
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            default_lookback_days: default_lookback_days(),
            relationship_tolerance: default_relationship_tolerance(),
            relationship_penalty: default_relationship_penalty(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("MARKETPULSE")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
