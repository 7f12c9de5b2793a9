use thiserror::Error;

pub type PulseResult<T> = Result<T, MarketPulseError>;

#[derive(Error, Debug)]
pub enum MarketPulseError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Campaign not found: {0}")]
    CampaignNotFound(uuid::Uuid),

    #[error("Connection not found: {0}")]
    ConnectionNotFound(uuid::Uuid),

    #[error("Incomplete revenue mapping: {0}")]
    MissingMapping(String),

    #[error("Mixed currencies in matched rows: {0}")]
    MultiCurrency(String),

    #[error("Revenue provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Invalid mapping value for {metric}: {value}")]
    InvalidMappingValue { metric: String, value: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
