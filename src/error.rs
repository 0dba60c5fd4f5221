// src/error.rs
use thiserror::Error;

/// Failure classes of the aggregation core. Provider and store failures are
/// logged where they happen and never escape `Aggregator` or `Selector`.
#[derive(Debug, Error)]
pub enum NewsError {
    #[error("provider {provider} unavailable: {source}")]
    ProviderUnavailable {
        provider: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("store unavailable during {op}: {source}")]
    StoreUnavailable {
        op: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("unknown category: {0:?}")]
    UnknownCategory(String),

    #[error("no news providers configured")]
    NoProvidersConfigured,

    #[error("invalid zip code: {0:?}")]
    InvalidZipCode(String),
}

impl NewsError {
    /// Short label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            NewsError::ProviderUnavailable { .. } => "provider_unavailable",
            NewsError::StoreUnavailable { .. } => "store_unavailable",
            NewsError::UnknownCategory(_) => "unknown_category",
            NewsError::NoProvidersConfigured => "no_providers",
            NewsError::InvalidZipCode(_) => "invalid_zip",
        }
    }
}
