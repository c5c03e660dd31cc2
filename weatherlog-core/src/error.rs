//! Error taxonomy shared by the ingestion and query paths.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WeatherError {
    /// Transport-level failure talking to the provider: connection
    /// refused, timeout, or a non-2xx status.
    #[error("weather provider unavailable: {message}")]
    ProviderUnavailable {
        /// HTTP status, when a response was received at all.
        status: Option<u16>,
        message: String,
    },

    /// The provider answered but the payload did not match the expected
    /// schema. The message names the missing or mismatched field.
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    /// Persistence-layer failure other than the expected duplicate.
    #[error("observation store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// A query matched no stored observations. Distinct from an average
    /// of zero.
    #[error("no stored observations match the query")]
    NoData,
}

impl WeatherError {
    /// HTTP status reported by the provider, if one was received.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::ProviderUnavailable { status, .. } => *status,
            _ => None,
        }
    }

    /// Errors that the scheduler and backfill loops absorb: the cycle or
    /// day is logged and skipped, never aborting the loop.
    pub fn is_ingest_fault(&self) -> bool {
        matches!(
            self,
            Self::ProviderUnavailable { .. } | Self::MalformedResponse(_) | Self::Store(_)
        )
    }
}
