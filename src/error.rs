//! Crate-wide error taxonomy.
//!
//! Splits "surfaced" errors (initialization, malformed serialization) from
//! errors that are classified and swallowed at a boundary (publisher
//! drain, fault analysis) rather than propagated to the logging call site.

use thiserror::Error;

use crate::{
    cache::CacheError,
    resilience::{BulkheadError, CircuitBreakerError, TimeoutError},
};

/// Top-level error type for the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Misconfiguration at startup (e.g. serializer double-init with
    /// incompatible options).
    #[error("initialization error: {0}")]
    Initialization(String),

    /// Malformed JSON in or out of the shared serializer.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Non-2xx or empty-body response from an upstream HTTP call.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// The resilience pipeline's circuit breaker is open.
    #[error(transparent)]
    CircuitOpen(#[from] CircuitBreakerError),

    /// A request exceeded its deadline.
    #[error(transparent)]
    Timeout(#[from] TimeoutError),

    /// The bulkhead rejected the call: too many in-flight and queued
    /// requests (synthetic 503, distinct from a transport-level 503).
    #[error(transparent)]
    BulkheadRejected(#[from] BulkheadError),

    /// Transport-level failure surfaced from `reqwest` unchanged.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// Cache tier failure.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
