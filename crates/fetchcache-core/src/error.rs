//! Error types for fetchcache-core
//!
//! Provider failures are captured into orchestrator state rather than thrown,
//! so most of these surface through `Snapshot::error` and the error journal.

use std::path::PathBuf;
use thiserror::Error;

/// Failure reported by a [`DataProvider`](crate::provider::DataProvider)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider returned status {code}: {message}")]
    Status { code: u16, message: String },

    #[error("Operation not supported by provider: {0}")]
    Unsupported(&'static str),

    #[error("{0}")]
    Other(String),
}

impl ProviderError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

/// Core error type for fetchcache operations
#[derive(Error, Debug)]
pub enum FetchError {
    // ===================
    // Provider Errors
    // ===================
    #[error("Provider call failed: {source}")]
    Provider {
        #[source]
        source: ProviderError,
    },

    #[error("Fetch failed after {attempts} attempt(s): {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: ProviderError,
    },

    #[error("Search for '{query}' failed: {source}")]
    Search {
        query: String,
        #[source]
        source: ProviderError,
    },

    #[error("Provider does not support {operation}")]
    Unsupported { operation: &'static str },

    #[error("Request was cancelled")]
    Cancelled,

    // ===================
    // Config Errors
    // ===================
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Failed to read config file: {path}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },
}

impl FetchError {
    /// Wrap a provider error from a mutation call
    pub(crate) fn from_mutation(operation: &'static str, error: ProviderError) -> Self {
        match error {
            ProviderError::Unsupported(_) => FetchError::Unsupported { operation },
            other => FetchError::Provider { source: other },
        }
    }

    /// Cancellation is not an error condition for callers that render state
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled)
    }
}
