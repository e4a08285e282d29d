//! Data provider seam
//!
//! The orchestrator knows nothing about transports. Callers plug in a
//! [`DataProvider`] that performs the actual I/O.

use crate::error::ProviderError;
use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// Result of a provider call: a single record or a list
#[derive(Debug, Clone, PartialEq)]
pub enum Payload<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> Payload<T> {
    /// Coerce to a sequence; a single record becomes a one-element vec
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Payload::One(item) => vec![item],
            Payload::Many(items) => items,
        }
    }
}

impl<T> From<Vec<T>> for Payload<T> {
    fn from(items: Vec<T>) -> Self {
        Payload::Many(items)
    }
}

/// Asynchronous data source wrapped by the orchestrator
///
/// Only `fetch` is required. Cancellation is cooperative: implementations
/// should stop work once `cancel` fires, though the orchestrator also stops
/// awaiting them.
#[async_trait]
pub trait DataProvider: Send + Sync + 'static {
    type Item: Clone + Send + Sync + 'static;

    async fn fetch(
        &self,
        params: &Value,
        cancel: CancellationToken,
    ) -> Result<Payload<Self::Item>, ProviderError>;

    /// Whether [`search`](Self::search) is implemented
    fn supports_search(&self) -> bool {
        false
    }

    async fn search(
        &self,
        _query: &str,
        _cancel: CancellationToken,
    ) -> Result<Payload<Self::Item>, ProviderError> {
        Err(ProviderError::Unsupported("search"))
    }

    async fn create(&self, _item: Self::Item) -> Result<Self::Item, ProviderError> {
        Err(ProviderError::Unsupported("create"))
    }

    async fn update(&self, _id: &str, _item: Self::Item) -> Result<Self::Item, ProviderError> {
        Err(ProviderError::Unsupported("update"))
    }

    async fn delete(&self, _id: &str) -> Result<(), ProviderError> {
        Err(ProviderError::Unsupported("delete"))
    }
}
