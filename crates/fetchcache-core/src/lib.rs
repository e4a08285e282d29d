//! fetchcache-core - Core library for fetchcache
//!
//! Provides an expiring cache, a retrying fetch orchestrator around a
//! caller-supplied data provider, and per-cycle performance metrics.

pub mod cache;
pub mod config;
pub mod error;
pub mod event;
pub mod journal;
pub mod metrics;
pub mod network;
pub mod orchestrator;
pub mod provider;
pub mod state;

pub use cache::{CacheStats, DataCache};
pub use config::{CacheConfig, FetchConfig, RetryConfig};
pub use error::{FetchError, ProviderError};
pub use event::{EventBus, FetchEvent};
pub use journal::{ErrorJournal, JournalEntry, Severity};
pub use metrics::{MetricsCollector, MetricsSink, PerformanceMetrics};
pub use network::{NetworkMonitor, NetworkStatus};
pub use orchestrator::{cache_key, FetchOrchestrator, FetchOutcome, SearchOutcome};
pub use provider::{DataProvider, Payload};
pub use state::{LoadingStage, LoadingState, Snapshot};
