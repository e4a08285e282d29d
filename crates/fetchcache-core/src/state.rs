//! Loading state and the consumer-facing snapshot

use crate::cache::CacheStats;
use crate::error::FetchError;
use crate::metrics::PerformanceMetrics;
use serde::Serialize;
use std::sync::Arc;

/// Phase of a fetch cycle, ordered and forward-only
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadingStage {
    Fetching,
    Processing,
    Caching,
    Rendering,
    Complete,
}

impl LoadingStage {
    pub fn label(&self) -> &'static str {
        match self {
            LoadingStage::Fetching => "fetching",
            LoadingStage::Processing => "processing",
            LoadingStage::Caching => "caching",
            LoadingStage::Rendering => "rendering",
            LoadingStage::Complete => "complete",
        }
    }
}

/// Progress of the current fetch cycle
///
/// Always replaced as a whole, never patched field by field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadingState {
    pub is_loading: bool,
    /// 0-100, monotonic within a cycle
    pub progress: u8,
    pub stage: LoadingStage,
    pub message: String,
}

impl LoadingState {
    pub fn idle() -> Self {
        Self {
            is_loading: false,
            progress: 0,
            stage: LoadingStage::Complete,
            message: String::new(),
        }
    }

    pub fn fetching(message: impl Into<String>) -> Self {
        Self::in_stage(LoadingStage::Fetching, 0, message)
    }

    pub fn in_stage(stage: LoadingStage, progress: u8, message: impl Into<String>) -> Self {
        Self {
            is_loading: stage != LoadingStage::Complete,
            progress: progress.min(100),
            stage,
            message: message.into(),
        }
    }

    pub fn complete(message: impl Into<String>) -> Self {
        Self::in_stage(LoadingStage::Complete, 100, message)
    }

    /// Terminal state after a failure, keeping the progress reached so far
    pub fn failed(progress: u8, message: impl Into<String>) -> Self {
        Self::in_stage(LoadingStage::Complete, progress, message)
    }
}

impl Default for LoadingState {
    fn default() -> Self {
        Self::idle()
    }
}

/// Everything a consumer needs to render
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    pub data: Arc<Vec<T>>,
    pub loading: LoadingState,
    pub error: Option<Arc<FetchError>>,
    pub metrics: PerformanceMetrics,
    pub is_online: bool,
    pub connection_type: String,
    /// `None` when caching is disabled
    pub cache_stats: Option<CacheStats>,
}

impl<T> Snapshot<T> {
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_loading
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order() {
        assert!(LoadingStage::Fetching < LoadingStage::Processing);
        assert!(LoadingStage::Processing < LoadingStage::Caching);
        assert!(LoadingStage::Caching < LoadingStage::Rendering);
        assert!(LoadingStage::Rendering < LoadingStage::Complete);
    }

    #[test]
    fn test_complete_is_not_loading() {
        let state = LoadingState::complete("done");
        assert!(!state.is_loading);
        assert_eq!(state.progress, 100);

        let failed = LoadingState::failed(25, "boom");
        assert!(!failed.is_loading);
        assert_eq!(failed.stage, LoadingStage::Complete);
        assert_eq!(failed.progress, 25);

        assert!(LoadingState::fetching("go").is_loading);
    }
}
