//! Fetch orchestrator
//!
//! Wraps a [`DataProvider`] with a cache lookup, cancellation of superseded
//! requests, retry with exponential backoff, debounced search and optional
//! periodic refresh. Errors are captured into state rather than returned,
//! except through [`FetchOrchestrator::refetch`].
//!
//! All shared state sits behind `parking_lot` locks that are only held for
//! short synchronous sections, never across an `.await`.

use crate::cache::{CacheStats, DataCache};
use crate::config::{FetchConfig, RetryConfig, CLEANUP_INTERVAL};
use crate::error::{FetchError, ProviderError};
use crate::event::{EventBus, FetchEvent};
use crate::journal::ErrorJournal;
use crate::metrics::{MetricsCollector, MetricsSink, PerformanceMetrics};
use crate::network::{NetworkMonitor, NetworkStatus};
use crate::provider::{DataProvider, Payload};
use crate::state::{LoadingStage, LoadingState, Snapshot};
use parking_lot::Mutex;
use serde_json::Value;
use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Result of a [`FetchOrchestrator::fetch_data`] call
#[derive(Debug, Clone)]
pub enum FetchOutcome<T> {
    /// Served by the provider
    Fresh(Arc<Vec<T>>),
    /// Served from the cache without touching the provider
    Cached(Arc<Vec<T>>),
    /// Superseded by a newer request or torn down; state was left alone
    Cancelled,
    /// Attempts exhausted; the error is also in `Snapshot::error`
    Failed(Arc<FetchError>),
}

impl<T> FetchOutcome<T> {
    pub fn data(&self) -> Option<&Arc<Vec<T>>> {
        match self {
            FetchOutcome::Fresh(data) | FetchOutcome::Cached(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchOutcome::Cancelled)
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, FetchOutcome::Cached(_))
    }

    pub fn into_result(self) -> Result<Arc<Vec<T>>, Arc<FetchError>> {
        match self {
            FetchOutcome::Fresh(data) | FetchOutcome::Cached(data) => Ok(data),
            FetchOutcome::Cancelled => Err(Arc::new(FetchError::Cancelled)),
            FetchOutcome::Failed(err) => Err(err),
        }
    }
}

/// Result of a [`FetchOrchestrator::search`] call
#[derive(Debug, Clone)]
pub enum SearchOutcome<T> {
    /// Provider search results replaced `data`
    Results(Arc<Vec<T>>),
    /// Provider cannot search; the result of the last fetch is returned and
    /// `data` is left as it was
    Unchanged(Arc<Vec<T>>),
    /// Empty query, delegated to a full fetch
    Fetched(FetchOutcome<T>),
    /// A newer search arrived first, or the orchestrator shut down
    Superseded,
    Failed(Arc<FetchError>),
}

impl<T> SearchOutcome<T> {
    pub fn is_superseded(&self) -> bool {
        matches!(self, SearchOutcome::Superseded)
    }
}

/// Deterministic cache key for request parameters
///
/// Object keys are emitted in sorted order regardless of how the map was
/// built, so equal parameters always produce equal keys.
pub fn cache_key(params: &Value) -> String {
    let mut out = String::new();
    write_canonical(params, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// A cancellable unit of work with an identity
struct Ticket {
    id: u64,
    token: CancellationToken,
}

impl Ticket {
    fn is(&self, id: u64) -> bool {
        self.id == id && !self.token.is_cancelled()
    }
}

struct Inner<T> {
    data: Arc<Vec<T>>,
    /// Result of the last fetch or cache hit, unaffected by search
    fetched: Arc<Vec<T>>,
    loading: LoadingState,
    error: Option<Arc<FetchError>>,
    next_id: u64,
    in_flight: Option<Ticket>,
    pending_search: Option<Ticket>,
}

impl<T> Inner<T> {
    fn issue(&mut self, parent: &CancellationToken) -> (u64, CancellationToken) {
        self.next_id += 1;
        (self.next_id, parent.child_token())
    }

    fn is_current_fetch(&self, id: u64) -> bool {
        self.in_flight.as_ref().is_some_and(|t| t.is(id))
    }

    fn is_current_search(&self, id: u64) -> bool {
        self.pending_search.as_ref().is_some_and(|t| t.is(id))
    }
}

/// Caching, retrying front for a [`DataProvider`]
pub struct FetchOrchestrator<P: DataProvider> {
    provider: Arc<P>,
    config: FetchConfig,
    retry: RetryConfig,
    cache: Option<Mutex<DataCache<Arc<Vec<P::Item>>>>>,
    inner: Mutex<Inner<P::Item>>,
    collector: MetricsCollector,
    sink: Option<Arc<dyn MetricsSink>>,
    network: Arc<dyn NetworkMonitor>,
    journal: Arc<ErrorJournal>,
    events: EventBus,
    /// Parent of every request token; cancelled on shutdown
    lifecycle: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl<P: DataProvider> FetchOrchestrator<P> {
    pub fn new(provider: P, config: FetchConfig) -> Self {
        Self::with_shared_provider(Arc::new(provider), config)
    }

    pub fn with_shared_provider(provider: Arc<P>, config: FetchConfig) -> Self {
        let cache = config
            .cache
            .as_ref()
            .map(|c| Mutex::new(DataCache::from_config(c)));
        let journal = Arc::new(ErrorJournal::new(config.journal_capacity));

        debug!(
            cache_enabled = cache.is_some(),
            retry_policy = config.retry.is_some(),
            debounce_ms = config.debounce_delay_ms,
            "Fetch orchestrator created"
        );

        Self {
            provider,
            retry: config.effective_retry(),
            config,
            cache,
            inner: Mutex::new(Inner {
                data: Arc::new(Vec::new()),
                fetched: Arc::new(Vec::new()),
                loading: LoadingState::idle(),
                error: None,
                next_id: 0,
                in_flight: None,
                pending_search: None,
            }),
            collector: MetricsCollector::new(),
            sink: None,
            network: Arc::new(NetworkStatus::default()),
            journal,
            events: EventBus::default_capacity(),
            lifecycle: CancellationToken::new(),
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn with_metrics_sink(mut self, sink: impl MetricsSink + 'static) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }

    pub fn with_network_monitor(mut self, monitor: Arc<dyn NetworkMonitor>) -> Self {
        self.network = monitor;
        self
    }

    /// Use a caller-owned journal instead of a private one
    pub fn with_journal(mut self, journal: Arc<ErrorJournal>) -> Self {
        self.journal = journal;
        self
    }

    // ===================
    // Lifecycle
    // ===================

    /// Spawn the background timers (cache sweep, real-time refresh)
    ///
    /// Timers hold only a weak reference, so dropping the last `Arc` also
    /// stops them. Calling `start` twice is a no-op.
    pub fn start(self: &Arc<Self>) {
        let mut tasks = self.tasks.lock();
        if !tasks.is_empty() || self.lifecycle.is_cancelled() {
            return;
        }

        if self.config.cache.as_ref().is_some_and(|c| c.auto_cleanup) {
            let weak = Arc::downgrade(self);
            tasks.push(tokio::spawn(Self::sweep_loop(weak, self.lifecycle.clone())));
            debug!(interval_secs = CLEANUP_INTERVAL.as_secs(), "Cache sweep started");
        }

        if let Some(interval) = self.config.update_interval() {
            let weak = Arc::downgrade(self);
            tasks.push(tokio::spawn(Self::refresh_loop(
                weak,
                self.lifecycle.clone(),
                interval,
            )));
            info!(interval_ms = interval.as_millis() as u64, "Real-time refresh started");
        }
    }

    /// Abort outstanding requests and stop both timers
    pub fn shutdown(&self) {
        self.lifecycle.cancel();
        {
            let mut inner = self.inner.lock();
            if let Some(ticket) = inner.in_flight.take() {
                ticket.token.cancel();
            }
            if let Some(ticket) = inner.pending_search.take() {
                ticket.token.cancel();
            }
        }
        for handle in self.tasks.lock().drain(..) {
            handle.abort();
        }
        debug!("Fetch orchestrator shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.lifecycle.is_cancelled()
    }

    async fn sweep_loop(weak: Weak<Self>, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval_at(Instant::now() + CLEANUP_INTERVAL, CLEANUP_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let Some(this) = weak.upgrade() else { break };
                    this.sweep_cache();
                }
            }
        }
    }

    async fn refresh_loop(weak: Weak<Self>, shutdown: CancellationToken, interval: Duration) {
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let Some(this) = weak.upgrade() else { break };
                    if this.network.is_online() {
                        this.fetch_data(None, true).await;
                    } else {
                        debug!("Offline, skipping real-time refresh");
                    }
                }
            }
        }
    }

    // ===================
    // Fetching
    // ===================

    /// Fetch data for `params`, from the cache when allowed
    ///
    /// The cache is only consulted when `force_refresh` is false and no
    /// retry policy is configured. Never returns an error directly: failures
    /// land in [`Snapshot::error`] and come back as [`FetchOutcome::Failed`].
    pub async fn fetch_data(&self, params: Option<Value>, force_refresh: bool) -> FetchOutcome<P::Item> {
        if self.lifecycle.is_cancelled() {
            return FetchOutcome::Cancelled;
        }

        let params = params.unwrap_or_else(|| Value::Object(Default::default()));
        let key = cache_key(&params);

        if !force_refresh && self.config.retry.is_none() {
            if let Some(data) = self.cache_lookup(&key) {
                self.apply_cache_hit(&key, Arc::clone(&data));
                return FetchOutcome::Cached(data);
            }
        }

        let (id, token) = self.begin_cycle();
        let started = Instant::now();
        debug!(request_id = id, key = %key, force_refresh, "Fetching from provider");

        match self.fetch_with_retry(id, &params, &token).await {
            Ok(payload) => self.complete_cycle(id, key, payload, started),
            Err(FetchError::Cancelled) => {
                debug!(request_id = id, "Fetch cancelled");
                FetchOutcome::Cancelled
            }
            Err(error) => self.fail_cycle(id, error),
        }
    }

    /// Forced fetch with default params; unlike `fetch_data` this rejects
    /// when attempts are exhausted or the request is superseded
    pub async fn refetch(&self) -> Result<Arc<Vec<P::Item>>, Arc<FetchError>> {
        self.fetch_data(None, true).await.into_result()
    }

    async fn fetch_with_retry(
        &self,
        id: u64,
        params: &Value,
        token: &CancellationToken,
    ) -> Result<Payload<P::Item>, FetchError> {
        let max_attempts = self.retry.max_retries.max(1);
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                self.set_retry_state(id, attempt, max_attempts);
            }

            let result = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(FetchError::Cancelled),
                result = self.provider.fetch(params, token.clone()) => result,
            };

            match result {
                Ok(payload) => return Ok(payload),
                Err(_) if token.is_cancelled() => return Err(FetchError::Cancelled),
                Err(e) => {
                    warn!(request_id = id, attempt, max_attempts, error = %e, "Provider fetch attempt failed");
                    if attempt < max_attempts {
                        let delay = self.retry.delay_for(attempt);
                        debug!(delay_ms = delay.as_millis() as u64, "Backing off before retry");
                        tokio::select! {
                            biased;
                            _ = token.cancelled() => return Err(FetchError::Cancelled),
                            _ = tokio::time::sleep(delay) => {}
                        }
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(FetchError::RetriesExhausted {
            attempts: max_attempts,
            last: last_error.unwrap_or_else(|| ProviderError::other("no attempt was made")),
        })
    }

    fn cache_lookup(&self, key: &str) -> Option<Arc<Vec<P::Item>>> {
        self.cache.as_ref()?.lock().get(key)
    }

    fn apply_cache_hit(&self, key: &str, data: Arc<Vec<P::Item>>) {
        let len = data.len();
        let state = {
            let mut inner = self.inner.lock();
            // The newest request wins, even over a slower network call
            if let Some(previous) = inner.in_flight.take() {
                debug!(request_id = previous.id, "Cancelling fetch superseded by cache hit");
                previous.token.cancel();
            }
            inner.fetched = Arc::clone(&data);
            inner.data = data;
            inner.error = None;
            inner.loading = LoadingState::complete("Loaded from cache");
            inner.loading.clone()
        };

        let metrics = self.collector.record_cache_hit();
        debug!(key = %key, len, "Served from cache");

        self.events.publish(FetchEvent::StateChanged(state));
        self.events.publish(FetchEvent::DataUpdated {
            len,
            from_cache: true,
        });
        self.publish_metrics(metrics);
    }

    /// Cancel the previous request and register a new one
    fn begin_cycle(&self) -> (u64, CancellationToken) {
        let (id, token, state) = {
            let mut inner = self.inner.lock();
            if let Some(previous) = inner.in_flight.take() {
                debug!(request_id = previous.id, "Cancelling superseded fetch");
                previous.token.cancel();
            }

            let (id, token) = inner.issue(&self.lifecycle);
            inner.in_flight = Some(Ticket {
                id,
                token: token.clone(),
            });
            inner.error = None;
            inner.loading = LoadingState::fetching("Fetching data...");
            (id, token, inner.loading.clone())
        };

        self.events.publish(FetchEvent::StateChanged(state));
        (id, token)
    }

    fn set_retry_state(&self, id: u64, attempt: u32, max_attempts: u32) {
        let state = {
            let mut inner = self.inner.lock();
            if !inner.is_current_fetch(id) {
                return;
            }
            inner.loading = LoadingState::in_stage(
                LoadingStage::Fetching,
                inner.loading.progress,
                format!("Retrying ({attempt}/{max_attempts})..."),
            );
            inner.loading.clone()
        };
        self.events.publish(FetchEvent::StateChanged(state));
    }

    fn complete_cycle(
        &self,
        id: u64,
        key: String,
        payload: Payload<P::Item>,
        started: Instant,
    ) -> FetchOutcome<P::Item> {
        let mut events = Vec::with_capacity(6);

        let data = {
            let mut inner = self.inner.lock();
            if !inner.is_current_fetch(id) {
                return FetchOutcome::Cancelled;
            }

            inner.loading = LoadingState::in_stage(LoadingStage::Processing, 25, "Processing data...");
            events.push(FetchEvent::StateChanged(inner.loading.clone()));
            let data = Arc::new(payload.into_vec());

            inner.loading = LoadingState::in_stage(LoadingStage::Caching, 50, "Caching results...");
            events.push(FetchEvent::StateChanged(inner.loading.clone()));
            if let Some(cache) = &self.cache {
                cache.lock().set(key, Arc::clone(&data));
            }

            inner.loading = LoadingState::in_stage(LoadingStage::Rendering, 75, "Rendering...");
            events.push(FetchEvent::StateChanged(inner.loading.clone()));
            inner.data = Arc::clone(&data);
            inner.fetched = Arc::clone(&data);
            events.push(FetchEvent::DataUpdated {
                len: data.len(),
                from_cache: false,
            });

            inner.loading = LoadingState::complete(format!("Loaded {} item(s)", data.len()));
            events.push(FetchEvent::StateChanged(inner.loading.clone()));
            inner.in_flight = None;
            data
        };

        let metrics = self.collector.record_fetch(started, self.cache_stats());
        info!(
            request_id = id,
            items = data.len(),
            load_time_ms = metrics.load_time_ms,
            "Fetch complete"
        );

        for event in events {
            self.events.publish(event);
        }
        self.publish_metrics(metrics);

        FetchOutcome::Fresh(data)
    }

    fn fail_cycle(&self, id: u64, error: FetchError) -> FetchOutcome<P::Item> {
        let error = Arc::new(error);
        let state = {
            let mut inner = self.inner.lock();
            if !inner.is_current_fetch(id) {
                return FetchOutcome::Cancelled;
            }
            inner.loading = LoadingState::failed(inner.loading.progress, "Failed to load data");
            inner.error = Some(Arc::clone(&error));
            inner.in_flight = None;
            inner.loading.clone()
        };

        warn!(request_id = id, error = %error, "Fetch failed");
        self.journal.error("fetch", error.to_string());
        self.events.publish(FetchEvent::StateChanged(state));
        self.events.publish(FetchEvent::Error(error.to_string()));

        FetchOutcome::Failed(error)
    }

    fn publish_metrics(&self, metrics: PerformanceMetrics) {
        if let Some(sink) = &self.sink {
            sink.report(&metrics);
        }
        self.events.publish(FetchEvent::MetricsUpdated(metrics));
    }

    // ===================
    // Search
    // ===================

    /// Debounced search
    ///
    /// Waits for the debounce delay; a newer call in the meantime cancels
    /// this one. An empty query triggers a full fetch instead.
    pub async fn search(&self, query: &str) -> SearchOutcome<P::Item> {
        let (id, token) = {
            let mut inner = self.inner.lock();
            if let Some(previous) = inner.pending_search.take() {
                previous.token.cancel();
            }
            let (id, token) = inner.issue(&self.lifecycle);
            inner.pending_search = Some(Ticket {
                id,
                token: token.clone(),
            });
            (id, token)
        };

        tokio::select! {
            biased;
            _ = token.cancelled() => return SearchOutcome::Superseded,
            _ = tokio::time::sleep(self.config.debounce_delay()) => {}
        }

        if query.is_empty() {
            self.finish_search(id);
            return SearchOutcome::Fetched(self.fetch_data(None, false).await);
        }

        if !self.provider.supports_search() {
            self.finish_search(id);
            debug!(query, "Provider has no search, keeping current data");
            let fetched = Arc::clone(&self.inner.lock().fetched);
            return SearchOutcome::Unchanged(fetched);
        }

        let result = tokio::select! {
            biased;
            _ = token.cancelled() => return SearchOutcome::Superseded,
            result = self.provider.search(query, token.clone()) => result,
        };

        match result {
            Ok(payload) => self.apply_search_results(id, query, payload),
            Err(_) if token.is_cancelled() => SearchOutcome::Superseded,
            Err(source) => {
                if !self.finish_search(id) {
                    return SearchOutcome::Superseded;
                }
                let error = FetchError::Search {
                    query: query.to_string(),
                    source,
                };
                SearchOutcome::Failed(self.surface_error("search", error))
            }
        }
    }

    /// Clear the pending search if it is still `id`; false if superseded
    fn finish_search(&self, id: u64) -> bool {
        let mut inner = self.inner.lock();
        if inner.is_current_search(id) {
            inner.pending_search = None;
            true
        } else {
            false
        }
    }

    fn apply_search_results(
        &self,
        id: u64,
        query: &str,
        payload: Payload<P::Item>,
    ) -> SearchOutcome<P::Item> {
        let data = Arc::new(payload.into_vec());
        let state = {
            let mut inner = self.inner.lock();
            if !inner.is_current_search(id) {
                return SearchOutcome::Superseded;
            }
            inner.pending_search = None;
            inner.data = Arc::clone(&data);
            inner.error = None;
            inner.loading = LoadingState::complete(format!("{} result(s)", data.len()));
            inner.loading.clone()
        };

        debug!(query, results = data.len(), "Search complete");
        self.events.publish(FetchEvent::StateChanged(state));
        self.events.publish(FetchEvent::DataUpdated {
            len: data.len(),
            from_cache: false,
        });

        SearchOutcome::Results(data)
    }

    // ===================
    // Mutations
    // ===================

    pub async fn create(&self, item: P::Item) -> Result<P::Item, Arc<FetchError>> {
        self.mutate("create", self.provider.create(item)).await
    }

    pub async fn update(&self, id: &str, item: P::Item) -> Result<P::Item, Arc<FetchError>> {
        self.mutate("update", self.provider.update(id, item)).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), Arc<FetchError>> {
        self.mutate("delete", self.provider.delete(id)).await
    }

    /// Run a provider mutation; success invalidates the whole cache
    async fn mutate<R>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<R, ProviderError>>,
    ) -> Result<R, Arc<FetchError>> {
        match call.await {
            Ok(result) => {
                self.invalidate_cache();
                info!(operation, "Mutation applied, cache invalidated");
                self.events.publish(FetchEvent::DataMutated);
                Ok(result)
            }
            Err(e) => Err(self.surface_error(operation, FetchError::from_mutation(operation, e))),
        }
    }

    /// Put `error` in the error slot without touching the loading state
    fn surface_error(&self, source: &'static str, error: FetchError) -> Arc<FetchError> {
        let error = Arc::new(error);
        self.inner.lock().error = Some(Arc::clone(&error));

        warn!(source, error = %error, "Operation failed");
        self.journal.error(source, error.to_string());
        self.events.publish(FetchEvent::Error(error.to_string()));
        error
    }

    // ===================
    // Cache management
    // ===================

    /// Remove expired cache entries now
    pub fn sweep_cache(&self) -> usize {
        let Some(cache) = &self.cache else {
            return 0;
        };
        let removed = cache.lock().cleanup();
        if removed > 0 {
            self.events.publish(FetchEvent::CacheCleaned { removed });
        }
        removed
    }

    pub fn invalidate_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.lock().clear();
        }
    }

    // ===================
    // Read accessors
    // ===================

    pub fn snapshot(&self) -> Snapshot<P::Item> {
        let (data, loading, error) = {
            let inner = self.inner.lock();
            (Arc::clone(&inner.data), inner.loading.clone(), inner.error.clone())
        };

        Snapshot {
            data,
            loading,
            error,
            metrics: self.collector.last(),
            is_online: self.network.is_online(),
            connection_type: self.network.connection_type(),
            cache_stats: self.cache_stats(),
        }
    }

    pub fn data(&self) -> Arc<Vec<P::Item>> {
        Arc::clone(&self.inner.lock().data)
    }

    pub fn loading(&self) -> LoadingState {
        self.inner.lock().loading.clone()
    }

    pub fn error(&self) -> Option<Arc<FetchError>> {
        self.inner.lock().error.clone()
    }

    pub fn metrics(&self) -> PerformanceMetrics {
        self.collector.last()
    }

    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(|c| c.lock().stats())
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    pub fn journal(&self) -> &Arc<ErrorJournal> {
        &self.journal
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<FetchEvent> {
        self.events.subscribe()
    }
}

impl<P: DataProvider> Drop for FetchOrchestrator<P> {
    fn drop(&mut self) {
        self.lifecycle.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cache_key_sorts_object_keys() {
        let a = json!({"page": 1, "filter": {"status": "open", "assignee": "me"}});
        let b = json!({"filter": {"assignee": "me", "status": "open"}, "page": 1});
        assert_eq!(cache_key(&a), cache_key(&b));
        assert_eq!(
            cache_key(&a),
            r#"{"filter":{"assignee":"me","status":"open"},"page":1}"#
        );
    }

    #[test]
    fn test_cache_key_defaults() {
        assert_eq!(cache_key(&json!({})), "{}");
        assert_eq!(cache_key(&json!([1, "a", null])), r#"[1,"a",null]"#);
        assert_ne!(cache_key(&json!({"page": 1})), cache_key(&json!({"page": 2})));
    }

    #[test]
    fn test_outcome_into_result() {
        let ok: FetchOutcome<u8> = FetchOutcome::Cached(Arc::new(vec![1]));
        assert!(ok.is_cached());
        assert_eq!(*ok.into_result().unwrap(), vec![1]);

        let cancelled: FetchOutcome<u8> = FetchOutcome::Cancelled;
        let err = cancelled.into_result().unwrap_err();
        assert!(err.is_cancelled());
    }
}
