//! In-process provider used by the CLI to drive the orchestrator
//!
//! Serves a fixed list of records with configurable latency and a number of
//! injected failures, so retry and cache behaviour can be observed without a
//! backend.

use async_trait::async_trait;
use fetchcache_core::{DataProvider, Payload, ProviderError};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub id: u32,
    pub title: String,
    pub status: String,
}

/// Settings for [`SimulatedProvider`]
#[derive(Debug, Clone)]
pub struct Scenario {
    pub items: u32,
    pub fail_first: u32,
    pub latency: Duration,
}

pub struct SimulatedProvider {
    scenario: Scenario,
    records: RwLock<Vec<Record>>,
    calls: AtomicU32,
}

impl SimulatedProvider {
    pub fn new(scenario: Scenario) -> Self {
        let statuses = ["open", "in-progress", "done"];
        let records = (1..=scenario.items)
            .map(|id| Record {
                id,
                title: format!("Task #{id}"),
                status: statuses[(id as usize) % statuses.len()].to_string(),
            })
            .collect();

        Self {
            scenario,
            records: RwLock::new(records),
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataProvider for SimulatedProvider {
    type Item = Record;

    async fn fetch(
        &self,
        params: &Value,
        cancel: CancellationToken,
    ) -> Result<Payload<Record>, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(call, %params, "Simulated fetch");

        tokio::select! {
            _ = cancel.cancelled() => return Err(ProviderError::other("aborted")),
            _ = tokio::time::sleep(self.scenario.latency) => {}
        }

        if call <= self.scenario.fail_first {
            return Err(ProviderError::network(format!(
                "simulated outage ({call}/{})",
                self.scenario.fail_first
            )));
        }

        let status = params.get("status").and_then(Value::as_str);
        let records = self
            .records
            .read()
            .iter()
            .filter(|r| status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();
        Ok(Payload::Many(records))
    }

    fn supports_search(&self) -> bool {
        true
    }

    async fn search(
        &self,
        query: &str,
        _cancel: CancellationToken,
    ) -> Result<Payload<Record>, ProviderError> {
        let needle = query.to_lowercase();
        let hits = self
            .records
            .read()
            .iter()
            .filter(|r| r.title.to_lowercase().contains(&needle) || r.status.contains(&needle))
            .cloned()
            .collect();
        Ok(Payload::Many(hits))
    }

    async fn delete(&self, id: &str) -> Result<(), ProviderError> {
        let id: u32 = id
            .parse()
            .map_err(|_| ProviderError::other(format!("invalid record id: {id}")))?;

        let mut records = self.records.write();
        let before = records.len();
        records.retain(|r| r.id != id);

        if records.len() != before {
            Ok(())
        } else {
            Err(ProviderError::Status {
                code: 404,
                message: format!("record {id} not found"),
            })
        }
    }
}
