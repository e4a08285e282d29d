//! Terminal rendering of orchestrator snapshots

use crate::simulated::Record;
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};
use fetchcache_core::{FetchConfig, JournalEntry, Snapshot};
use serde_json::json;

/// Render a snapshot as tables, or as a JSON document
pub fn format_snapshot(snapshot: &Snapshot<Record>, journal: &[JournalEntry], json: bool, no_color: bool) -> String {
    if json {
        let doc = json!({
            "data": snapshot.data.as_ref(),
            "loading": snapshot.loading,
            "error": snapshot.error.as_ref().map(|e| e.to_string()),
            "metrics": snapshot.metrics,
            "isOnline": snapshot.is_online,
            "connectionType": snapshot.connection_type,
            "cacheStats": snapshot.cache_stats,
            "journal": journal,
        });
        return serde_json::to_string_pretty(&doc).unwrap_or_else(|_| "{}".to_string());
    }

    let mut out = vec![format_records(&snapshot.data, no_color)];

    let mut lines = vec![];
    lines.push(format!(
        "Stage:            {} ({}%)",
        snapshot.loading.stage.label(),
        snapshot.loading.progress
    ));
    lines.push(format!("Message:          {}", snapshot.loading.message));
    if let Some(error) = &snapshot.error {
        lines.push(format!("Error:            {}", error));
    }
    lines.push(format!("Load time:        {} ms", snapshot.metrics.load_time_ms));
    lines.push(format!("Render time:      {} ms", snapshot.metrics.render_time_ms));
    lines.push(format!("Requests:         {}", snapshot.metrics.network_requests));
    lines.push(format!("Cache hit rate:   {:.1}%", snapshot.metrics.cache_hit_rate));
    lines.push(format!("Memory:           {}", format_bytes(snapshot.metrics.memory_usage)));
    match &snapshot.cache_stats {
        Some(stats) => lines.push(format!(
            "Cache:            {}/{} entries, {} hits",
            stats.size, stats.max_size, stats.total_hits
        )),
        None => lines.push("Cache:            disabled".to_string()),
    }
    lines.push(format!(
        "Network:          {} ({})",
        if snapshot.is_online { "online" } else { "offline" },
        snapshot.connection_type
    ));
    out.push(lines.join("\n"));

    if !journal.is_empty() {
        let mut errors = vec!["Errors:".to_string()];
        for entry in journal {
            errors.push(format!(
                "  [{}] {}: {}",
                entry.recorded_at.format("%H:%M:%S"),
                entry.source,
                entry.message
            ));
        }
        out.push(errors.join("\n"));
    }

    out.join("\n\n")
}

pub fn format_records(records: &[Record], no_color: bool) -> String {
    if records.is_empty() {
        return "No records.".to_string();
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    if no_color {
        table.set_header(vec!["ID", "Title", "Status"]);
    } else {
        table.set_header(vec![
            Cell::new("ID").fg(Color::Cyan),
            Cell::new("Title").fg(Color::Cyan),
            Cell::new("Status").fg(Color::Cyan),
        ]);
    }

    for record in records {
        let id = record.id.to_string();
        table.add_row(Row::from(vec![&id, &record.title, &record.status]));
    }

    table.to_string()
}

pub fn format_config(config: &FetchConfig, json: bool) -> String {
    if json {
        return serde_json::to_string_pretty(config).unwrap_or_else(|_| "{}".to_string());
    }

    let retry = config.effective_retry();
    let mut lines = vec![];
    match &config.cache {
        Some(cache) => {
            lines.push(format!("Cache max age:    {} ms", cache.max_age_ms));
            lines.push(format!("Cache max size:   {}", cache.max_size));
            lines.push(format!("Auto cleanup:     {}", cache.auto_cleanup));
        }
        None => lines.push("Cache:            disabled".to_string()),
    }
    lines.push(format!(
        "Retry policy:     {}",
        if config.retry.is_some() { "configured (cache reads off)" } else { "defaults" }
    ));
    lines.push(format!("Max attempts:     {}", retry.max_retries));
    lines.push(format!("Retry delay:      {} ms", retry.retry_delay_ms));
    lines.push(format!("Backoff:          x{}", retry.backoff_multiplier));
    lines.push(format!("Debounce:         {} ms", config.debounce_delay_ms));
    lines.push(format!(
        "Real-time:        {}",
        config
            .update_interval()
            .map(|d| format!("every {} ms", d.as_millis()))
            .unwrap_or_else(|| "off".to_string())
    ));
    lines.join("\n")
}

fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "n/a".to_string();
    }
    let mb = bytes as f64 / (1024.0 * 1024.0);
    format!("{:.1} MB", mb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fetchcache_core::CacheConfig;
    use std::time::Duration;

    #[test]
    fn test_format_records_empty() {
        assert_eq!(format_records(&[], true), "No records.");
    }

    #[test]
    fn test_format_records_table() {
        let records = vec![Record {
            id: 7,
            title: "Order paper".to_string(),
            status: "open".to_string(),
        }];
        let out = format_records(&records, true);
        assert!(out.contains("Order paper"));
        assert!(out.contains("Status"));
    }

    #[test]
    fn test_format_config_human() {
        let config = FetchConfig::new().with_cache(CacheConfig::new(Duration::from_secs(2), 4));
        let out = format_config(&config, false);
        assert!(out.contains("Cache max age:    2000 ms"));
        assert!(out.contains("Retry policy:     defaults"));
        assert!(out.contains("Real-time:        off"));
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "n/a");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}
