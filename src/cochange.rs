//! Co-change history loading
//!
//! The structural graph alone cannot see shotgun surgery; an optional
//! external collaborator supplies historical co-change records (unit id +
//! timestamp of a coordinated edit) as newline-delimited JSON. Absence of
//! the source is graceful degradation; a corrupt source is fatal, since a
//! partial history would silently skew the drift verdict.

use std::path::Path;

use chrono::{DateTime, Utc};
use rustc_hash::FxHashSet;
use serde::Deserialize;
use tracing::debug;

use crate::errors::EngineError;

/// One coordinated-edit record.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoChangeRecord {
    pub unit: String,
    pub timestamp: DateTime<Utc>,
}

/// Load newline-delimited JSON co-change records.
pub fn load_records(path: &Path) -> Result<Vec<CoChangeRecord>, EngineError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| EngineError::config(format!("cannot read {}: {e}", path.display())))?;

    let mut records = Vec::new();
    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record: CoChangeRecord = serde_json::from_str(line).map_err(|e| {
            EngineError::config(format!(
                "{}:{}: invalid co-change record: {e}",
                path.display(),
                number + 1
            ))
        })?;
        records.push(record);
    }
    debug!(
        "loaded {} co-change record(s) from {}",
        records.len(),
        path.display()
    );
    Ok(records)
}

/// Group records into change events by timestamp proximity.
///
/// Records within `window_secs` of the event start belong to one event;
/// a window of 0 groups records sharing the same second. Each event is
/// the set of units edited together.
pub fn group_events(records: &[CoChangeRecord], window_secs: i64) -> Vec<FxHashSet<String>> {
    let mut sorted: Vec<&CoChangeRecord> = records.iter().collect();
    sorted.sort_by_key(|r| (r.timestamp, r.unit.clone()));

    let mut events: Vec<FxHashSet<String>> = Vec::new();
    let mut event_start: Option<i64> = None;

    for record in sorted {
        let ts = record.timestamp.timestamp();
        match event_start {
            Some(start) if ts - start <= window_secs => {
                if let Some(event) = events.last_mut() {
                    event.insert(record.unit.clone());
                }
            }
            _ => {
                event_start = Some(ts);
                let mut event = FxHashSet::default();
                event.insert(record.unit.clone());
                events.push(event);
            }
        }
    }
    events
}
