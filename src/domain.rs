use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// maximum number of entries the POST ingestion path keeps
pub const HISTORY_CAP: usize = 100;

/// number of rows the dashboard renders
pub const DASHBOARD_ROWS: usize = 10;

/// one ingested sensor sample
///
/// immutable once created; only ever evicted in bulk when the
/// history cap pushes it off the tail.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    /// per-process monotonically increasing token
    pub id: u64,
    /// temperature in celsius
    pub temperature: f64,
    /// relative humidity (0-100%)
    pub humidity: f64,
    /// unix timestamp (ms) when the reading was constructed
    pub timestamp: u64,
    /// unix timestamp (ms) when the request arrived, before parsing
    pub received_at: u64,
    /// client identifier taken from the user-agent header, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
}

/// lighter-weight entry stored by the query-string ingestion variant
///
/// values are kept exactly as received on the wire, no numeric coercion.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SimpleReading {
    /// unix timestamp (ms) at insertion
    pub timestamp: u64,
    pub temperature: String,
    pub humidity: String,
    /// request method marker, always "GET"
    pub method: String,
}

/// the history holds both entry kinds in one sequence, each serialized
/// with its own shape
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(untagged)]
pub enum HistoryEntry {
    Reading(Reading),
    Simple(SimpleReading),
}

impl HistoryEntry {
    pub fn timestamp(&self) -> u64 {
        match self {
            HistoryEntry::Reading(r) => r.timestamp,
            HistoryEntry::Simple(s) => s.timestamp,
        }
    }

    /// temperature as shown on the dashboard
    pub fn temperature_display(&self) -> String {
        match self {
            HistoryEntry::Reading(r) => format!("{:.1}", r.temperature),
            HistoryEntry::Simple(s) => s.temperature.clone(),
        }
    }

    /// humidity as shown on the dashboard
    pub fn humidity_display(&self) -> String {
        match self {
            HistoryEntry::Reading(r) => format!("{:.1}", r.humidity),
            HistoryEntry::Simple(s) => s.humidity.clone(),
        }
    }
}

/// capped, most-recent-first sequence of readings
#[derive(Clone, Default, Serialize)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
}

impl History {
    /// insert a reading at the front and enforce the capacity cap
    ///
    /// tail entries beyond the cap are discarded in the same operation,
    /// so the length invariant holds after every call.
    pub fn record(&mut self, reading: Reading) {
        self.entries.push_front(HistoryEntry::Reading(reading));
        self.entries.truncate(HISTORY_CAP);
    }

    /// insert a query-string entry at the front WITHOUT enforcing the cap
    ///
    /// the cap is specific to the POST path; this divergence is kept for
    /// parity with deployed clients. see DESIGN.md.
    pub fn record_unbounded(&mut self, entry: SimpleReading) {
        self.entries.push_front(HistoryEntry::Simple(entry));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &VecDeque<HistoryEntry> {
        &self.entries
    }

    /// the `n` most recent entries, newest first
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter().take(n)
    }
}

/// process-wide request tallies
///
/// counts only move up; `last_request` is null until the first
/// ingest request arrives.
#[derive(Clone, Default, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Counters {
    pub total_requests: u64,
    pub successful_posts: u64,
    pub last_request: Option<u64>,
}

/// shared state mutated by the ingestion path and read by every query
/// endpoint
///
/// held behind Arc<RwLock<...>> by the server: the original ran on a
/// single-threaded event loop and got serialization for free, tokio
/// does not, so the lock is load-bearing for the cap/ordering invariants.
#[derive(Default)]
pub struct AppState {
    pub history: History,
    pub counters: Counters,
    next_id: u64,
}

impl AppState {
    /// hand out the next reading token
    pub fn next_reading_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}
