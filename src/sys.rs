//! small system introspection helpers for the health endpoint

use serde::Serialize;
use sysinfo::System;

/// get current timestamp in milliseconds (unix epoch)
pub fn timestamp_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// memory usage as reported on /api/health
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemorySnapshot {
    /// resident set size of this process in bytes, 0 if unavailable
    pub process_bytes: u64,
    /// used system memory in bytes
    pub used_bytes: u64,
    /// total system memory in bytes
    pub total_bytes: u64,
}

/// take a fresh memory snapshot
///
/// refreshes sysinfo on every call; the health endpoint is low-traffic
/// enough that caching would only add staleness.
pub fn memory_snapshot() -> MemorySnapshot {
    let mut sys = System::new();
    sys.refresh_memory();
    sys.refresh_processes();

    let process_bytes = sysinfo::get_current_pid()
        .ok()
        .and_then(|pid| sys.process(pid))
        .map(|p| p.memory())
        .unwrap_or(0);

    MemorySnapshot {
        process_bytes,
        used_bytes: sys.used_memory(),
        total_bytes: sys.total_memory(),
    }
}

// ==============================================================================
// tests
// ==============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp() {
        let ts = timestamp_ms();
        // should be after 2024
        assert!(ts > 1700000000000, "timestamp should be after 2024");
    }

    #[test]
    fn test_memory_snapshot() {
        let snap = memory_snapshot();
        assert!(snap.total_bytes > 0);
        assert!(snap.used_bytes <= snap.total_bytes);
    }
}
