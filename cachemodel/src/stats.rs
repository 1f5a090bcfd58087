use std::io::Write;
use std::time::Instant;

use serde::Serialize;

/// Running counters for one simulation session.
///
/// All counters reset together; `start_time` marks when the current session
/// began and exists for wall-clock reporting by callers.
pub struct Statistics {
    pub accesses: u64,
    pub hits: u64,
    pub misses: u64,
    pub memory_reads: u64,
    pub memory_writes: u64,
    pub start_time: Instant,
}

impl Default for Statistics {
    fn default() -> Self {
        Self::new()
    }
}

impl Statistics {
    pub fn new() -> Self {
        Self {
            accesses: 0,
            hits: 0,
            misses: 0,
            memory_reads: 0,
            memory_writes: 0,
            start_time: Instant::now(),
        }
    }

    /// Zeroes every counter and restarts the session clock.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Call once per cache access.
    pub fn record_access(&mut self, hit: bool) {
        self.accesses += 1;
        if hit {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
    }

    /// 0.0 when no accesses have been recorded yet.
    pub fn hit_rate(&self) -> f64 {
        if self.accesses == 0 {
            0.0
        } else {
            self.hits as f64 / self.accesses as f64
        }
    }

    pub fn miss_rate(&self) -> f64 {
        if self.accesses == 0 {
            0.0
        } else {
            self.misses as f64 / self.accesses as f64
        }
    }

    /// Captures the current counters and derived rates as a plain value.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            accesses: self.accesses,
            hits: self.hits,
            misses: self.misses,
            hit_rate: self.hit_rate(),
            miss_rate: self.miss_rate(),
            memory_reads: self.memory_reads,
            memory_writes: self.memory_writes,
        }
    }
}

/// A point-in-time copy of the statistics. Can be serialised to the output
/// formats consumers expect
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub accesses: u64,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub miss_rate: f64,
    pub memory_reads: u64,
    pub memory_writes: u64,
}

impl StatsSnapshot {
    /// Writes the snapshot as a two-line CSV (header + values), matching the
    /// column set external tooling consumes.
    pub fn write_csv<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        writeln!(
            writer,
            "accesses,hits,misses,hit_rate,miss_rate,memory_reads,memory_writes"
        )?;
        writeln!(
            writer,
            "{},{},{},{},{},{},{}",
            self.accesses,
            self.hits,
            self.misses,
            self.hit_rate,
            self.miss_rate,
            self.memory_reads,
            self.memory_writes
        )
    }
}
