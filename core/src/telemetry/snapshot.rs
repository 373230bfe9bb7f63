// ## src/telemetry/snapshot.rs

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::telemetry::counters::TelemetryCounters;
use crate::telemetry::timers::{StageTimes, TelemetryTimer};

/// Immutable view of a finished run: counters, throughput and stage timings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub blocks: u64,
    pub blocks_padded: u64,
    pub bytes_input: u64,
    pub bytes_padding: u64,
    pub bytes_payload: u64,
    pub bytes_output: u64,
    pub throughput_input_bytes_per_sec: f64,
    pub elapsed: Duration,
    pub stage_times: StageTimes,
}

impl TelemetrySnapshot {
    pub fn from(counters: &TelemetryCounters, timer: &TelemetryTimer) -> Self {
        let elapsed = timer.elapsed();

        let throughput = if elapsed.as_secs_f64() > 0.0 {
            counters.bytes_input as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        Self {
            blocks: counters.blocks(),
            blocks_padded: counters.blocks_padded,
            bytes_input: counters.bytes_input,
            bytes_padding: counters.bytes_padding,
            bytes_payload: counters.bytes_payload,
            bytes_output: counters.bytes_output(),
            throughput_input_bytes_per_sec: throughput,
            elapsed,
            stage_times: timer.stage_times.clone(),
        }
    }

    pub fn total_stage_time(&self) -> Duration {
        self.stage_times.total()
    }

    // Invariants:
    // - payload is input plus padding
    // - at most one padded block per run
    // - stage times never exceed elapsed
    pub fn sanity_check(&self) -> bool {
        self.bytes_payload == self.bytes_input + self.bytes_padding
            && self.blocks_padded <= 1
            && self.total_stage_time() <= self.elapsed
    }
}
