// ## src/telemetry/timers.rs

//! telemetry/timers.rs
//! Stage timers for the packaging run.
//!
//! Summary: accumulates durations for clock, read, checksum, encrypt, write,
//! header and close stages.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Clock,
    Read,
    Checksum,
    Encrypt,
    Write,
    Header,
    Close,
}

impl Stage {
    /// Run order.
    pub const ALL: [Stage; 7] = [
        Stage::Clock,
        Stage::Read,
        Stage::Checksum,
        Stage::Encrypt,
        Stage::Write,
        Stage::Header,
        Stage::Close,
    ];
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Clock    => "clock",
            Stage::Read     => "read",
            Stage::Checksum => "checksum",
            Stage::Encrypt  => "encrypt",
            Stage::Write    => "write",
            Stage::Header   => "header",
            Stage::Close    => "close",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageTimes {
    times: HashMap<Stage, Duration>,
}

impl StageTimes {
    /// Add duration to a stage (accumulates if already present).
    pub fn add(&mut self, stage: Stage, dur: Duration) {
        *self.times.entry(stage).or_insert(Duration::ZERO) += dur;
    }

    /// Time charged to `stage`, `None` if the run never entered it.
    pub fn get(&self, stage: Stage) -> Option<Duration> {
        self.times.get(&stage).copied()
    }

    /// Sum all stage durations.
    pub fn total(&self) -> Duration {
        self.times.values().copied().sum()
    }
}

#[derive(Clone, Debug)]
pub struct TelemetryTimer {
    pub start_time: Instant,
    pub end_time: Option<Instant>,
    pub stage_times: StageTimes,
}

impl TelemetryTimer {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            end_time: None,
            stage_times: StageTimes::default(),
        }
    }

    pub fn finish(&mut self) {
        self.end_time = Some(Instant::now());
    }

    /// Run `f`, charging its wall time to `stage`.
    #[inline]
    pub fn time<T>(&mut self, stage: Stage, f: impl FnOnce() -> T) -> T {
        let t = Instant::now();
        let out = f();
        self.stage_times.add(stage, t.elapsed());
        out
    }

    pub fn elapsed(&self) -> Duration {
        match self.end_time {
            Some(end) => end.duration_since(self.start_time),
            None => Instant::now().duration_since(self.start_time),
        }
    }
}

impl Default for TelemetryTimer {
    fn default() -> Self {
        Self::new()
    }
}
