// ### `src/telemetry/counters.rs`

//! telemetry/counters.rs
//! Mutable counters used during a packaging run.
//!
//! Summary: collects block and byte counts while streaming.
//! Converted into an immutable `TelemetrySnapshot` at run end.
use serde::{Deserialize, Serialize};

use crate::constants::BLOCK_LEN;

/// Deterministic counters collected during packaging.
#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryCounters {
    pub blocks_full: u64,
    pub blocks_padded: u64,
    pub bytes_input: u64,
    pub bytes_padding: u64,
    pub bytes_payload: u64,
    pub bytes_header: u64,
}

impl TelemetryCounters {
    /// Record the header write.
    pub fn add_header(&mut self, header_len: usize) {
        self.bytes_header += header_len as u64;
    }

    /// Record one emitted block.
    ///
    /// - `input_len`: bytes taken from the source for this block
    /// - `pad_len`: padding bytes appended (0 for a full block)
    pub fn add_block(&mut self, input_len: usize, pad_len: usize) {
        if pad_len == 0 {
            self.blocks_full += 1;
        } else {
            self.blocks_padded += 1;
        }
        self.bytes_input += input_len as u64;
        self.bytes_padding += pad_len as u64;
        self.bytes_payload += BLOCK_LEN as u64;
    }

    pub fn blocks(&self) -> u64 {
        self.blocks_full + self.blocks_padded
    }

    /// Total bytes written to the destination.
    pub fn bytes_output(&self) -> u64 {
        self.bytes_header + self.bytes_payload
    }
}
