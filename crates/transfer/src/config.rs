use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{DEFAULT_CHUNK_SIZE, DEFAULT_MAX_FILE_SIZE, MIB, TransferError};

/// Tunables for the transfer simulation.
///
/// Every field has a default, so a partial config file is enough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Files larger than this are rejected at intake.
    #[serde(default = "default_max_file_size")]
    pub max_file_size_bytes: u64,

    /// Size of one simulated chunk.
    #[serde(default = "default_chunk_size")]
    pub chunk_size_bytes: u64,

    /// Lower bound of the per-session throughput draw.
    #[serde(default = "default_throughput_min")]
    pub throughput_min_bytes_per_sec: f64,

    /// Upper bound of the per-session throughput draw.
    #[serde(default = "default_throughput_max")]
    pub throughput_max_bytes_per_sec: f64,

    /// Delay between two ticks of one session (one display frame at 60 Hz).
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Delay between the starts of consecutive transfers of one batch.
    #[serde(default = "default_start_stagger_ms")]
    pub start_stagger_ms: u64,

    /// How long a front end keeps a finished transfer on screen. Not used by
    /// the simulation itself.
    #[serde(default = "default_terminal_retention_ms")]
    pub terminal_retention_ms: u64,
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

fn default_chunk_size() -> u64 {
    DEFAULT_CHUNK_SIZE
}

fn default_throughput_min() -> f64 {
    (50 * MIB) as f64
}

fn default_throughput_max() -> f64 {
    (200 * MIB) as f64
}

fn default_tick_interval_ms() -> u64 {
    16
}

fn default_start_stagger_ms() -> u64 {
    100
}

fn default_terminal_retention_ms() -> u64 {
    5000
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: default_max_file_size(),
            chunk_size_bytes: default_chunk_size(),
            throughput_min_bytes_per_sec: default_throughput_min(),
            throughput_max_bytes_per_sec: default_throughput_max(),
            tick_interval_ms: default_tick_interval_ms(),
            start_stagger_ms: default_start_stagger_ms(),
            terminal_retention_ms: default_terminal_retention_ms(),
        }
    }
}

impl SimulationConfig {
    /// Checks that the values describe a runnable simulation.
    pub fn validate(&self) -> Result<(), TransferError> {
        if self.chunk_size_bytes == 0 {
            return Err(TransferError::InvalidConfig(
                "chunk size must be positive".into(),
            ));
        }
        if self.tick_interval_ms == 0 {
            return Err(TransferError::InvalidConfig(
                "tick interval must be positive".into(),
            ));
        }

        let (min, max) = (
            self.throughput_min_bytes_per_sec,
            self.throughput_max_bytes_per_sec,
        );
        if !min.is_finite() || !max.is_finite() || min <= 0.0 {
            return Err(TransferError::InvalidConfig(format!(
                "throughput bounds must be finite and positive: [{min}, {max}]"
            )));
        }
        if min > max {
            return Err(TransferError::InvalidConfig(format!(
                "throughput minimum {min} exceeds maximum {max}"
            )));
        }

        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn start_stagger(&self) -> Duration {
        Duration::from_millis(self.start_stagger_ms)
    }

    pub fn terminal_retention(&self) -> Duration {
        Duration::from_millis(self.terminal_retention_ms)
    }
}
