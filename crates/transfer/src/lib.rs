//! Simulated chunked file transfer with progress tracking and cancellation.
//!
//! A [`TransferSession`] turns elapsed time into progress for one file. The
//! [`Scheduler`] drives sessions through a tick loop and pushes snapshots to a
//! [`ProgressSink`]. [`TransferEngine`] ties both to an [`IntakeQueue`] and a
//! [`SimulationConfig`].

mod config;
mod engine;
mod intake;
mod scheduler;
mod session;
mod sink;
mod throughput;

pub use config::SimulationConfig;
pub use engine::TransferEngine;
pub use intake::{EnqueueOutcome, IntakeQueue};
pub use scheduler::{Scheduler, TransferHandle};
pub use session::TransferSession;
pub use sink::{ChannelSink, ProgressEvent, ProgressSink};
pub use throughput::{FixedThroughput, ThroughputSource, UniformThroughput};

pub use cloudvault_protocol::{FileDescriptor, TransferSnapshot, TransferStatus};

/// One mebibyte.
pub const MIB: u64 = 1024 * 1024;

/// One gibibyte.
pub const GIB: u64 = 1024 * MIB;

/// Default chunk size: 100 MiB.
pub const DEFAULT_CHUNK_SIZE: u64 = 100 * MIB;

/// Default intake limit: 500 GiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 500 * GIB;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("progress sink unavailable: {0}")]
    SinkUnavailable(String),

    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("transfer task failed: {0}")]
    Task(String),
}
