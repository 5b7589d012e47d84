use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use cloudvault_protocol::{TransferSnapshot, TransferStatus};

use crate::{SimulationConfig, ThroughputSource, TransferError};

/// One file's simulated transfer (thread-safe).
///
/// Size, chunk size and throughput are fixed at creation; only elapsed time
/// and the cancellation flag move the derived state.
pub struct TransferSession {
    id: String,
    name: String,
    total_bytes: u64,
    chunk_size: u64,
    total_chunks: u64,
    throughput: f64,
    state: Mutex<SessionState>,
}

struct SessionState {
    started_at: Option<Instant>,
    cancelled: bool,
    /// Last snapshot handed out. Once terminal it is returned verbatim.
    last: Option<TransferSnapshot>,
}

impl TransferSession {
    /// Creates a session for a file of `total_bytes`, drawing its throughput
    /// from `source` within the configured range.
    pub fn create(
        name: impl Into<String>,
        total_bytes: i64,
        config: &SimulationConfig,
        source: &dyn ThroughputSource,
    ) -> Result<Self, TransferError> {
        let name = name.into();
        let total_bytes = checked_size(&name, total_bytes, config.max_file_size_bytes)?;
        if config.chunk_size_bytes == 0 {
            return Err(TransferError::InvalidConfig(
                "chunk size must be positive".into(),
            ));
        }

        let throughput = source.draw(
            config.throughput_min_bytes_per_sec,
            config.throughput_max_bytes_per_sec,
        );
        if !throughput.is_finite() || throughput <= 0.0 {
            return Err(TransferError::InvalidConfig(format!(
                "throughput must be finite and positive, got {throughput}"
            )));
        }

        Ok(Self::new(
            uuid::Uuid::new_v4().to_string(),
            name,
            total_bytes,
            config.chunk_size_bytes,
            throughput,
        ))
    }

    /// Builds a session from already validated parts.
    pub(crate) fn new(
        id: String,
        name: String,
        total_bytes: u64,
        chunk_size: u64,
        throughput: f64,
    ) -> Self {
        Self {
            id,
            name,
            total_bytes,
            chunk_size,
            total_chunks: total_bytes.div_ceil(chunk_size),
            throughput,
            state: Mutex::new(SessionState {
                started_at: None,
                cancelled: false,
                last: None,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Requests cancellation. No-op if already cancelled or terminal.
    pub fn cancel(&self) {
        let mut s = self.state();
        if s.last.as_ref().is_some_and(TransferSnapshot::is_terminal) {
            return;
        }
        s.cancelled = true;
    }

    /// Computes progress at `now`.
    ///
    /// The first call fixes the start time. Once a terminal snapshot has been
    /// returned, every later call returns that same snapshot.
    pub fn snapshot(&self, now: Instant) -> TransferSnapshot {
        let mut s = self.state();

        if let Some(last) = s.last.as_ref().filter(|last| last.is_terminal()) {
            return last.clone();
        }

        let snapshot = if s.cancelled {
            // Frozen at whatever was last computed, or at 0% if nothing was.
            let mut frozen = match s.last.clone() {
                Some(last) => last,
                None => {
                    let mut initial = self.compute(Duration::ZERO);
                    initial.percent = 0.0;
                    initial
                }
            };
            frozen.status = TransferStatus::Cancelled;
            frozen
        } else {
            let started_at = *s.started_at.get_or_insert(now);
            self.compute(now.saturating_duration_since(started_at))
        };

        s.last = Some(snapshot.clone());
        snapshot
    }

    fn compute(&self, elapsed: Duration) -> TransferSnapshot {
        let total = self.total_bytes as f64;
        let elapsed_seconds = elapsed.as_secs_f64();
        let transferred = (self.throughput * elapsed_seconds).min(total);

        let percent = if self.total_bytes == 0 {
            100.0
        } else {
            (transferred / total * 100.0).clamp(0.0, 100.0)
        };
        let transferred_bytes = (transferred as u64).min(self.total_bytes);
        let current_chunk = (transferred_bytes / self.chunk_size + 1).min(self.total_chunks);

        let status = if transferred >= total {
            TransferStatus::Complete
        } else {
            TransferStatus::Transferring
        };

        TransferSnapshot {
            status,
            percent,
            transferred_bytes,
            total_bytes: self.total_bytes,
            current_chunk,
            total_chunks: self.total_chunks,
            remaining_seconds: (total - transferred) / self.throughput,
            elapsed_seconds,
            throughput_bytes_per_sec: self.throughput,
        }
    }

    /// Returns the status as last observed; `Preparing` before the first tick.
    pub fn status(&self) -> TransferStatus {
        let s = self.state();
        match &s.last {
            Some(last) if last.is_terminal() => last.status,
            _ if s.cancelled => TransferStatus::Cancelled,
            Some(last) => last.status,
            None => TransferStatus::Preparing,
        }
    }

    /// Returns the last snapshot handed out, if any.
    pub fn last_snapshot(&self) -> Option<TransferSnapshot> {
        self.state().last.clone()
    }

    /// Returns `true` once cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.state().cancelled
    }

    /// Returns `true` once a terminal snapshot has been handed out.
    pub fn is_terminal(&self) -> bool {
        self.state()
            .last
            .as_ref()
            .is_some_and(TransferSnapshot::is_terminal)
    }

    /// Returns the time of the first progress query.
    pub fn started_at(&self) -> Option<Instant> {
        self.state().started_at
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the file name this session was created for.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    pub fn total_chunks(&self) -> u64 {
        self.total_chunks
    }

    pub fn throughput_bytes_per_sec(&self) -> f64 {
        self.throughput
    }
}

impl std::fmt::Debug for TransferSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferSession")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("total_bytes", &self.total_bytes)
            .field("throughput", &self.throughput)
            .field("status", &self.status())
            .finish()
    }
}

/// Validates a file size against the intake limit.
pub(crate) fn checked_size(name: &str, size: i64, max: u64) -> Result<u64, TransferError> {
    let size = u64::try_from(size).map_err(|_| {
        TransferError::InvalidInput(format!("file \"{name}\" has a negative size ({size})"))
    })?;
    if size > max {
        return Err(TransferError::InvalidInput(format!(
            "file \"{name}\" exceeds the maximum size of {max} bytes"
        )));
    }
    Ok(size)
}
