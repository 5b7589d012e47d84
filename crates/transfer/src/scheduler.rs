use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use cloudvault_protocol::TransferSnapshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{ProgressSink, TransferError, TransferSession};

/// Default delay between two ticks: one frame at 60 Hz.
const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(16);

/// Drives transfer sessions through their tick loops.
///
/// Each started session gets its own tokio task and an entry in this
/// scheduler's registry so it can be cancelled by id.
pub struct Scheduler {
    registry: Arc<Mutex<Registry>>,
    tick_interval: Duration,
}

type Registry = HashMap<String, Entry>;

struct Entry {
    session: Arc<TransferSession>,
    /// Wakes the tick loop as soon as the session is cancelled.
    cancel: CancellationToken,
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Removes `session`'s entry, unless the id now belongs to another session.
fn deregister(registry: &Mutex<Registry>, session: &Arc<TransferSession>) {
    let mut registry = lock(registry);
    if registry
        .get(session.id())
        .is_some_and(|entry| Arc::ptr_eq(&entry.session, session))
    {
        registry.remove(session.id());
    }
}

/// Handle to a running tick loop.
#[derive(Debug)]
pub struct TransferHandle {
    id: String,
    task: JoinHandle<TransferSnapshot>,
}

impl TransferHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns `true` once the tick loop has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the tick loop to exit and returns the last snapshot it
    /// computed: terminal, unless the sink went away first.
    pub async fn wait(self) -> Result<TransferSnapshot, TransferError> {
        self.task
            .await
            .map_err(|e| TransferError::Task(format!("{}: {e}", self.id)))
    }
}

impl Scheduler {
    /// Creates a scheduler ticking every `tick_interval`.
    ///
    /// If `tick_interval` is `None` or zero, defaults to 16 ms.
    pub fn new(tick_interval: Option<Duration>) -> Self {
        Self {
            registry: Arc::new(Mutex::new(HashMap::new())),
            tick_interval: tick_interval
                .filter(|i| !i.is_zero())
                .unwrap_or(DEFAULT_TICK_INTERVAL),
        }
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Starts ticking `session`, reporting every snapshot to `sink`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        &self,
        session: Arc<TransferSession>,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<TransferHandle, TransferError> {
        self.start_after(session, sink, Duration::ZERO)
    }

    /// Like [`start`](Self::start), but the first tick happens after `delay`.
    ///
    /// The session is registered immediately, so it can be cancelled while
    /// waiting; its first tick then reports `Cancelled`. A session that was
    /// already cancelled or has finished cannot be started again.
    pub fn start_after(
        &self,
        session: Arc<TransferSession>,
        sink: Arc<dyn ProgressSink>,
        delay: Duration,
    ) -> Result<TransferHandle, TransferError> {
        let id = session.id().to_string();
        if session.is_terminal() || session.is_cancelled() {
            return Err(TransferError::InvalidInput(format!(
                "transfer already finished: {id}"
            )));
        }

        let cancel = CancellationToken::new();
        {
            let mut registry = lock(&self.registry);
            if registry.contains_key(&id) {
                return Err(TransferError::InvalidInput(format!(
                    "transfer already running: {id}"
                )));
            }
            registry.insert(
                id.clone(),
                Entry {
                    session: Arc::clone(&session),
                    cancel: cancel.clone(),
                },
            );
        }

        tracing::info!(
            id = %id,
            name = session.name(),
            total_bytes = session.total_bytes(),
            total_chunks = session.total_chunks(),
            throughput = session.throughput_bytes_per_sec(),
            "transfer started"
        );

        let registry = Arc::clone(&self.registry);
        let tick_interval = self.tick_interval;
        let task = tokio::spawn(async move {
            let last = tick_loop(&session, sink.as_ref(), &cancel, tick_interval, delay).await;
            deregister(&registry, &session);
            last
        });

        Ok(TransferHandle { id, task })
    }

    /// Cancels a running transfer. Unknown or finished ids are ignored.
    ///
    /// Returns `true` if a registered transfer was cancelled.
    pub fn cancel(&self, id: &str) -> bool {
        let Some(entry) = lock(&self.registry).remove(id) else {
            return false;
        };
        entry.session.cancel();
        entry.cancel.cancel();
        tracing::info!(id, name = entry.session.name(), "transfer cancelled");
        true
    }

    /// Cancels every running transfer and returns how many were cancelled.
    pub fn cancel_all(&self) -> usize {
        let ids: Vec<String> = lock(&self.registry).keys().cloned().collect();
        ids.iter().filter(|id| self.cancel(id)).count()
    }

    /// Returns a running session by id.
    pub fn session(&self, id: &str) -> Result<Arc<TransferSession>, TransferError> {
        lock(&self.registry)
            .get(id)
            .map(|entry| Arc::clone(&entry.session))
            .ok_or_else(|| TransferError::SessionNotFound(id.to_string()))
    }

    pub fn is_active(&self, id: &str) -> bool {
        lock(&self.registry).contains_key(id)
    }

    pub fn active_count(&self) -> usize {
        lock(&self.registry).len()
    }

    pub fn active_ids(&self) -> Vec<String> {
        lock(&self.registry).keys().cloned().collect()
    }
}

/// Computes and reports one snapshot per tick until a terminal snapshot has
/// been delivered or the sink is gone.
async fn tick_loop(
    session: &TransferSession,
    sink: &dyn ProgressSink,
    cancel: &CancellationToken,
    tick_interval: Duration,
    delay: Duration,
) -> TransferSnapshot {
    let id = session.id();

    if !delay.is_zero() {
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = cancel.cancelled() => {}
        }
    }

    let mut ticker = tokio::time::interval(tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = cancel.cancelled() => {}
        }

        let snapshot = session.snapshot(Instant::now().into_std());
        let terminal = snapshot.is_terminal();
        let delivered = if terminal {
            sink.on_terminal(id, &snapshot)
        } else {
            sink.on_progress(id, &snapshot)
        };

        if let Err(e) = delivered {
            tracing::debug!(id, error = %e, "progress sink gone, stopping transfer");
            return snapshot;
        }

        if terminal {
            tracing::info!(
                id,
                status = ?snapshot.status,
                percent = snapshot.percent,
                elapsed = snapshot.elapsed_seconds,
                "transfer finished"
            );
            return snapshot;
        }
    }
}
