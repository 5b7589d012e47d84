//! Where tick snapshots go.

use cloudvault_protocol::TransferSnapshot;
use tokio::sync::mpsc;

use crate::TransferError;

/// Receives progress for running transfers.
///
/// Returning an error means the target is gone; the scheduler stops ticking
/// that transfer instead of propagating the error.
pub trait ProgressSink: Send + Sync + 'static {
    /// Called on every non-terminal tick.
    fn on_progress(&self, id: &str, snapshot: &TransferSnapshot) -> Result<(), TransferError>;

    /// Called exactly once, with the `Complete` or `Cancelled` snapshot.
    fn on_terminal(&self, id: &str, snapshot: &TransferSnapshot) -> Result<(), TransferError> {
        self.on_progress(id, snapshot)
    }
}

impl<F> ProgressSink for F
where
    F: Fn(&str, &TransferSnapshot) -> Result<(), TransferError> + Send + Sync + 'static,
{
    fn on_progress(&self, id: &str, snapshot: &TransferSnapshot) -> Result<(), TransferError> {
        self(id, snapshot)
    }
}

/// Event forwarded by [`ChannelSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Progress {
        id: String,
        snapshot: TransferSnapshot,
    },
    Terminal {
        id: String,
        snapshot: TransferSnapshot,
    },
}

impl ProgressEvent {
    pub fn id(&self) -> &str {
        match self {
            ProgressEvent::Progress { id, .. } | ProgressEvent::Terminal { id, .. } => id,
        }
    }

    pub fn snapshot(&self) -> &TransferSnapshot {
        match self {
            ProgressEvent::Progress { snapshot, .. } | ProgressEvent::Terminal { snapshot, .. } => {
                snapshot
            }
        }
    }
}

/// Forwards snapshots into an unbounded channel.
///
/// Dropping the receiver marks the sink as torn down.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelSink {
    /// Creates a sink and the receiver its events arrive on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: ProgressEvent) -> Result<(), TransferError> {
        self.tx
            .send(event)
            .map_err(|e| TransferError::SinkUnavailable(format!("receiver dropped for {}", e.0.id())))
    }
}

impl ProgressSink for ChannelSink {
    fn on_progress(&self, id: &str, snapshot: &TransferSnapshot) -> Result<(), TransferError> {
        self.send(ProgressEvent::Progress {
            id: id.to_string(),
            snapshot: snapshot.clone(),
        })
    }

    fn on_terminal(&self, id: &str, snapshot: &TransferSnapshot) -> Result<(), TransferError> {
        self.send(ProgressEvent::Terminal {
            id: id.to_string(),
            snapshot: snapshot.clone(),
        })
    }
}
