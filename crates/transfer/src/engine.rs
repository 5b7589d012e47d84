use std::sync::Arc;

use cloudvault_protocol::FileDescriptor;

use crate::{
    IntakeQueue, ProgressSink, Scheduler, SimulationConfig, ThroughputSource, TransferError,
    TransferHandle, TransferSession, UniformThroughput,
};

/// Creates sessions from file descriptors and runs them on a [`Scheduler`].
pub struct TransferEngine {
    config: SimulationConfig,
    throughput: Box<dyn ThroughputSource>,
    scheduler: Scheduler,
}

impl TransferEngine {
    /// Creates an engine drawing throughput uniformly from the configured range.
    pub fn new(config: SimulationConfig) -> Result<Self, TransferError> {
        Self::with_throughput_source(config, Box::new(UniformThroughput))
    }

    /// Creates an engine with a custom throughput source.
    pub fn with_throughput_source(
        config: SimulationConfig,
        throughput: Box<dyn ThroughputSource>,
    ) -> Result<Self, TransferError> {
        config.validate()?;
        let scheduler = Scheduler::new(Some(config.tick_interval()));
        Ok(Self {
            config,
            throughput,
            scheduler,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Returns an empty intake queue using this engine's size limit.
    pub fn intake_queue(&self) -> IntakeQueue {
        IntakeQueue::new(self.config.max_file_size_bytes)
    }

    /// Creates a session for `file` without starting it.
    pub fn create_session(&self, file: &FileDescriptor) -> Result<Arc<TransferSession>, TransferError> {
        TransferSession::create(
            file.name.clone(),
            file.size_bytes,
            &self.config,
            self.throughput.as_ref(),
        )
        .map(Arc::new)
    }

    /// Creates a session for `file` and starts it right away.
    pub fn enqueue(
        &self,
        file: &FileDescriptor,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<TransferHandle, TransferError> {
        let session = self.create_session(file)?;
        self.scheduler.start(session, sink)
    }

    /// Drains `queue` and starts one transfer per file, staggering the starts
    /// by the configured delay.
    ///
    /// Files that fail to start are logged and skipped.
    pub fn start_queue(
        &self,
        queue: &mut IntakeQueue,
        sink: Arc<dyn ProgressSink>,
    ) -> Vec<TransferHandle> {
        let stagger = self.config.start_stagger();
        let mut handles = Vec::with_capacity(queue.len());

        for (index, file) in queue.take().into_iter().enumerate() {
            let started = self.create_session(&file).and_then(|session| {
                self.scheduler
                    .start_after(session, Arc::clone(&sink), stagger * index as u32)
            });
            match started {
                Ok(handle) => handles.push(handle),
                Err(e) => tracing::warn!(name = %file.name, error = %e, "failed to start transfer"),
            }
        }

        handles
    }

    /// Cancels one transfer. See [`Scheduler::cancel`].
    pub fn cancel(&self, id: &str) -> bool {
        self.scheduler.cancel(id)
    }

    /// Cancels every running transfer.
    pub fn cancel_all(&self) -> usize {
        self.scheduler.cancel_all()
    }

    pub fn active_count(&self) -> usize {
        self.scheduler.active_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChannelSink, FixedThroughput, GIB, MIB, ProgressEvent, TransferStatus};

    fn engine() -> TransferEngine {
        TransferEngine::with_throughput_source(
            SimulationConfig::default(),
            Box::new(FixedThroughput((100 * MIB) as f64)),
        )
        .unwrap()
    }

    #[test]
    fn rejects_invalid_config() {
        let config = SimulationConfig {
            chunk_size_bytes: 0,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            TransferEngine::new(config),
            Err(TransferError::InvalidConfig(_))
        ));
    }

    #[test]
    fn create_session_uses_config() {
        let engine = engine();
        let session = engine
            .create_session(&FileDescriptor::new("movie.mkv", (10 * GIB) as i64))
            .unwrap();
        assert_eq!(session.total_chunks(), 103);
        assert_eq!(session.throughput_bytes_per_sec(), (100 * MIB) as f64);
        assert_eq!(session.status(), TransferStatus::Preparing);
    }

    #[test]
    fn create_session_rejects_oversized() {
        let engine = engine();
        let err = engine
            .create_session(&FileDescriptor::new("vm.img", (600 * GIB) as i64))
            .unwrap_err();
        assert!(matches!(err, TransferError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn enqueue_runs_to_completion() {
        tokio::time::pause();

        let engine = engine();
        let (sink, mut rx) = ChannelSink::new();
        let handle = engine
            .enqueue(&FileDescriptor::new("notes.txt", (5 * MIB) as i64), Arc::new(sink))
            .unwrap();
        let id = handle.id().to_string();

        let last = handle.wait().await.unwrap();
        assert_eq!(last.status, TransferStatus::Complete);

        let mut terminal = None;
        while let Ok(event) = rx.try_recv() {
            assert_eq!(event.id(), id);
            if let ProgressEvent::Terminal { snapshot, .. } = event {
                terminal = Some(snapshot);
            }
        }
        assert_eq!(terminal.unwrap().status, TransferStatus::Complete);
        assert_eq!(engine.active_count(), 0);
    }

    #[tokio::test]
    async fn start_queue_drains_and_staggers() {
        tokio::time::pause();

        let engine = engine();
        let mut queue = engine.intake_queue();
        queue.enqueue(FileDescriptor::new("a.bin", MIB as i64)).unwrap();
        queue.enqueue(FileDescriptor::new("a.bin", MIB as i64)).unwrap();
        queue.enqueue(FileDescriptor::new("b.bin", (2 * MIB) as i64)).unwrap();
        queue.enqueue(FileDescriptor::new("c.bin", 0)).unwrap();

        let (sink, _rx) = ChannelSink::new();
        let sink: Arc<dyn ProgressSink> = Arc::new(sink);
        let handles = engine.start_queue(&mut queue, sink);
        assert!(queue.is_empty());
        assert_eq!(handles.len(), 3);
        assert_eq!(engine.active_count(), 3);

        let ids: Vec<String> = handles.iter().map(|h| h.id().to_string()).collect();
        let second = engine.scheduler().session(&ids[1]).unwrap();
        let third = engine.scheduler().session(&ids[2]).unwrap();

        for handle in handles {
            assert_eq!(handle.wait().await.unwrap().status, TransferStatus::Complete);
        }

        let gap = third.started_at().unwrap() - second.started_at().unwrap();
        assert!(gap >= engine.config().start_stagger());
    }

    #[tokio::test]
    async fn cancel_all_through_engine() {
        tokio::time::pause();

        let engine = engine();
        let (sink, _rx) = ChannelSink::new();
        let sink: Arc<dyn ProgressSink> = Arc::new(sink);
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let file = FileDescriptor::new(format!("part{i}.tar"), (50 * GIB) as i64);
                engine.enqueue(&file, Arc::clone(&sink)).unwrap()
            })
            .collect();

        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        assert_eq!(engine.cancel_all(), 4);
        assert_eq!(engine.active_count(), 0);
        for handle in handles {
            assert_eq!(handle.wait().await.unwrap().status, TransferStatus::Cancelled);
        }
        assert!(!engine.cancel("anything"));
    }
}
