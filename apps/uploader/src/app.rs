//! Application orchestrator: stats files, queues them, starts the simulated
//! transfers and renders progress until every transfer has finished.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use cloudvault_transfer::{
    ChannelSink, EnqueueOutcome, FileDescriptor, IntakeQueue, ProgressEvent, TransferEngine,
    TransferSnapshot, TransferStatus,
};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::config::Config;
use crate::display;

/// Runs the uploader for `paths` until all transfers are terminal.
pub async fn run(config: Config, paths: Vec<PathBuf>) -> anyhow::Result<()> {
    let engine = TransferEngine::new(config.simulation.clone())?;

    let mut queue = engine.intake_queue();
    for path in &paths {
        if let Err(e) = add_file(&mut queue, path).await {
            tracing::warn!(path = %path.display(), error = %e, "file skipped");
            eprintln!("{e:#}");
        }
    }

    if queue.is_empty() {
        anyhow::bail!("no files to upload");
    }
    println!("{}", display::queue_summary(&queue));

    let (sink, events) = ChannelSink::new();
    let handles = engine.start_queue(&mut queue, Arc::new(sink));

    let mut names = HashMap::new();
    for handle in &handles {
        if let Ok(session) = engine.scheduler().session(handle.id()) {
            names.insert(handle.id().to_string(), session.name().to_string());
        }
    }

    let renderer = Renderer {
        names,
        bar_width: config.bar_width,
        interval: Duration::from_millis(config.render_interval_ms),
        last_render: HashMap::new(),
    };
    render_until_done(&engine, events, renderer, handles.len()).await;

    let mut completed = 0;
    for handle in handles {
        let last = handle.wait().await?;
        if last.status == TransferStatus::Complete {
            completed += 1;
        }
    }

    tracing::info!(completed, "all transfers finished");
    Ok(())
}

/// Stats `path` and offers it to the queue. Never reads file content.
async fn add_file(queue: &mut IntakeQueue, path: &Path) -> anyhow::Result<()> {
    let meta = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("cannot access {}", path.display()))?;
    if !meta.is_file() {
        anyhow::bail!("not a regular file: {}", path.display());
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let size = i64::try_from(meta.len()).context("file size out of range")?;

    match queue.enqueue(FileDescriptor::new(name.clone(), size))? {
        EnqueueOutcome::Queued => tracing::debug!(name, size, "file queued"),
        EnqueueOutcome::Duplicate => tracing::info!(name, size, "duplicate file ignored"),
    }
    Ok(())
}

struct Renderer {
    names: HashMap<String, String>,
    bar_width: usize,
    interval: Duration,
    last_render: HashMap<String, Instant>,
}

impl Renderer {
    /// Returns the line to print for `event`, or `None` if it is throttled.
    fn line(&mut self, event: &ProgressEvent, now: Instant) -> Option<String> {
        let id = event.id();
        if let ProgressEvent::Progress { .. } = event {
            if let Some(last) = self.last_render.get(id) {
                if now.duration_since(*last) < self.interval {
                    return None;
                }
            }
        }
        self.last_render.insert(id.to_string(), now);
        Some(self.render(id, event.snapshot()))
    }

    fn render(&self, id: &str, snapshot: &TransferSnapshot) -> String {
        let name = self.names.get(id).map(String::as_str).unwrap_or(id);
        display::render_line(name, snapshot, self.bar_width)
    }
}

/// Prints progress until `expected` terminal events have arrived. Ctrl-C
/// cancels every running transfer.
async fn render_until_done(
    engine: &TransferEngine,
    mut events: mpsc::UnboundedReceiver<ProgressEvent>,
    mut renderer: Renderer,
    expected: usize,
) {
    let mut remaining = expected;
    let mut interrupted = false;

    while remaining > 0 {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                if let Some(line) = renderer.line(&event, Instant::now()) {
                    println!("{line}");
                }
                if let ProgressEvent::Terminal { .. } = event {
                    remaining -= 1;
                }
            }
            _ = tokio::signal::ctrl_c(), if !interrupted => {
                interrupted = true;
                let cancelled = engine.cancel_all();
                tracing::info!(cancelled, "SIGINT received, cancelling all transfers");
            }
        }
    }
}
