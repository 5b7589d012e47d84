//! Human-readable rendering of transfer progress.

use cloudvault_transfer::{GIB, IntakeQueue, MIB, TransferSnapshot, TransferStatus};

/// Files above this size are labelled as chunked transfers.
pub const LARGE_FILE_THRESHOLD: u64 = GIB;

const SIZE_UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

pub fn is_large_file(total_bytes: u64) -> bool {
    total_bytes > LARGE_FILE_THRESHOLD
}

/// Formats a byte count with base-1024 units and at most two decimals.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".into();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let formatted = format!("{value:.2}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", SIZE_UNITS[unit])
}

/// Formats a duration in seconds as `42s`, `3m 5s` or `2h 10m`.
pub fn format_time_remaining(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    if seconds < 60.0 {
        return format!("{}s", seconds.round() as u64);
    }
    if seconds < 3600.0 {
        let minutes = (seconds / 60.0).floor() as u64;
        let rest = (seconds % 60.0).floor() as u64;
        return format!("{minutes}m {rest}s");
    }
    let hours = (seconds / 3600.0).floor() as u64;
    let minutes = ((seconds % 3600.0) / 60.0).floor() as u64;
    format!("{hours}h {minutes}m")
}

/// Left-hand status text for one transfer.
pub fn status_line(snapshot: &TransferSnapshot) -> String {
    let large = is_large_file(snapshot.total_bytes);
    match snapshot.status {
        TransferStatus::Preparing if large => "Initializing chunked transfer...".into(),
        TransferStatus::Preparing => "Starting upload...".into(),
        TransferStatus::Transferring if large => format!(
            "Chunk {}/{} • {:.1}%",
            snapshot.current_chunk, snapshot.total_chunks, snapshot.percent
        ),
        TransferStatus::Transferring => format!("Uploading... {:.1}%", snapshot.percent),
        TransferStatus::Complete => "Complete".into(),
        TransferStatus::Cancelled => "Cancelled".into(),
    }
}

/// Right-hand speed text for one transfer.
pub fn speed_line(snapshot: &TransferSnapshot) -> String {
    match snapshot.status {
        TransferStatus::Transferring => format!(
            "{:.0} MB/s • {} left",
            snapshot.throughput_bytes_per_sec / MIB as f64,
            format_time_remaining(snapshot.remaining_seconds)
        ),
        TransferStatus::Complete => format!("Uploaded in {:.1}s", snapshot.elapsed_seconds),
        TransferStatus::Preparing | TransferStatus::Cancelled => "--".into(),
    }
}

/// Text progress bar, `width` cells wide.
pub fn progress_bar(percent: f64, width: usize) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

/// Summary of the pending queue, e.g. `2 files (1.5 GB)`.
pub fn queue_summary(queue: &IntakeQueue) -> String {
    match queue.len() {
        0 => "0 files selected".into(),
        1 => format!("1 file ({})", format_file_size(queue.total_bytes())),
        n => format!("{n} files ({})", format_file_size(queue.total_bytes())),
    }
}

/// One full line for a transfer.
pub fn render_line(name: &str, snapshot: &TransferSnapshot, bar_width: usize) -> String {
    let mut size = format_file_size(snapshot.total_bytes);
    if is_large_file(snapshot.total_bytes) {
        size.push_str(" • Chunked Transfer");
    }
    format!(
        "{name} ({size}) {} {} | {}",
        progress_bar(snapshot.percent, bar_width),
        status_line(snapshot),
        speed_line(snapshot)
    )
}
