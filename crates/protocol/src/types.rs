use serde::{Deserialize, Serialize};

/// A local file offered for transfer.
///
/// The engine only ever looks at `size_bytes`; file content is never read.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    pub name: String,
    /// Signed so that bogus sizes coming over the boundary can be rejected
    /// instead of silently wrapping.
    pub size_bytes: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl FileDescriptor {
    /// Creates a descriptor without a MIME type.
    pub fn new(name: impl Into<String>, size_bytes: i64) -> Self {
        Self {
            name: name.into(),
            size_bytes,
            mime_type: None,
        }
    }

    /// Sets the MIME type.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Returns `true` if `other` names the same file (matched by name and size).
    pub fn same_file(&self, other: &FileDescriptor) -> bool {
        self.name == other.name && self.size_bytes == other.size_bytes
    }
}

/// Current state of a simulated transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferStatus {
    /// No tick has been observed yet.
    #[serde(rename = "preparing")]
    Preparing,
    #[serde(rename = "transferring")]
    Transferring,
    #[serde(rename = "cancelled")]
    Cancelled,
    #[serde(rename = "complete")]
    Complete,
}

impl TransferStatus {
    /// Returns `true` for `Complete` and `Cancelled`; no tick follows either.
    pub fn is_terminal(self) -> bool {
        matches!(self, TransferStatus::Complete | TransferStatus::Cancelled)
    }
}

/// Point-in-time progress readout for one transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferSnapshot {
    pub status: TransferStatus,
    /// Always within `0.0..=100.0`.
    pub percent: f64,
    pub transferred_bytes: u64,
    pub total_bytes: u64,
    /// 1-based index of the chunk in flight, capped at `total_chunks`.
    pub current_chunk: u64,
    pub total_chunks: u64,
    pub remaining_seconds: f64,
    pub elapsed_seconds: f64,
    pub throughput_bytes_per_sec: f64,
}

impl TransferSnapshot {
    /// Returns `true` if no further snapshot will follow this one.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serialization() {
        assert_eq!(
            serde_json::to_string(&TransferStatus::Transferring).unwrap(),
            "\"transferring\""
        );
        assert_eq!(
            serde_json::to_string(&TransferStatus::Cancelled).unwrap(),
            "\"cancelled\""
        );
    }

    #[test]
    fn terminal_statuses() {
        assert!(TransferStatus::Complete.is_terminal());
        assert!(TransferStatus::Cancelled.is_terminal());
        assert!(!TransferStatus::Preparing.is_terminal());
        assert!(!TransferStatus::Transferring.is_terminal());
    }

    #[test]
    fn file_descriptor_field_names() {
        let json = r#"{"name":"movie.mkv","sizeBytes":4096,"mimeType":"video/x-matroska"}"#;
        let file: FileDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(file.name, "movie.mkv");
        assert_eq!(file.size_bytes, 4096);
        assert_eq!(file.mime_type.as_deref(), Some("video/x-matroska"));
    }

    #[test]
    fn file_descriptor_omits_missing_mime() {
        let json = serde_json::to_string(&FileDescriptor::new("a.bin", 1)).unwrap();
        assert!(!json.contains("mimeType"));
    }

    #[test]
    fn same_file_matches_name_and_size() {
        let a = FileDescriptor::new("a.zip", 10);
        assert!(a.same_file(&FileDescriptor::new("a.zip", 10).with_mime_type("application/zip")));
        assert!(!a.same_file(&FileDescriptor::new("a.zip", 11)));
        assert!(!a.same_file(&FileDescriptor::new("b.zip", 10)));
    }

    #[test]
    fn snapshot_field_names() {
        let snapshot = TransferSnapshot {
            status: TransferStatus::Transferring,
            percent: 50.0,
            transferred_bytes: 5,
            total_bytes: 10,
            current_chunk: 1,
            total_chunks: 1,
            remaining_seconds: 1.0,
            elapsed_seconds: 1.0,
            throughput_bytes_per_sec: 5.0,
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"transferredBytes\":5"));
        assert!(json.contains("\"currentChunk\":1"));
        assert!(json.contains("\"throughputBytesPerSec\":5.0"));
        assert!(!snapshot.is_terminal());
    }
}
