//! Pending files waiting to be started.

use cloudvault_protocol::FileDescriptor;

use crate::TransferError;
use crate::session::checked_size;

/// Result of offering a file to the intake queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Queued,
    /// The same name and size is already pending; nothing was added.
    Duplicate,
}

/// Ordered list of files selected for upload but not started yet.
///
/// Rejects files over the size limit and ignores duplicates (same name and
/// size).
#[derive(Debug, Clone)]
pub struct IntakeQueue {
    files: Vec<FileDescriptor>,
    max_file_size: u64,
}

impl IntakeQueue {
    /// Creates an empty queue with the given per-file size limit.
    pub fn new(max_file_size: u64) -> Self {
        Self {
            files: Vec::new(),
            max_file_size,
        }
    }

    /// Offers a file to the queue.
    pub fn enqueue(&mut self, file: FileDescriptor) -> Result<EnqueueOutcome, TransferError> {
        checked_size(&file.name, file.size_bytes, self.max_file_size)?;

        if self.files.iter().any(|f| f.same_file(&file)) {
            tracing::debug!(name = %file.name, size = file.size_bytes, "duplicate file ignored");
            return Ok(EnqueueOutcome::Duplicate);
        }

        self.files.push(file);
        Ok(EnqueueOutcome::Queued)
    }

    /// Removes the file at `index`, if any.
    pub fn remove(&mut self, index: usize) -> Option<FileDescriptor> {
        if index < self.files.len() {
            Some(self.files.remove(index))
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    /// Drains the queue in insertion order.
    pub fn take(&mut self) -> Vec<FileDescriptor> {
        std::mem::take(&mut self.files)
    }

    pub fn files(&self) -> &[FileDescriptor] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Sum of all pending file sizes.
    pub fn total_bytes(&self) -> u64 {
        self.files
            .iter()
            .map(|f| u64::try_from(f.size_bytes).unwrap_or(0))
            .sum()
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DEFAULT_MAX_FILE_SIZE, GIB};

    fn queue() -> IntakeQueue {
        IntakeQueue::new(DEFAULT_MAX_FILE_SIZE)
    }

    #[test]
    fn new_queue_is_empty() {
        let q = queue();
        assert!(q.is_empty());
        assert_eq!(q.total_bytes(), 0);
    }

    #[test]
    fn enqueue_keeps_order() {
        let mut q = queue();
        q.enqueue(FileDescriptor::new("b.mp4", 20)).unwrap();
        q.enqueue(FileDescriptor::new("a.mp4", 10)).unwrap();
        let names: Vec<_> = q.files().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["b.mp4", "a.mp4"]);
        assert_eq!(q.total_bytes(), 30);
    }

    #[test]
    fn duplicate_is_ignored() {
        let mut q = queue();
        let file = FileDescriptor::new("backup.tar", 4096);
        assert_eq!(q.enqueue(file.clone()).unwrap(), EnqueueOutcome::Queued);
        assert_eq!(q.enqueue(file).unwrap(), EnqueueOutcome::Duplicate);
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn same_name_different_size_is_not_duplicate() {
        let mut q = queue();
        q.enqueue(FileDescriptor::new("backup.tar", 4096)).unwrap();
        q.enqueue(FileDescriptor::new("backup.tar", 4097)).unwrap();
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn oversized_file_rejected() {
        let mut q = IntakeQueue::new(500 * GIB);
        let err = q
            .enqueue(FileDescriptor::new("disk.img", (600 * GIB) as i64))
            .unwrap_err();
        assert!(matches!(err, TransferError::InvalidInput(_)));
        assert!(q.is_empty());
    }

    #[test]
    fn file_at_limit_accepted() {
        let mut q = IntakeQueue::new(500 * GIB);
        q.enqueue(FileDescriptor::new("disk.img", (500 * GIB) as i64))
            .unwrap();
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn negative_size_rejected() {
        let mut q = queue();
        assert!(q.enqueue(FileDescriptor::new("weird", -5)).is_err());
    }

    #[test]
    fn remove_by_index() {
        let mut q = queue();
        q.enqueue(FileDescriptor::new("a", 1)).unwrap();
        q.enqueue(FileDescriptor::new("b", 2)).unwrap();
        assert_eq!(q.remove(0).unwrap().name, "a");
        assert!(q.remove(5).is_none());
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn take_drains() {
        let mut q = queue();
        q.enqueue(FileDescriptor::new("a", 1)).unwrap();
        q.enqueue(FileDescriptor::new("b", 2)).unwrap();
        let files = q.take();
        assert_eq!(files.len(), 2);
        assert!(q.is_empty());

        q.enqueue(FileDescriptor::new("c", 3)).unwrap();
        q.clear();
        assert!(q.is_empty());
    }
}
