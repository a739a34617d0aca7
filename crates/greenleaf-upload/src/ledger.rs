//! Bounded, newest-first history of upload attempts

use std::collections::VecDeque;

use greenleaf_core::{UploadAttempt, UploadResult, UploadStats, UploadStatus};

/// Entries kept before the oldest are evicted
pub const DEFAULT_CAPACITY: usize = 50;

#[derive(Debug, Clone)]
pub struct UploadLedger {
    entries: VecDeque<UploadAttempt>,
    capacity: usize,
}

impl Default for UploadLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadLedger {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a finished upload
    pub fn add_upload(&mut self, file_name: &str, size_bytes: u64, result: &UploadResult) -> &UploadAttempt {
        self.push(UploadAttempt::from_result(file_name, size_bytes, result))
    }

    /// Record an upload that is still in flight; returns its id
    pub fn add_pending(&mut self, file_name: &str, size_bytes: u64) -> String {
        self.push(UploadAttempt::pending(file_name, size_bytes)).id.clone()
    }

    /// Settle a pending entry. Terminal entries are left alone.
    pub fn resolve(&mut self, id: &str, result: &UploadResult) -> bool {
        let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.id == id && e.status == UploadStatus::Pending)
        else {
            return false;
        };

        entry.status = if result.success {
            UploadStatus::Success
        } else {
            UploadStatus::Failed
        };
        entry.provider = result.provider.clone();
        entry.url = result.url.clone();
        entry.error = result.error.clone();
        entry.is_temporary = result.is_temporary;
        true
    }

    pub fn remove_upload(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    pub fn clear_uploads(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, id: &str) -> Option<&UploadAttempt> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Newest first
    pub fn entries(&self) -> impl Iterator<Item = &UploadAttempt> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> UploadStats {
        let (mut successful, mut failed, mut pending) = (0, 0, 0);
        for entry in &self.entries {
            match entry.status {
                UploadStatus::Success => successful += 1,
                UploadStatus::Failed => failed += 1,
                UploadStatus::Pending => pending += 1,
            }
        }
        UploadStats::from_counts(successful, failed, pending)
    }

    fn push(&mut self, attempt: UploadAttempt) -> &UploadAttempt {
        self.entries.push_front(attempt);
        self.entries.truncate(self.capacity);
        &self.entries[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(provider: &str) -> UploadResult {
        UploadResult::hosted(provider, format!("https://{}/img.png", provider))
    }

    #[test]
    fn test_empty_stats() {
        assert_eq!(
            UploadLedger::new().stats(),
            UploadStats {
                total: 0,
                successful: 0,
                failed: 0,
                pending: 0,
                success_rate: 0,
            }
        );
    }

    #[test]
    fn test_keeps_fifty_newest() {
        let mut ledger = UploadLedger::new();
        for i in 0..51 {
            ledger.add_upload(&format!("leaf-{}.png", i), 1024, &ok("imgur"));
        }

        assert_eq!(ledger.len(), 50);
        let names: Vec<_> = ledger.entries().map(|e| e.file_name.as_str()).collect();
        assert_eq!(names.first(), Some(&"leaf-50.png"));
        assert_eq!(names.last(), Some(&"leaf-1.png"));
        assert!(!names.contains(&"leaf-0.png"));
    }

    #[test]
    fn test_stats_and_removal() {
        let mut ledger = UploadLedger::new();
        let first = ledger.add_upload("a.png", 10, &ok("imgur")).id.clone();
        ledger.add_upload("b.png", 10, &UploadResult::failed(Some("imgbb".into()), "down"));
        ledger.add_upload("c.png", 10, &ok("imgbb"));

        let stats = ledger.stats();
        assert_eq!((stats.total, stats.successful, stats.failed), (3, 2, 1));
        assert_eq!(stats.success_rate, 67);

        assert!(ledger.remove_upload(&first));
        assert!(!ledger.remove_upload(&first));
        assert_eq!(ledger.stats().success_rate, 50);

        ledger.clear_uploads();
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_pending_resolves_once() {
        let mut ledger = UploadLedger::new();
        let id = ledger.add_pending("leaf.png", 2048);
        assert_eq!(ledger.stats().pending, 1);

        assert!(ledger.resolve(&id, &ok("imgur")));
        assert!(!ledger.resolve(&id, &UploadResult::failed(None, "late failure")));

        let entry = ledger.get(&id).unwrap();
        assert_eq!(entry.status, UploadStatus::Success);
        assert_eq!(entry.provider.as_deref(), Some("imgur"));
    }
}
