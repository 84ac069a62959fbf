//! Bookkeeping for one sync pass.
//!
//! A pass is best-effort per file: failures are recorded and the pass moves
//! on. The report is what the caller gets back once enumeration is exhausted.

/// A file that could not be transferred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    /// File name within the synced directory.
    pub name: String,
    /// Human-readable reason.
    pub reason: String,
}

/// Outcome of a sync pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Files transferred successfully, in the order they were attempted.
    pub transferred: Vec<String>,
    /// Files that failed, in the order they were attempted.
    pub failed: Vec<FileFailure>,
    /// Entries skipped because they are not regular files.
    pub skipped: usize,
}

impl SyncReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful transfer.
    pub fn record_success(&mut self, name: &str) {
        self.transferred.push(name.to_string());
    }

    /// Record a failed transfer.
    pub fn record_failure(&mut self, name: &str, reason: impl ToString) {
        self.failed.push(FileFailure {
            name: name.to_string(),
            reason: reason.to_string(),
        });
    }

    /// Record a skipped (non-regular) entry.
    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    /// Number of files attempted (succeeded + failed).
    pub fn attempted(&self) -> usize {
        self.transferred.len() + self.failed.len()
    }

    /// Number of failed files.
    pub fn failure_count(&self) -> usize {
        self.failed.len()
    }

    /// True when every attempted file was transferred.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_is_clean() {
        let report = SyncReport::new();
        assert!(report.is_clean());
        assert_eq!(report.attempted(), 0);
    }

    #[test]
    fn counts_successes_failures_and_skips() {
        let mut report = SyncReport::new();
        report.record_success("a.txt");
        report.record_failure("b.txt", "upload failed with status 500");
        report.record_success("c.txt");
        report.record_skipped();

        assert_eq!(report.attempted(), 3);
        assert_eq!(report.failure_count(), 1);
        assert_eq!(report.skipped, 1);
        assert!(!report.is_clean());
        assert_eq!(report.failed[0].name, "b.txt");
        assert_eq!(report.transferred, vec!["a.txt", "c.txt"]);
    }
}
