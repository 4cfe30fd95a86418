// Last-run bookkeeping and the submit-eligibility check
use crate::report::GradedReport;
use std::collections::HashMap;

/// Identity of a question within a test
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuestionKey {
    pub question_id: String,
    pub test_id: Option<String>,
}

impl QuestionKey {
    pub fn new(question_id: impl Into<String>, test_id: Option<String>) -> Self {
        Self {
            question_id: question_id.into(),
            test_id,
        }
    }
}

/// Source text as compared by the submit gate: line breaks become single
/// spaces and one trailing semicolon is dropped.
pub fn normalize_source(code: &str) -> String {
    let joined = code.replace("\r\n", " ").replace(['\n', '\r'], " ");
    let trimmed = joined.trim();
    trimmed.strip_suffix(';').unwrap_or(trimmed).to_string()
}

#[derive(Debug, Clone)]
pub struct RunRecord {
    pub code: String,
    pub report: GradedReport,
}

/// Most recent graded run per question; replaced on every run
#[derive(Debug, Default)]
pub struct RunCache {
    runs: HashMap<QuestionKey, RunRecord>,
}

impl RunCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, key: QuestionKey, code: impl Into<String>, report: GradedReport) {
        self.runs.insert(
            key,
            RunRecord {
                code: code.into(),
                report,
            },
        );
    }

    pub fn get(&self, key: &QuestionKey) -> Option<&RunRecord> {
        self.runs.get(key)
    }

    pub fn clear(&mut self, key: &QuestionKey) -> Option<RunRecord> {
        self.runs.remove(key)
    }

    /// Submitting is allowed only for the exact code that was last run.
    ///
    /// A failed report still qualifies; what matters is that the report
    /// belongs to the code in the editor.
    pub fn can_submit(&self, key: &QuestionKey, current_code: &str) -> bool {
        self.runs
            .get(key)
            .is_some_and(|run| normalize_source(&run.code) == normalize_source(current_code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::FailureKind;

    fn key(q: &str) -> QuestionKey {
        QuestionKey::new(q, Some("t1".to_string()))
    }

    #[test]
    fn test_normalize_source() {
        assert_eq!(normalize_source("SELECT *\nFROM t;"), "SELECT * FROM t");
        assert_eq!(normalize_source("a\r\nb"), "a b");
        assert_eq!(normalize_source("x = 1\n"), "x = 1");
        assert_eq!(normalize_source("select 1;;"), "select 1;");
        assert_eq!(normalize_source(""), "");
    }

    #[test]
    fn test_cannot_submit_without_run() {
        let cache = RunCache::new();
        assert!(!cache.can_submit(&key("q1"), "print(1)"));
    }

    #[test]
    fn test_can_submit_matching_code() {
        let mut cache = RunCache::new();
        cache.record(key("q1"), "SELECT *\nFROM users;", GradedReport::graded(&[true], ""));

        assert!(cache.can_submit(&key("q1"), "SELECT * FROM users"));
        assert!(cache.can_submit(&key("q1"), "SELECT *\nFROM users;"));
        assert!(!cache.can_submit(&key("q1"), "SELECT * FROM admins"));
        assert!(!cache.can_submit(&key("q2"), "SELECT * FROM users"));
    }

    #[test]
    fn test_failed_run_still_allows_submit() {
        let mut cache = RunCache::new();
        let report = GradedReport::failed(2, FailureKind::Transport, None, "");
        cache.record(key("q1"), "def f(): return 1", report);

        assert!(cache.can_submit(&key("q1"), "def f(): return 1"));
    }

    #[test]
    fn test_new_run_replaces_previous() {
        let mut cache = RunCache::new();
        cache.record(key("q1"), "v1", GradedReport::graded(&[true], ""));
        cache.record(key("q1"), "v2", GradedReport::graded(&[false], ""));

        assert!(!cache.can_submit(&key("q1"), "v1"));
        assert!(cache.can_submit(&key("q1"), "v2"));
        assert!(!cache.get(&key("q1")).unwrap().report.aggregate_passed);

        cache.clear(&key("q1"));
        assert!(!cache.can_submit(&key("q1"), "v2"));
    }
}
