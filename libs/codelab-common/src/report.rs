//! Graded Report - Normalized Pass/Fail Shape
//!
//! **Core Responsibility:**
//! Turn judge verdicts (or the absence of them) into the single shape callers
//! render: one label per test case in request order, then a `Result` label.
//!
//! **Critical Properties:**
//! - A report for `n` test cases always has exactly `n + 1` labels
//! - `Result: Passed` iff every case passed
//! - Failures of any kind produce all-Failed labels, never a partial list

use serde::{Deserialize, Serialize};
use std::fmt;

pub const AGGREGATE_LABEL: &str = "Result";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Passed,
    Failed,
}

impl Outcome {
    pub fn from_passed(passed: bool) -> Self {
        if passed {
            Outcome::Passed
        } else {
            Outcome::Failed
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Passed => write!(f, "Passed"),
            Outcome::Failed => write!(f, "Failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseLabel {
    pub name: String,
    pub outcome: Outcome,
}

impl CaseLabel {
    /// Label for the zero-based case `index`
    pub fn case(index: usize, outcome: Outcome) -> Self {
        Self {
            name: format!("TestCase{}", index + 1),
            outcome,
        }
    }

    pub fn aggregate(outcome: Outcome) -> Self {
        Self {
            name: AGGREGATE_LABEL.to_string(),
            outcome,
        }
    }
}

impl fmt::Display for CaseLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.outcome)
    }
}

/// Why a report was synthesized instead of graded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureKind {
    Transport,
    PollTimeout { elapsed_secs: u64 },
    JudgeReported,
    Cancelled,
    EmptySource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradedReport {
    pub per_case_labels: Vec<CaseLabel>,
    pub aggregate_passed: bool,
    pub raw_output: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
}

impl GradedReport {
    /// Report for a run the judge completed successfully
    pub fn graded(flags: &[bool], raw_output: impl Into<String>) -> Self {
        let aggregate_passed = flags.iter().all(|passed| *passed);

        let mut per_case_labels: Vec<CaseLabel> = flags
            .iter()
            .enumerate()
            .map(|(idx, passed)| CaseLabel::case(idx, Outcome::from_passed(*passed)))
            .collect();
        per_case_labels.push(CaseLabel::aggregate(Outcome::from_passed(aggregate_passed)));

        Self {
            per_case_labels,
            aggregate_passed,
            raw_output: raw_output.into(),
            message: "Execution completed".to_string(),
            failure: None,
        }
    }

    /// All-Failed report for `case_count` cases
    pub fn failed(
        case_count: usize,
        kind: FailureKind,
        detail: Option<&str>,
        raw_output: impl Into<String>,
    ) -> Self {
        let mut per_case_labels: Vec<CaseLabel> = (0..case_count)
            .map(|idx| CaseLabel::case(idx, Outcome::Failed))
            .collect();
        per_case_labels.push(CaseLabel::aggregate(Outcome::Failed));

        let message = match detail.map(str::trim).filter(|d| !d.is_empty()) {
            Some(detail) => format!("Execution failed: {}", detail),
            None => "Execution failed".to_string(),
        };

        Self {
            per_case_labels,
            aggregate_passed: false,
            raw_output: raw_output.into(),
            message,
            failure: Some(kind),
        }
    }

    pub fn len(&self) -> usize {
        self.per_case_labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.per_case_labels.is_empty()
    }

    /// Labels for the individual cases, without the aggregate
    pub fn case_labels(&self) -> &[CaseLabel] {
        let end = self.per_case_labels.len().saturating_sub(1);
        &self.per_case_labels[..end]
    }

    /// The trailing aggregate label
    pub fn aggregate_label(&self) -> Option<&CaseLabel> {
        self.per_case_labels.last()
    }

    pub fn label_strings(&self) -> Vec<String> {
        self.per_case_labels.iter().map(ToString::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graded_keeps_order_and_appends_aggregate() {
        let report = GradedReport::graded(&[true, false, true], "out");

        assert_eq!(
            report.label_strings(),
            vec![
                "TestCase1: Passed",
                "TestCase2: Failed",
                "TestCase3: Passed",
                "Result: Failed",
            ]
        );
        assert!(!report.aggregate_passed);
        assert_eq!(report.len(), 4);
        assert_eq!(report.failure, None);
    }

    #[test]
    fn test_graded_all_pass() {
        let report = GradedReport::graded(&[true, true], "");
        assert!(report.aggregate_passed);
        assert_eq!(report.aggregate_label().map(ToString::to_string).as_deref(), Some("Result: Passed"));
        assert_eq!(report.case_labels().len(), 2);
    }

    #[test]
    fn test_graded_without_cases() {
        let report = GradedReport::graded(&[], "");
        assert!(report.aggregate_passed);
        assert_eq!(report.label_strings(), vec!["Result: Passed"]);
    }

    #[test]
    fn test_failed_is_uniform() {
        for kind in [
            FailureKind::Transport,
            FailureKind::PollTimeout { elapsed_secs: 15 },
            FailureKind::JudgeReported,
            FailureKind::Cancelled,
            FailureKind::EmptySource,
        ] {
            let report = GradedReport::failed(3, kind.clone(), None, "");
            assert_eq!(report.len(), 4);
            assert!(report
                .per_case_labels
                .iter()
                .all(|label| label.outcome == Outcome::Failed));
            assert!(!report.aggregate_passed);
            assert_eq!(report.failure, Some(kind));
        }
    }

    #[test]
    fn test_failed_message_carries_detail() {
        let report = GradedReport::failed(
            1,
            FailureKind::JudgeReported,
            Some("ZeroDivisionError: division by zero"),
            "Traceback ...",
        );
        assert_eq!(
            report.message,
            "Execution failed: ZeroDivisionError: division by zero"
        );
        assert_eq!(report.raw_output, "Traceback ...");

        let bare = GradedReport::failed(1, FailureKind::Transport, Some("  "), "");
        assert_eq!(bare.message, "Execution failed");
    }
}
