// Run-and-grade: submit, poll, and fold every outcome into one report shape
use crate::cancel::CancellationSignal;
use crate::client::{JudgeClient, RunRequest};
use crate::clock::Clock;
use crate::error::ClientError;
use crate::transport::JudgeTransport;
use codelab_common::report::{FailureKind, GradedReport};
use std::time::Duration;
use tracing::{info, instrument, warn};

/// A graded report plus the error that forced a synthesized one, if any
#[derive(Debug)]
pub struct GradedRun {
    pub report: GradedReport,
    pub error: Option<ClientError>,
}

impl GradedRun {
    pub fn passed(&self) -> bool {
        self.report.aggregate_passed
    }
}

impl<T: JudgeTransport, C: Clock> JudgeClient<T, C> {
    /// Poll window for a request.
    ///
    /// Never shorter than the configured window, and always longer than the
    /// judge-side timeout by at least the configured margin.
    pub fn poll_window(&self, request: &RunRequest) -> Duration {
        let margin = self
            .config
            .poll_timeout_secs
            .saturating_sub(self.config.submit_timeout_secs)
            .max(1);
        let judge_timeout = request
            .timeout_seconds
            .unwrap_or(self.config.submit_timeout_secs);
        Duration::from_secs(
            self.config
                .poll_timeout_secs
                .max(judge_timeout.saturating_add(margin)),
        )
    }

    /// Submit, wait for the verdict and normalize it.
    ///
    /// Never fails: transport errors, timeouts, cancellation and judge-reported
    /// failures all become an all-Failed report with one label per test case
    /// plus the aggregate, and the cause is kept in `GradedRun::error`.
    #[instrument(skip(self, request, cancel), fields(question_id = ?request.question_id, test_cases = request.test_cases.len()))]
    pub async fn run_and_grade(
        &self,
        request: &RunRequest,
        cancel: &CancellationSignal,
    ) -> GradedRun {
        let case_count = request.test_cases.len();

        let outcome = match self.submit(request).await {
            Ok(submission_id) => {
                self.poll_until_complete(&submission_id, self.poll_window(request), cancel)
                    .await
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(result) if result.success => {
                let flags = result.per_case_results(case_count);
                let report = GradedReport::graded(&flags, result.output_text());
                info!(
                    passed = flags.iter().filter(|p| **p).count(),
                    total = case_count,
                    aggregate_passed = report.aggregate_passed,
                    "Run graded"
                );
                GradedRun {
                    report,
                    error: None,
                }
            }
            Ok(result) => {
                let detail = result.failure_message();
                warn!(error = ?detail, exit_code = ?result.exit_code, "Judge reported failure");
                let report = GradedReport::failed(
                    case_count,
                    FailureKind::JudgeReported,
                    detail.as_deref(),
                    result.output_text(),
                );
                GradedRun {
                    report,
                    error: Some(ClientError::JudgeReported(
                        detail.unwrap_or_else(|| "no error details".to_string()),
                    )),
                }
            }
            Err(e) => {
                warn!(error = %e, "Run failed before grading");
                let detail = e.to_string();
                GradedRun {
                    report: GradedReport::failed(
                        case_count,
                        e.failure_kind(),
                        Some(&detail),
                        String::new(),
                    ),
                    error: Some(e),
                }
            }
        }
    }
}
