//! Execution Submission Client - Submit and Poll
//!
//! **Protocol:**
//! 1. `submit` sends one POST with the candidate code and wire-shaped test cases
//! 2. `poll_until_complete` asks the status endpoint once per interval until the
//!    judge says `completed`, the wall-clock deadline passes, a transport error
//!    occurs, or the caller cancels
//!
//! Neither step retries. Grading and normalization live in `grader.rs`.

use crate::cancel::CancellationSignal;
use crate::clock::{Clock, SystemClock};
use crate::error::{ClientError, ClientResult};
use crate::transport::{HttpTransport, JudgeTransport};
use codelab_common::config::ClientConfig;
use codelab_common::types::{ExecutionResult, Language, SubmitPayload, TestCaseSpec};
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Everything one "Run" sends to the judge
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    pub code: String,
    pub test_cases: Vec<TestCaseSpec>,
    pub function_call: Option<String>,
    /// Judge-side execution timeout; config default when unset
    pub timeout_seconds: Option<u64>,
    pub language: Option<Language>,
    pub user_id: Option<String>,
    pub question_id: Option<String>,
    pub test_id: Option<String>,
}

impl RunRequest {
    pub fn new(code: impl Into<String>, test_cases: Vec<TestCaseSpec>) -> Self {
        Self {
            code: code.into(),
            test_cases,
            ..Self::default()
        }
    }

    pub fn function_call(mut self, call: impl Into<String>) -> Self {
        self.function_call = Some(call.into());
        self
    }

    pub fn timeout_seconds(mut self, secs: u64) -> Self {
        self.timeout_seconds = Some(secs);
        self
    }

    pub fn language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }

    pub fn user_id(mut self, id: impl Into<String>) -> Self {
        self.user_id = Some(id.into());
        self
    }

    pub fn question_id(mut self, id: impl Into<String>) -> Self {
        self.question_id = Some(id.into());
        self
    }

    pub fn test_id(mut self, id: impl Into<String>) -> Self {
        self.test_id = Some(id.into());
        self
    }
}

pub struct JudgeClient<T, C = SystemClock> {
    pub(crate) transport: T,
    pub(crate) clock: C,
    pub(crate) config: ClientConfig,
}

impl JudgeClient<HttpTransport, SystemClock> {
    /// HTTP client for a validated configuration
    pub fn from_config(config: ClientConfig) -> ClientResult<Self> {
        config.validate()?;
        let transport = HttpTransport::from_config(&config)?;
        Ok(Self::new(transport, SystemClock, config))
    }
}

impl<T: JudgeTransport, C: Clock> JudgeClient<T, C> {
    pub fn new(transport: T, clock: C, config: ClientConfig) -> Self {
        Self {
            transport,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build the submit body; test-case order is preserved
    pub fn build_payload(&self, request: &RunRequest) -> SubmitPayload {
        let payload = SubmitPayload {
            code: request.code.clone(),
            test_cases: request.test_cases.iter().map(TestCaseSpec::to_wire).collect(),
            function_call: request.function_call.clone(),
            language: request.language.unwrap_or(self.config.language),
            timeout: request
                .timeout_seconds
                .unwrap_or(self.config.submit_timeout_secs),
            memory_limit: self.config.memory_limit_mb,
            user_id: request.user_id.clone(),
            question_id: request.question_id.clone(),
            test_id: request.test_id.clone(),
            code_encoding: None,
        };

        if self.config.encode_source {
            payload.with_base64_source()
        } else {
            payload
        }
    }

    /// Submit one run and return the judge's submission id
    #[instrument(skip(self, request), fields(question_id = ?request.question_id, test_cases = request.test_cases.len()))]
    pub async fn submit(&self, request: &RunRequest) -> ClientResult<String> {
        if request.code.trim().is_empty() {
            return Err(ClientError::EmptySource);
        }

        let malformed = request
            .test_cases
            .iter()
            .filter(|tc| matches!(tc, TestCaseSpec::Malformed(_)))
            .count();
        if malformed > 0 {
            warn!(malformed, "Malformed test cases sent as validation checks");
        }

        let payload = self.build_payload(request);
        let response = self.transport.submit(&payload).await.map_err(|e| {
            error!(error = %e, "Submission failed");
            e
        })?;

        if response.submission_id.trim().is_empty() {
            return Err(ClientError::Transport(
                "judge returned an empty submission_id".to_string(),
            ));
        }

        info!(
            submission_id = %response.submission_id,
            status = ?response.status,
            estimated_wait = ?response.estimated_wait_time,
            "Submission accepted"
        );

        Ok(response.submission_id)
    }

    /// Poll the status endpoint until the judge completes the submission.
    ///
    /// The deadline is wall-clock time since the first tick. Sleeps are cut
    /// short so the loop gives up at the deadline rather than one interval
    /// after it. A `completed` response is returned even if cancellation was
    /// requested while that request was in flight.
    #[instrument(skip(self, cancel), fields(max_wait_ms = max_wait.as_millis() as u64))]
    pub async fn poll_until_complete(
        &self,
        submission_id: &str,
        max_wait: Duration,
        cancel: &CancellationSignal,
    ) -> ClientResult<ExecutionResult> {
        let interval = Duration::from_millis(self.config.poll_interval_ms.max(1));
        let started = self.clock.now();
        let mut ticks: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                info!(ticks, "Polling cancelled");
                return Err(ClientError::Cancelled);
            }

            let elapsed = self.clock.now().saturating_duration_since(started);
            if elapsed >= max_wait {
                warn!(ticks, elapsed_ms = elapsed.as_millis() as u64, "Polling deadline reached");
                return Err(ClientError::PollTimeout {
                    elapsed_secs: elapsed.as_secs(),
                });
            }

            ticks += 1;
            let response = self.transport.status(submission_id).await.map_err(|e| {
                error!(ticks, error = %e, "Status request failed");
                e
            })?;

            debug!(
                ticks,
                status = %response.status,
                queue_position = ?response.queue_position,
                "Status received"
            );

            if response.status.is_terminal() {
                let elapsed = self.clock.now().saturating_duration_since(started);
                return match response.result {
                    Some(mut result) => {
                        if !result.success && result.failure_message().is_none() {
                            result.error = response.error.filter(|e| !e.is_empty());
                        }
                        info!(
                            ticks,
                            success = result.success,
                            elapsed_ms = elapsed.as_millis() as u64,
                            "Submission completed"
                        );
                        Ok(result)
                    }
                    None => Err(ClientError::Transport(
                        "completed status without a result payload".to_string(),
                    )),
                };
            }

            let elapsed = self.clock.now().saturating_duration_since(started);
            let remaining = max_wait.saturating_sub(elapsed);
            if remaining.is_zero() {
                continue;
            }

            tokio::select! {
                _ = self.clock.sleep(interval.min(remaining)) => {}
                _ = cancel.cancelled() => {
                    info!(ticks, "Polling cancelled");
                    return Err(ClientError::Cancelled);
                }
            }
        }
    }
}
