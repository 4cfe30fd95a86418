use codelab_common::config::ConfigError;
use codelab_common::report::FailureKind;
use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection failure, non-2xx status or undecodable body
    #[error("transport error: {0}")]
    Transport(String),
    #[error("polling timed out after {elapsed_secs} seconds")]
    PollTimeout { elapsed_secs: u64 },
    #[error("judge reported failure: {0}")]
    JudgeReported(String),
    #[error("polling cancelled")]
    Cancelled,
    #[error("source code is empty")]
    EmptySource,
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ClientError {
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            ClientError::PollTimeout { elapsed_secs } => FailureKind::PollTimeout {
                elapsed_secs: *elapsed_secs,
            },
            ClientError::JudgeReported(_) => FailureKind::JudgeReported,
            ClientError::Cancelled => FailureKind::Cancelled,
            ClientError::EmptySource => FailureKind::EmptySource,
            ClientError::Transport(_) | ClientError::Config(_) => FailureKind::Transport,
        }
    }
}
