//! Client for the external code-execution judge.
//!
//! Submits candidate code with its test cases, polls until the judge reaches
//! a verdict, and normalizes the outcome into a `GradedReport`.

mod cancel;
mod client;
mod clock;
mod error;
mod grader;
mod transport;

pub use cancel::CancellationSignal;
pub use client::{JudgeClient, RunRequest};
pub use clock::{Clock, SystemClock};
pub use error::{ClientError, ClientResult};
pub use grader::GradedRun;
pub use transport::{HttpTransport, JudgeTransport};
