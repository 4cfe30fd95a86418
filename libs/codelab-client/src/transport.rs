// Judge transport: the seam between the protocol and the network
use crate::error::{ClientError, ClientResult};
use codelab_common::config::ClientConfig;
use codelab_common::endpoints;
use codelab_common::types::{StatusResponse, SubmitPayload, SubmitResponse};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Longest slice of an error body kept in a transport error
const MAX_ERROR_BODY_CHARS: usize = 200;

/// One request/response exchange with the judge per call; no retries
pub trait JudgeTransport: Send + Sync {
    fn submit(
        &self,
        payload: &SubmitPayload,
    ) -> impl Future<Output = ClientResult<SubmitResponse>> + Send;

    fn status(
        &self,
        submission_id: &str,
    ) -> impl Future<Output = ClientResult<StatusResponse>> + Send;
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: reqwest::Url,
}

impl HttpTransport {
    pub fn new(base_url: &str, request_timeout: Duration) -> ClientResult<Self> {
        let base_url = reqwest::Url::parse(base_url)
            .map_err(|e| ClientError::Transport(format!("invalid judge URL {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Transport(format!(
                "judge URL cannot carry a path: {}",
                base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| ClientError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        Self::new(
            &config.judge_url,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Append raw segments to the base URL, escaping each one
    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> reqwest::Url {
        let mut url = self.base_url.clone();
        // base_url was checked in `new`, so it always has path segments
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response, what: &str) -> ClientResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let excerpt: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
        return Err(ClientError::Transport(format!(
            "{} returned {}: {}",
            what, status, excerpt
        )));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| ClientError::Transport(format!("invalid {} response: {}", what, e)))
}

impl JudgeTransport for HttpTransport {
    async fn submit(&self, payload: &SubmitPayload) -> ClientResult<SubmitResponse> {
        let url = self.endpoint(endpoints::submit_path());
        debug!(url = %url, cases = payload.test_cases.len(), "POST submit");

        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| ClientError::Transport(format!("submit request failed: {}", e)))?;

        decode(response, "submit").await
    }

    async fn status(&self, submission_id: &str) -> ClientResult<StatusResponse> {
        let url = self.endpoint(endpoints::status_path(submission_id));

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ClientError::Transport(format!("status request failed: {}", e)))?;

        decode(response, "status").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(base: &str) -> HttpTransport {
        HttpTransport::new(base, Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_submit_endpoint_joins_base_path() {
        for base in ["http://judge:8000", "http://judge:8000/"] {
            assert_eq!(
                transport(base).endpoint(endpoints::submit_path()).as_str(),
                "http://judge:8000/submit"
            );
        }
        assert_eq!(
            transport("https://lms.example/api/judge/")
                .endpoint(endpoints::submit_path())
                .as_str(),
            "https://lms.example/api/judge/submit"
        );
    }

    #[test]
    fn test_status_endpoint_escapes_reserved_characters() {
        let judge = transport("http://judge");
        assert_eq!(
            judge.endpoint(endpoints::status_path("7f3c")).as_str(),
            "http://judge/status/7f3c"
        );
        assert_eq!(
            judge.endpoint(endpoints::status_path("a/b?c#d e")).as_str(),
            "http://judge/status/a%2Fb%3Fc%23d%20e"
        );
        assert_eq!(
            judge.endpoint(endpoints::status_path("50%")).as_str(),
            "http://judge/status/50%25"
        );
    }

    #[test]
    fn test_rejects_unusable_judge_url() {
        assert!(matches!(
            HttpTransport::new("not a url", Duration::from_secs(1)),
            Err(ClientError::Transport(_))
        ));
        assert!(matches!(
            HttpTransport::new("mailto:judge@example.com", Duration::from_secs(1)),
            Err(ClientError::Transport(_))
        ));
    }
}
