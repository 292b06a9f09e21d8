//! Single logical GET with transport-level retries.
//!
//! Only network faults and upstream throttling (429) are retried. Every other
//! status comes back as a successful transport outcome for the caller to
//! interpret.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::data_source::SourceError;
use crate::http_client::{HttpClient, HttpError, HttpRequest, HttpResponse};
use crate::retry::{RetryConfig, Sleeper, TokioSleeper};

/// Message used when every attempt was throttled and no transport fault was seen.
pub const MAX_RETRIES_EXCEEDED: &str = "Maximum retries exceeded";

#[derive(Clone)]
pub struct ResilientFetcher {
    client: Arc<dyn HttpClient>,
    sleeper: Arc<dyn Sleeper>,
    retry: RetryConfig,
    timeout_ms: u64,
}

impl ResilientFetcher {
    pub fn new(client: Arc<dyn HttpClient>, retry: RetryConfig) -> Self {
        Self {
            client,
            sleeper: Arc::new(TokioSleeper),
            retry,
            timeout_ms: 10_000,
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Issues the GET, making at most `max_retries` attempts.
    ///
    /// Waits `delay_for_attempt(n)` after a failed attempt `n` unless it was
    /// the last one. A 429 is retried like a network fault but never becomes
    /// the reported error.
    pub async fn fetch(
        &self,
        url: &str,
        headers: &BTreeMap<String, String>,
    ) -> Result<HttpResponse, SourceError> {
        let attempts = self.retry.attempts();
        let mut last_error: Option<HttpError> = None;

        for step in self.retry.schedule() {
            let request = HttpRequest::get(url)
                .with_headers(headers)
                .with_timeout_ms(self.timeout_ms);
            debug!(attempt = step.attempt, url = %url, "issuing upstream request");

            match self.client.execute(request).await {
                Ok(response) if self.retry.should_retry_status(response.status) => {
                    warn!(
                        attempt = step.attempt,
                        status = response.status,
                        "upstream throttled request"
                    );
                }
                Ok(response) => return Ok(response),
                Err(error) if !error.retryable() => {
                    return Err(SourceError::internal(format!(
                        "transport error: {}",
                        error.message()
                    )));
                }
                Err(error) => {
                    warn!(attempt = step.attempt, error = %error, "upstream request failed");
                    last_error = Some(error);
                }
            }

            if step.attempt + 1 < attempts {
                debug!(delay_ms = step.delay.as_millis() as u64, "backing off");
                self.sleeper.sleep(step.delay).await;
            }
        }

        Err(match last_error {
            Some(error) => SourceError::exhausted_retries(error.message()),
            None => SourceError::exhausted_retries(MAX_RETRIES_EXCEEDED),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::data_source::SourceErrorKind;
    use crate::retry::RecordingSleeper;

    #[derive(Debug, Default)]
    struct QueuedHttpClient {
        outcomes: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
        calls: Mutex<usize>,
    }

    impl QueuedHttpClient {
        fn new(outcomes: Vec<Result<HttpResponse, HttpError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().expect("call counter is not poisoned")
        }
    }

    impl HttpClient for QueuedHttpClient {
        fn execute<'a>(
            &'a self,
            _request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            *self.calls.lock().expect("call counter is not poisoned") += 1;
            let outcome = self
                .outcomes
                .lock()
                .expect("outcome queue is not poisoned")
                .pop_front()
                .unwrap_or_else(|| Err(HttpError::new("no scripted outcome")));
            Box::pin(async move { outcome })
        }
    }

    fn fetcher(client: Arc<QueuedHttpClient>, sleeper: Arc<RecordingSleeper>) -> ResilientFetcher {
        ResilientFetcher::new(client, RetryConfig::default()).with_sleeper(sleeper)
    }

    #[tokio::test]
    async fn returns_first_non_throttled_response() {
        let client = Arc::new(QueuedHttpClient::new(vec![
            Err(HttpError::new("connection reset")),
            Ok(HttpResponse::ok_json("{\"ok\":true}")),
        ]));
        let sleeper = Arc::new(RecordingSleeper::new());

        let response = fetcher(client.clone(), sleeper.clone())
            .fetch("https://example.test", &BTreeMap::new())
            .await
            .expect("second attempt succeeds");

        assert_eq!(response.body, "{\"ok\":true}");
        assert_eq!(client.calls(), 2);
        assert_eq!(sleeper.recorded(), vec![Duration::from_secs(1)]);
    }

    #[tokio::test]
    async fn non_429_error_statuses_are_returned_without_retry() {
        for status in [400_u16, 404, 500, 503] {
            let client = Arc::new(QueuedHttpClient::new(vec![Ok(HttpResponse::new(status, ""))]));
            let sleeper = Arc::new(RecordingSleeper::new());

            let response = fetcher(client.clone(), sleeper.clone())
                .fetch("https://example.test", &BTreeMap::new())
                .await
                .expect("status is a transport success");

            assert_eq!(response.status, status);
            assert_eq!(client.calls(), 1);
            assert!(sleeper.recorded().is_empty());
        }
    }

    #[tokio::test]
    async fn persistent_faults_exhaust_with_last_error() {
        let client = Arc::new(QueuedHttpClient::new(vec![
            Err(HttpError::new("timeout one")),
            Err(HttpError::new("timeout two")),
            Err(HttpError::new("timeout three")),
        ]));
        let sleeper = Arc::new(RecordingSleeper::new());

        let error = fetcher(client.clone(), sleeper.clone())
            .fetch("https://example.test", &BTreeMap::new())
            .await
            .expect_err("must exhaust");

        assert_eq!(error.kind(), SourceErrorKind::ExhaustedRetries);
        assert_eq!(error.message(), "timeout three");
        assert_eq!(client.calls(), 3);
        assert_eq!(
            sleeper.recorded(),
            vec![Duration::from_secs(1), Duration::from_secs(2)]
        );
    }

    #[tokio::test]
    async fn throttling_only_exhausts_with_generic_message() {
        let client = Arc::new(QueuedHttpClient::new(vec![
            Ok(HttpResponse::new(429, "Too Many Requests")),
            Ok(HttpResponse::new(429, "Too Many Requests")),
            Ok(HttpResponse::new(429, "Too Many Requests")),
        ]));
        let sleeper = Arc::new(RecordingSleeper::new());

        let error = fetcher(client.clone(), sleeper)
            .fetch("https://example.test", &BTreeMap::new())
            .await
            .expect_err("must exhaust");

        assert_eq!(error.kind(), SourceErrorKind::ExhaustedRetries);
        assert_eq!(error.message(), MAX_RETRIES_EXCEEDED);
        assert_eq!(client.calls(), 3);
    }

    #[tokio::test]
    async fn throttling_does_not_mask_earlier_fault() {
        let client = Arc::new(QueuedHttpClient::new(vec![
            Err(HttpError::new("dns failure")),
            Ok(HttpResponse::new(429, "")),
            Ok(HttpResponse::new(429, "")),
        ]));
        let sleeper = Arc::new(RecordingSleeper::new());

        let error = fetcher(client, sleeper)
            .fetch("https://example.test", &BTreeMap::new())
            .await
            .expect_err("must exhaust");

        assert_eq!(error.message(), "dns failure");
    }

    #[tokio::test]
    async fn non_retryable_transport_error_fails_immediately() {
        let client = Arc::new(QueuedHttpClient::new(vec![Err(HttpError::non_retryable(
            "invalid url",
        ))]));
        let sleeper = Arc::new(RecordingSleeper::new());

        let error = fetcher(client.clone(), sleeper.clone())
            .fetch("not a url", &BTreeMap::new())
            .await
            .expect_err("must fail");

        assert_eq!(error.kind(), SourceErrorKind::Internal);
        assert_eq!(client.calls(), 1);
        assert!(sleeper.recorded().is_empty());
    }
}
