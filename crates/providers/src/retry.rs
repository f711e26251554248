//! Provider retry — bounded re-attempts of the same provider.
//!
//! When a call fails (timeout, rate limit, transport or API error), the same
//! request is sent again immediately, up to a fixed number of attempts. There
//! is no backoff. Running out of attempts yields
//! `ProviderError::RetriesExhausted` carrying the last error.

use async_trait::async_trait;
use lorewiki_core::error::ProviderError;
use lorewiki_core::provider::*;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// A provider that retries its inner provider on failure.
pub struct RetryProvider {
    name: String,
    inner: Arc<dyn Provider>,
    max_attempts: u32,
    timeout: Option<Duration>,
}

impl RetryProvider {
    /// Wrap `inner`, allowing up to `max_attempts` calls per request.
    ///
    /// A bound of zero is treated as one attempt.
    pub fn new(inner: Arc<dyn Provider>, max_attempts: u32) -> Self {
        Self {
            name: format!("retry({})", inner.name()),
            inner,
            max_attempts: max_attempts.max(1),
            timeout: None,
        }
    }

    /// Abort an attempt that takes longer than `timeout` and count it as failed.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    async fn attempt(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        match self.timeout {
            None => self.inner.complete(request).await,
            Some(limit) => match tokio::time::timeout(limit, self.inner.complete(request)).await {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout(format!(
                    "Provider '{}' timed out after {}s",
                    self.inner.name(),
                    limit.as_secs()
                ))),
            },
        }
    }
}

#[async_trait]
impl Provider for RetryProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let mut last_error = ProviderError::NotConfigured("No attempt was made".into());

        for attempt in 1..=self.max_attempts {
            match self.attempt(request.clone()).await {
                Ok(response) => {
                    if attempt > 1 {
                        debug!(provider = %self.inner.name(), attempt, "Succeeded after retry");
                    }
                    return Ok(response);
                }
                Err(e) => {
                    warn!(
                        provider = %self.inner.name(),
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "Provider call failed, retrying"
                    );
                    last_error = e;
                }
            }
        }

        Err(ProviderError::RetriesExhausted {
            attempts: self.max_attempts,
            last_error: Box::new(last_error),
        })
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        self.inner.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lorewiki_core::message::Message;
    use std::sync::Mutex;

    /// Fails a fixed number of times, then succeeds.
    struct FlakyProvider {
        failures_left: Mutex<u32>,
        call_count: Mutex<u32>,
    }

    impl FlakyProvider {
        fn new(failures: u32) -> Self {
            Self {
                failures_left: Mutex::new(failures),
                call_count: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.call_count.lock().unwrap()
        }
    }

    #[async_trait]
    impl Provider for FlakyProvider {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> std::result::Result<ProviderResponse, ProviderError> {
            *self.call_count.lock().unwrap() += 1;
            let mut left = self.failures_left.lock().unwrap();
            if *left > 0 {
                *left -= 1;
                return Err(ProviderError::Network("connection reset".into()));
            }
            Ok(ProviderResponse {
                message: Message::assistant("success"),
                usage: None,
                model: "test-model".into(),
            })
        }
    }

    /// Never answers.
    struct HangingProvider;

    #[async_trait]
    impl Provider for HangingProvider {
        fn name(&self) -> &str {
            "hanging"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> std::result::Result<ProviderResponse, ProviderError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(ProviderError::Timeout("unreachable".into()))
        }
    }

    fn test_request() -> ProviderRequest {
        ProviderRequest {
            model: "test".into(),
            messages: vec![Message::user("hello")],
            temperature: 0.7,
            max_tokens: None,
            tools: vec![],
        }
    }

    #[tokio::test]
    async fn first_attempt_succeeds() {
        let inner = Arc::new(FlakyProvider::new(0));
        let retry = RetryProvider::new(inner.clone(), 10);

        let result = retry.complete(test_request()).await;
        assert_eq!(result.unwrap().message.content, "success");
        assert_eq!(inner.calls(), 1);
    }

    #[tokio::test]
    async fn recovers_after_failures() {
        let inner = Arc::new(FlakyProvider::new(3));
        let retry = RetryProvider::new(inner.clone(), 10);

        let result = retry.complete(test_request()).await;
        assert!(result.is_ok());
        assert_eq!(inner.calls(), 4);
    }

    #[tokio::test]
    async fn gives_up_after_bound() {
        let inner = Arc::new(FlakyProvider::new(100));
        let retry = RetryProvider::new(inner.clone(), 10);

        let err = retry.complete(test_request()).await.unwrap_err();
        match err {
            ProviderError::RetriesExhausted { attempts, last_error } => {
                assert_eq!(attempts, 10);
                assert!(matches!(*last_error, ProviderError::Network(_)));
            }
            other => panic!("Expected RetriesExhausted, got: {other:?}"),
        }
        assert_eq!(inner.calls(), 10);
    }

    #[tokio::test]
    async fn zero_bound_still_tries_once() {
        let inner = Arc::new(FlakyProvider::new(5));
        let retry = RetryProvider::new(inner.clone(), 0);
        let err = retry.complete(test_request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::RetriesExhausted { attempts: 1, .. }));
        assert_eq!(inner.calls(), 1);
    }

    #[tokio::test]
    async fn timeout_counts_as_failed_attempt() {
        let retry = RetryProvider::new(Arc::new(HangingProvider), 2)
            .with_timeout(Duration::from_millis(20));

        let err = retry.complete(test_request()).await.unwrap_err();
        match err {
            ProviderError::RetriesExhausted { attempts, last_error } => {
                assert_eq!(attempts, 2);
                assert!(matches!(*last_error, ProviderError::Timeout(_)));
            }
            other => panic!("Expected RetriesExhausted, got: {other:?}"),
        }
    }

    #[test]
    fn name_wraps_inner() {
        let retry = RetryProvider::new(Arc::new(HangingProvider), 3);
        assert_eq!(retry.name(), "retry(hanging)");
    }
}
