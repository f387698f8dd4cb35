//! The inference client seam.
//!
//! One call per decision cycle: prompt in, free-form text out. Transport
//! details (HTTP, streaming chunk reassembly, authentication) belong to the
//! implementor; the decision loop only distinguishes a reply from an error.

use std::future::Future;
use std::time::Duration;

/// Errors from a single inference call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InferenceError {
    /// The request could not be sent or the connection failed.
    #[error("inference transport failed: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("inference service returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, as far as it could be read.
        body: String,
    },

    /// The response arrived but its envelope could not be read.
    #[error("malformed inference response: {0}")]
    Malformed(String),

    /// No answer within the configured bound.
    #[error("inference call timed out after {ms} ms")]
    Timeout {
        /// The bound that expired, in milliseconds.
        ms: u128,
    },
}

/// A text-completion service.
///
/// Implementations must be shareable across decision cycle tasks.
pub trait InferenceClient: Send + Sync + 'static {
    /// Short backend name for logging.
    fn name(&self) -> &str;

    /// Send a prompt and return the model's raw reply text.
    fn complete(&self, prompt: &str) -> impl Future<Output = Result<String, InferenceError>> + Send;
}

/// Run one inference call, bounded by `timeout` when one is configured.
///
/// # Errors
///
/// Propagates the client's error, or [`InferenceError::Timeout`] when the
/// bound expires first.
pub async fn complete_within<I: InferenceClient>(
    client: &I,
    prompt: &str,
    timeout: Option<Duration>,
) -> Result<String, InferenceError> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, client.complete(prompt))
            .await
            .map_err(|_elapsed| InferenceError::Timeout {
                ms: limit.as_millis(),
            })?,
        None => client.complete(prompt).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl InferenceClient for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(&self, prompt: &str) -> Result<String, InferenceError> {
            Ok(prompt.to_owned())
        }
    }

    struct Stalled;

    impl InferenceClient for Stalled {
        fn name(&self) -> &str {
            "stalled"
        }

        async fn complete(&self, _prompt: &str) -> Result<String, InferenceError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(String::new())
        }
    }

    #[tokio::test]
    async fn unbounded_call_returns_reply() {
        let reply = complete_within(&Echo, "hello", None).await;
        assert_eq!(reply, Ok("hello".to_owned()));
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_call_times_out() {
        let reply = complete_within(&Stalled, "hello", Some(Duration::from_millis(250))).await;
        assert_eq!(reply, Err(InferenceError::Timeout { ms: 250 }));
    }

    #[test]
    fn errors_render_readably() {
        let err = InferenceError::Status {
            status: 503,
            body: "model loading".to_owned(),
        };
        assert_eq!(err.to_string(), "inference service returned 503: model loading");
    }
}
