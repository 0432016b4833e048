//! Outcome resolver boundary.
//!
//! The backend owns the weighted draw; the client sees it as a single async
//! operation that yields one winning sector label per session. The session
//! controller guarantees exactly one request per session.

use std::future::Future;

use crate::wheel::engine::SessionId;

/// Resolver failure taxonomy.
///
/// All variants are recovered locally by the fallback path; none of them
/// aborts the animation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ResolveError {
    #[error("network request failed: {0}")]
    Network(String),
    #[error("malformed backend response: {0}")]
    Malformed(String),
    /// Raised by the controller when the returned label is not on the wheel
    #[error("backend returned unknown sector label '{0}'")]
    UnknownLabel(String),
}

/// Asynchronous source of spin outcomes.
///
/// Implementations must be cheap to share behind an `Arc`; the controller
/// calls `request_outcome` from a spawned task.
pub trait OutcomeResolver: Send + Sync + 'static {
    fn request_outcome(
        &self,
        session_id: SessionId,
    ) -> impl Future<Output = Result<String, ResolveError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedResolver(&'static str);

    impl OutcomeResolver for FixedResolver {
        async fn request_outcome(
            &self,
            _session_id: SessionId,
        ) -> Result<String, ResolveError> {
            Ok(self.0.to_string())
        }
    }

    struct FailingResolver;

    impl OutcomeResolver for FailingResolver {
        async fn request_outcome(
            &self,
            _session_id: SessionId,
        ) -> Result<String, ResolveError> {
            Err(ResolveError::Network("connection refused".to_string()))
        }
    }

    #[test]
    fn test_fixed_resolver_yields_label() {
        let resolver = FixedResolver("Beer");
        let result = tokio_test::block_on(resolver.request_outcome(SessionId::new_v4()));
        assert_eq!(result.unwrap(), "Beer");
    }

    #[test]
    fn test_error_display() {
        let resolver = FailingResolver;
        let err = tokio_test::block_on(resolver.request_outcome(SessionId::new_v4())).unwrap_err();
        assert!(err.to_string().contains("network request failed"));

        let err = ResolveError::UnknownLabel("Rum".to_string());
        assert!(err.to_string().contains("Rum"));
    }
}
