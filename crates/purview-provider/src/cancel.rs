//! Cooperative cancellation for in-flight evaluations.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::error::ProviderError;

/// Cancellation handle shared between the rule engine and an evaluation.
///
/// Cloning produces another handle to the same flag, so the caller keeps one
/// clone to cancel with while the evaluation polls its own. Evaluators check
/// the token at natural boundaries (before each file, before each request)
/// via [`CancelToken::checkpoint`] and bail out with a
/// [`ProviderError::Canceled`] rather than returning partial results.
///
/// # Example
///
/// ```
/// use purview_provider::CancelToken;
///
/// let token = CancelToken::new();
/// let handle = token.clone();
/// assert!(token.checkpoint("walk").is_ok());
///
/// handle.cancel();
/// assert!(token.checkpoint("walk").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    canceled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    /// Creates a token that only cancels when [`CancelToken::cancel`] is
    /// called.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a token that additionally cancels once `timeout` has elapsed.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            canceled: Arc::new(AtomicBool::new(false)),
            deadline: Some(Instant::now() + timeout),
        }
    }

    /// Requests cancellation. All clones of this token observe it.
    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once cancellation was requested or the deadline passed.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        if self.canceled.load(Ordering::SeqCst) {
            return true;
        }
        self.deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Fails with [`ProviderError::Canceled`] when the token is canceled.
    ///
    /// `operation` names the work being interrupted and is carried into the
    /// error for diagnostics.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Canceled`] when cancellation was requested or
    /// the deadline has passed.
    pub fn checkpoint(&self, operation: &str) -> Result<(), ProviderError> {
        if self.is_canceled() {
            return Err(ProviderError::canceled(operation));
        }
        Ok(())
    }
}
