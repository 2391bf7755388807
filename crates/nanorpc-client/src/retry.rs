use std::time::Duration;

use nanorpc_common::InvokeError;

/// Bounded-retry policy with a fixed delay between attempts.
///
/// `max_retries = Some(n)` allows `n + 1` exchanges in total; `None`
/// retries until the call's context is done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt, `None` for no limit.
    ///
    /// Default: `Some(0)` (a single attempt)
    pub max_retries: Option<u32>,
    /// Fixed pause between attempts.
    ///
    /// Default: zero
    pub retry_delay: Duration,
    /// Also retry when the server answered with a non-success status.
    ///
    /// Default: `false`
    pub retry_remote_errors: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: Some(0),
            retry_delay: Duration::ZERO,
            retry_remote_errors: false,
        }
    }
}

impl RetryPolicy {
    /// A single attempt, no retries.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn fixed(max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            max_retries: Some(max_retries),
            retry_delay,
            ..Self::default()
        }
    }

    /// Retry until the context is done.
    pub fn unbounded(retry_delay: Duration) -> Self {
        Self {
            max_retries: None,
            retry_delay,
            ..Self::default()
        }
    }

    /// Build from a signed retry count where any negative value means
    /// unbounded.
    ///
    /// ```
    /// use std::time::Duration;
    /// use nanorpc_client::RetryPolicy;
    ///
    /// let policy = RetryPolicy::from_retry_num(-1, Duration::from_millis(100));
    /// assert_eq!(policy.max_retries, None);
    ///
    /// let policy = RetryPolicy::from_retry_num(3, Duration::ZERO);
    /// assert_eq!(policy.max_retries, Some(3));
    /// ```
    pub fn from_retry_num(retry_num: i64, retry_delay: Duration) -> Self {
        let max_retries = if retry_num < 0 {
            None
        } else {
            Some(u32::try_from(retry_num).unwrap_or(u32::MAX))
        };
        Self {
            max_retries,
            retry_delay,
            ..Self::default()
        }
    }

    pub fn with_max_retries(mut self, max_retries: Option<u32>) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn with_retry_remote_errors(mut self, retry_remote_errors: bool) -> Self {
        self.retry_remote_errors = retry_remote_errors;
        self
    }

    /// Whether another attempt is allowed after `retries_done` retries.
    pub fn allows_retry(&self, retries_done: u32) -> bool {
        match self.max_retries {
            None => true,
            Some(max) => retries_done < max,
        }
    }

    /// Whether `err` is worth another attempt under this policy.
    pub fn should_retry(&self, err: &InvokeError) -> bool {
        err.is_retryable(self.retry_remote_errors)
    }
}
