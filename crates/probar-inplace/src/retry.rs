//! Bounded retry for flaky editor interactions.
//!
//! Opening an inline editor is asynchronous and occasionally loses the race
//! against the check that follows the click. [`attempt`] re-runs the whole
//! interaction a fixed number of times, retrying only errors that report
//! themselves as retryable, and surfaces the last failure unchanged.

use crate::config::RetryPolicy;
use crate::result::FieldResult;
use std::time::Instant;

/// Outcome bookkeeping of a successful [`attempt`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempted<T> {
    /// Value returned by the successful attempt
    pub value: T,
    /// Number of attempts used, including the successful one
    pub attempts: u32,
}

/// Run `f` under `policy`, re-invoking it after retryable failures.
///
/// The policy's deadline, when set, is checked between attempts only; an
/// attempt that is already running is never interrupted.
pub fn attempt<T, F>(policy: &RetryPolicy, label: &str, mut f: F) -> FieldResult<Attempted<T>>
where
    F: FnMut(u32) -> FieldResult<T>,
{
    let start = Instant::now();
    let max_attempts = policy.max_attempts.max(1);
    let mut n = 1;
    loop {
        match f(n) {
            Ok(value) => {
                if n > 1 {
                    tracing::debug!(label, attempts = n, "succeeded after retry");
                }
                return Ok(Attempted { value, attempts: n });
            }
            Err(err) if err.is_retryable() && n < max_attempts => {
                if let Some(deadline) = policy.deadline() {
                    if start.elapsed() >= deadline {
                        tracing::warn!(
                            label,
                            attempts = n,
                            deadline_ms = deadline.as_millis() as u64,
                            "retry deadline elapsed"
                        );
                        return Err(err);
                    }
                }
                tracing::warn!(label, attempt = n, max_attempts, error = %err, "retrying");
                n += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::result::FieldError;
    use std::time::Duration;

    #[test]
    fn test_first_attempt_success() {
        let result = attempt(&RetryPolicy::default(), "noop", |_| Ok(7)).unwrap();
        assert_eq!(result, Attempted { value: 7, attempts: 1 });
    }

    #[test]
    fn test_recovers_within_budget() {
        let result = attempt(&RetryPolicy::new(3), "flaky", |n| {
            if n < 3 {
                Err(FieldError::activation("editor closed"))
            } else {
                Ok("open")
            }
        })
        .unwrap();
        assert_eq!(result.value, "open");
        assert_eq!(result.attempts, 3);
    }

    #[test]
    fn test_exhausted_budget_surfaces_last_error() {
        let mut calls = 0;
        let err = attempt(&RetryPolicy::new(3), "broken", |n| -> FieldResult<()> {
            calls += 1;
            Err(FieldError::activation(format!("attempt {n}")))
        })
        .unwrap_err();
        assert_eq!(calls, 3);
        assert_eq!(err.to_string(), "Activation failed: attempt 3");
    }

    #[test]
    fn test_not_found_is_not_retried() {
        let mut calls = 0;
        let err = attempt(&RetryPolicy::new(3), "missing", |_| -> FieldResult<()> {
            calls += 1;
            Err(FieldError::not_found(".inplace-edit.subject"))
        })
        .unwrap_err();
        assert_eq!(calls, 1);
        assert!(err.is_not_found());
    }

    #[test]
    fn test_zero_attempts_still_runs_once() {
        let mut calls = 0;
        let _ = attempt(&RetryPolicy::new(0), "zero", |_| -> FieldResult<()> {
            calls += 1;
            Err(FieldError::activation("x"))
        });
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_deadline_stops_retrying() {
        let policy = RetryPolicy::new(100).with_deadline(Duration::from_millis(5));
        let mut calls = 0;
        let err = attempt(&policy, "slow", |_| -> FieldResult<()> {
            calls += 1;
            std::thread::sleep(Duration::from_millis(10));
            Err(FieldError::activation("slow"))
        })
        .unwrap_err();
        assert_eq!(calls, 1);
        assert!(err.is_retryable());
    }
}
