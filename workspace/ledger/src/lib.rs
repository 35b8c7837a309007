//! Balance-moving flows of the rewards platform.
//!
//! Every flow runs inside a single database transaction. Profile balances are
//! written with a compare-and-set on `profiles.version`; when another writer
//! got there first the transaction is rolled back and retried. Uniqueness
//! constraints on the triggering events (one referral per referred profile,
//! one completion per user and task) make those retries safe.

pub mod error;
pub mod profile;
pub mod referral;
pub mod signup;
pub mod task;
pub mod withdrawal;

#[cfg(test)]
pub(crate) mod testing;

use std::future::Future;

use rust_decimal::Decimal;
use tracing::warn;

pub use error::{LedgerError, Result};

/// How many times a flow is attempted when it loses a balance race.
pub const MAX_ATTEMPTS: u32 = 3;

/// Amounts that drive the reward flows.
#[derive(Debug, Clone, PartialEq)]
pub struct RewardPolicy {
    /// Credited to the referrer for every referred signup.
    pub referral_bonus: Decimal,
    /// Smallest amount a user may withdraw.
    pub minimum_withdrawal: Decimal,
}

impl Default for RewardPolicy {
    fn default() -> Self {
        Self {
            referral_bonus: Decimal::new(20, 2),
            minimum_withdrawal: Decimal::new(200, 2),
        }
    }
}

/// Runs `attempt` until it returns something other than
/// [`LedgerError::Conflict`], at most [`MAX_ATTEMPTS`] times.
pub async fn retry_on_conflict<T, F, Fut>(operation: &str, mut attempt: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut tries = 1;
    loop {
        match attempt().await {
            Err(LedgerError::Conflict { entity, id }) if tries < MAX_ATTEMPTS => {
                warn!(operation, entity, id, tries, "Lost a concurrent update, retrying");
                tries += 1;
            }
            result => return result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_retry_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = retry_on_conflict("test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(LedgerError::Conflict {
                entity: "profile",
                id: 1,
            })
        })
        .await;

        assert!(matches!(result, Err(LedgerError::Conflict { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), MAX_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_retry_stops_on_success() {
        let calls = AtomicU32::new(0);
        let result = retry_on_conflict("test", || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                Err(LedgerError::Conflict {
                    entity: "profile",
                    id: 1,
                })
            } else {
                Ok(n)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_does_not_repeat_rejections() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = retry_on_conflict("test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(LedgerError::TaskNotFound(7))
        })
        .await;

        assert!(matches!(result, Err(LedgerError::TaskNotFound(7))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_default_policy() {
        let policy = RewardPolicy::default();
        assert_eq!(policy.referral_bonus, Decimal::new(2, 1));
        assert_eq!(policy.minimum_withdrawal, Decimal::new(2, 0));
    }
}
