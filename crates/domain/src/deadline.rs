//! Per-operation deadlines.

use std::future::Future;
use std::time::Duration;

use crate::error::CommerceError;

/// Upper bound on how long each operation may take, store calls and
/// waiting for the user's lock included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadlines {
    pub cart_mutation: Duration,
    pub cart_read: Duration,
    pub checkout: Duration,
    pub instant_buy: Duration,
    pub address: Duration,
    pub catalog: Duration,
}

impl Deadlines {
    /// The same deadline for every operation.
    pub fn uniform(deadline: Duration) -> Self {
        Self {
            cart_mutation: deadline,
            cart_read: deadline,
            checkout: deadline,
            instant_buy: deadline,
            address: deadline,
            catalog: deadline,
        }
    }
}

impl Default for Deadlines {
    fn default() -> Self {
        Self {
            cart_mutation: Duration::from_secs(5),
            cart_read: Duration::from_secs(100),
            checkout: Duration::from_secs(100),
            instant_buy: Duration::from_secs(5),
            address: Duration::from_secs(100),
            catalog: Duration::from_secs(100),
        }
    }
}

/// Runs `fut`, abandoning it with [`CommerceError::Timeout`] once `after`
/// has elapsed. Store writes that completed before the deadline stay applied.
pub(crate) async fn with_deadline<T, F>(
    operation: &'static str,
    after: Duration,
    fut: F,
) -> Result<T, CommerceError>
where
    F: Future<Output = Result<T, CommerceError>>,
{
    match tokio::time::timeout(after, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(operation, ?after, "operation deadline elapsed");
            metrics::counter!("operation_timeouts_total", "operation" => operation).increment(1);
            Err(CommerceError::Timeout { operation, after })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_deadlines() {
        let deadlines = Deadlines::default();
        assert_eq!(deadlines.cart_mutation, Duration::from_secs(5));
        assert_eq!(deadlines.instant_buy, Duration::from_secs(5));
        assert_eq!(deadlines.checkout, Duration::from_secs(100));
    }

    #[tokio::test]
    async fn completes_within_deadline() {
        let result = with_deadline("fast", Duration::from_secs(1), async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn times_out() {
        let result: Result<(), _> = with_deadline("slow", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        assert!(matches!(
            result,
            Err(CommerceError::Timeout {
                operation: "slow",
                ..
            })
        ));
    }
}
