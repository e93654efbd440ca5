//! Deadline-bounded store calls.

use crate::errors::UserServiceError;
use crate::repositories::StoreError;
use std::future::Future;
use std::time::Duration;

/// Run `call` under `deadline`.
///
/// A store error becomes `StoreUnavailable`; expiry becomes `StoreTimeout`.
/// On expiry the in-flight future is dropped, which returns any connection
/// it had checked out. No retry is attempted.
pub async fn with_deadline<T, F>(
    operation: &'static str,
    deadline: Duration,
    call: F,
) -> Result<T, UserServiceError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(UserServiceError::StoreUnavailable {
            operation,
            cause: e.to_string(),
        }),
        Err(_elapsed) => Err(UserServiceError::StoreTimeout {
            operation,
            deadline,
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_value_passes_through() {
        let result = with_deadline("noop", Duration::from_secs(1), async {
            Ok::<_, StoreError>(7)
        })
        .await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_store_error_maps_to_unavailable() {
        let result: Result<(), _> = with_deadline("list_users", Duration::from_secs(1), async {
            Err(StoreError::Unavailable("down".to_string()))
        })
        .await;

        match result {
            Err(UserServiceError::StoreUnavailable { operation, cause }) => {
                assert_eq!(operation, "list_users");
                assert!(cause.contains("down"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_maps_to_timeout() {
        let result: Result<(), _> = with_deadline("get_user", Duration::from_millis(100), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        match result {
            Err(UserServiceError::StoreTimeout {
                operation,
                deadline,
            }) => {
                assert_eq!(operation, "get_user");
                assert_eq!(deadline, Duration::from_millis(100));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
