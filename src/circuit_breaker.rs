use crate::errors::AppError;
use failsafe::{backoff, failure_policy, CircuitBreaker, Config};
use std::future::Future;
use std::time::Duration;

/// Breaker type guarding profile storage.
pub type StorageBreaker = failsafe::StateMachine<
    failure_policy::ConsecutiveFailures<backoff::Exponential>,
    (),
>;

/// Creates a circuit breaker for profile storage operations.
///
/// # Configuration
///
/// - **Failure threshold**: 5 consecutive failures triggers OPEN state.
/// - **Backoff**: Exponential backoff from 10s to 60s before attempting recovery.
///
/// While OPEN, calls fail fast with [`AppError::ServiceUnavailable`] instead of
/// waiting on the pool.
pub fn create_db_circuit_breaker() -> StorageBreaker {
    let backoff_strategy = backoff::exponential(
        Duration::from_secs(10), // Initial delay
        Duration::from_secs(60), // Maximum delay
    );

    let failure_policy = failure_policy::consecutive_failures(5, backoff_strategy);

    Config::new().failure_policy(failure_policy).build()
}

/// Runs a database future under `breaker`, recording its outcome.
pub async fn guarded<T, F>(breaker: &StorageBreaker, operation: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    if !breaker.is_call_permitted() {
        tracing::warn!("Storage circuit open, rejecting call");
        return Err(AppError::ServiceUnavailable(
            "Armazenamento de perfis temporariamente indisponível".to_string(),
        ));
    }

    let outcome = operation.await;
    match breaker.call(move || outcome) {
        Ok(value) => Ok(value),
        Err(failsafe::Error::Inner(e)) => Err(AppError::DatabaseError(e)),
        Err(failsafe::Error::Rejected) => Err(AppError::ServiceUnavailable(
            "Armazenamento de perfis temporariamente indisponível".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use failsafe::Error;

    #[test]
    fn test_circuit_breaker_opens_after_failures() {
        let cb = create_db_circuit_breaker();

        for _ in 0..5 {
            let result: Result<(), Error<&str>> = cb.call(|| Err::<(), &str>("simulated error"));
            assert!(result.is_err());
        }

        let result: Result<(), Error<&str>> = cb.call(|| Ok::<(), &str>(()));
        match result {
            Err(Error::Rejected) => {}
            _ => panic!("Expected circuit to be open and reject requests"),
        }
    }

    #[tokio::test]
    async fn test_guarded_maps_failures_then_fails_fast() {
        let cb = create_db_circuit_breaker();

        for _ in 0..5 {
            let err = guarded(&cb, async { Err::<(), _>(sqlx::Error::RowNotFound) })
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::DatabaseError(_)));
        }

        let err = guarded(&cb, async { Ok::<i32, sqlx::Error>(1) })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_guarded_passes_success_through() {
        let cb = create_db_circuit_breaker();
        let value = guarded(&cb, async { Ok::<i32, sqlx::Error>(42) }).await.unwrap();
        assert_eq!(value, 42);
    }
}
