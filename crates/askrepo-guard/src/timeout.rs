use std::future::Future;
use std::time::Duration;

/// Bound `fut` to `limit`, mapping expiry through `on_timeout`.
///
/// # Errors
///
/// Returns the future's own error, or `on_timeout(limit)` when the budget is
/// exceeded.
pub async fn with_timeout<T, E, F>(
    limit: Duration,
    on_timeout: impl FnOnce(Duration) -> E,
    fut: F,
) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(on_timeout(limit)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn completes_within_budget() {
        let result: Result<u32, String> =
            with_timeout(Duration::from_secs(1), |d| format!("timeout {d:?}"), async {
                Ok(5)
            })
            .await;
        assert_eq!(result.unwrap(), 5);
    }

    #[tokio::test]
    async fn exceeding_budget_maps_to_timeout_error() {
        let result: Result<u32, String> = with_timeout(
            Duration::from_millis(10),
            |d| format!("timeout {d:?}"),
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(5)
            },
        )
        .await;
        assert!(result.unwrap_err().starts_with("timeout"));
    }

    #[tokio::test]
    async fn inner_error_passes_through() {
        let result: Result<u32, String> = with_timeout(
            Duration::from_secs(1),
            |_| "timeout".to_owned(),
            async { Err("inner".to_owned()) },
        )
        .await;
        assert_eq!(result.unwrap_err(), "inner");
    }
}
