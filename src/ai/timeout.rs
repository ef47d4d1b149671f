//! Time budget for gateway calls.

use crate::error::{AppError, AppResult};
use std::future::Future;
use std::time::Duration;
use tracing::error;

/// Race `call` against `budget`.
///
/// The call runs as its own task. When the budget runs out the caller stops
/// waiting and gets a timeout error; the task is left to finish and its
/// result is dropped.
pub async fn with_timeout<T, F>(operation: &str, budget: Duration, call: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>> + Send + 'static,
    T: Send + 'static,
{
    let task = tokio::spawn(call);

    match tokio::time::timeout(budget, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(AppError::internal(format!(
            "{operation} task failed: {join_err}"
        ))),
        Err(_) => {
            error!(operation = %operation, budget_ms = budget.as_millis() as u64, "AI call timed out");
            Err(AppError::timeout(operation, budget.as_millis() as u64))
        }
    }
}
