use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::{PortalError, Result};

/// Run a store call with a deadline. The call itself is dropped on timeout.
pub async fn with_timeout<T, F>(duration: Duration, operation: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(duration, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!("{} exceeded {:?}", operation, duration);
            crate::observability::metrics::store::timed_out(operation);
            Err(PortalError::Timeout(operation.to_string()))
        }
    }
}
