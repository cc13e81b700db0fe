//! Bounded immediate retry for fallible remote calls.
//!
//! Every remote call in the signing flow goes through [`with_retry`]: a fixed
//! budget of attempts, no delay between them, first success wins. The budget
//! is a crate constant and is not configurable per call.

use crate::errors::FlowlineError;
use std::future::Future;
use tracing::{debug, warn};

/// Total attempts for one remote call, the initial call included.
pub const RETRY_BUDGET: usize = 5;

/// Runs `operation` up to [`RETRY_BUDGET`] times, returning the first success
/// or the last error.
///
/// `op_name` only labels log lines; it does not change behavior.
pub async fn with_retry<T, F, Fut>(op_name: &str, mut operation: F) -> Result<T, FlowlineError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FlowlineError>>,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) if attempt < RETRY_BUDGET => {
                debug!(op = op_name, attempt, error = %error, "retrying after error");
                attempt += 1;
            }
            Err(error) => {
                warn!(op = op_name, attempts = attempt, error = %error, "retry budget exhausted");
                return Err(error);
            }
        }
    }
}
