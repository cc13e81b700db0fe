//! Polling stage: watch a submitted job until it reaches a terminal status.

use super::payload::PollResponse;
use super::{SignFlow, SignItem};
use crate::errors::FlowlineError;
use crate::pipeline::{map_async_stage, StageFn};
use crate::retry::with_retry;
use tracing::{debug, warn};

impl SignFlow {
    /// Stage that polls every in-flight item's job on a fixed period.
    ///
    /// Each poll is one retrying status request. The sentinel `"pending"`
    /// keeps the loop going; any other value is terminal and the item emits
    /// as signed. A poll that errors records the first error and keeps
    /// polling - a later terminal response supersedes it. When the deadline
    /// expires the item becomes `Failed` with that first error, or `TimedOut`
    /// if every response was a clean `"pending"`.
    #[must_use]
    pub fn poll_stage(&self) -> StageFn<SignItem> {
        let flow = self.clone();
        map_async_stage(move |item| {
            let flow = flow.clone();
            async move { flow.poll_one(item).await }
        })
    }

    async fn poll_one(&self, item: SignItem) -> SignItem {
        if !item.is_in_flight() {
            return item;
        }

        let Some(tx_id) = item.tx_id().map(str::to_string) else {
            return item.fail(FlowlineError::Internal(
                "polling reached without a job id".to_string(),
            ));
        };
        let url = format!("{}{}", self.config.poll_url, tx_id);

        let mut attempts: u64 = 0;
        let mut first_error: Option<FlowlineError> = None;

        let poll_until_terminal = async {
            loop {
                tokio::time::sleep(self.config.poll_interval).await;
                attempts += 1;

                let status = with_retry("poll", || self.transport.get(&url, &[]))
                    .await
                    .and_then(|bytes| {
                        serde_json::from_slice::<PollResponse>(&bytes).map_err(FlowlineError::from)
                    });

                match status {
                    Ok(response) if response.is_pending() => {}
                    Ok(response) => return response.sig,
                    Err(error) => {
                        warn!(tx_id = %tx_id, attempts, error = %error, "status poll failed");
                        if first_error.is_none() {
                            first_error = Some(error);
                        }
                    }
                }
            }
        };

        let outcome = tokio::time::timeout(self.config.poll_deadline, poll_until_terminal).await;

        match outcome {
            Ok(signature) => {
                debug!(tx_id = %tx_id, attempts, "signature ready");
                item.signed(signature)
            }
            Err(_) => match first_error.take() {
                Some(error) => item.fail(error),
                None => {
                    warn!(tx_id = %tx_id, attempts, "polling deadline expired");
                    item.timed_out()
                }
            },
        }
    }
}
