//! Submit stage: trade the sealed payload for a job id.

use super::payload::{build_sign_request, SubmitResponse};
use super::{SignFlow, SignItem};
use crate::errors::FlowlineError;
use crate::pipeline::{map_async_stage, StageFn};
use crate::retry::with_retry;
use tracing::debug;

impl SignFlow {
    /// Stage that submits every in-flight item to the signing service.
    #[must_use]
    pub fn submit_stage(&self) -> StageFn<SignItem> {
        let flow = self.clone();
        map_async_stage(move |item| {
            let flow = flow.clone();
            async move { flow.submit_one(item).await }
        })
    }

    async fn submit_one(&self, item: SignItem) -> SignItem {
        if !item.is_in_flight() {
            return item;
        }

        let request = match build_sign_request(
            self.sealer.as_ref(),
            item.encode_hash(),
            &self.asset_descriptor(),
        ) {
            Ok(request) => request,
            Err(error) => return item.fail(error),
        };
        let body = match serde_json::to_value(&request) {
            Ok(body) => body,
            Err(error) => {
                return item.fail(FlowlineError::Encoding(format!("request serialize: {error}")))
            }
        };

        let bytes = match with_retry("submit", || {
            self.transport
                .post_json(&self.config.submit_url, &self.config.headers, &body)
        })
        .await
        {
            Ok(bytes) => bytes,
            Err(error) => return item.fail(error),
        };

        let response: SubmitResponse = match serde_json::from_slice(&bytes) {
            Ok(response) => response,
            Err(error) => return item.fail(error.into()),
        };

        debug!(encode_hash = item.encode_hash(), tx_id = %response.req_hash, "submit accepted");
        item.with_tx_id(response.req_hash)
    }

    /// Builds the asset descriptor the service expects alongside the hash.
    fn asset_descriptor(&self) -> String {
        serde_json::json!({
            "contract": self.config.contract_address,
            "type": self.config.asset_kind,
            "tokenId": self.config.token_id,
            "amount": 0,
        })
        .to_string()
    }
}
