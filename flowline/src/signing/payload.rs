//! Wire payloads exchanged with the signing service.

use crate::crypto::Sealer;
use crate::errors::FlowlineError;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Status value meaning the service has not finished signing yet.
pub const PENDING_SENTINEL: &str = "pending";

/// Body of a submit request.
#[derive(Debug, Clone, Serialize)]
pub struct SignRequest {
    /// Unix timestamp at payload construction, as the service expects it.
    #[serde(rename = "timeStamp")]
    pub time_stamp: String,
    /// The sealed parameter hash.
    #[serde(rename = "encodeData")]
    pub encode_data: String,
    /// The sealed asset descriptor.
    #[serde(rename = "assetsData")]
    pub assets_data: String,
    /// The wrapped one-time key both ciphertexts are sealed under.
    pub key: String,
}

/// Body of a submit response.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponse {
    /// Service status code.
    #[serde(default)]
    pub code: String,
    /// Job id to poll for.
    #[serde(rename = "reqHash", default)]
    pub req_hash: String,
}

/// Body of a status response.
#[derive(Debug, Clone, Deserialize)]
pub struct PollResponse {
    /// Service status code.
    #[serde(default)]
    pub code: String,
    /// The signature, or [`PENDING_SENTINEL`] while the job is running.
    #[serde(default)]
    pub sig: String,
}

impl PollResponse {
    /// Whether the job has not reached a terminal state yet.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.sig == PENDING_SENTINEL
    }
}

/// Seals the parameter hash and asset descriptor into a submit body.
pub fn build_sign_request(
    sealer: &dyn Sealer,
    encode_hash: &str,
    asset_descriptor: &str,
) -> Result<SignRequest, FlowlineError> {
    let envelope = sealer.seal(&[encode_hash.as_bytes(), asset_descriptor.as_bytes()])?;

    let mut ciphertexts = envelope.ciphertexts.into_iter();
    let (encode_data, assets_data) = match (ciphertexts.next(), ciphertexts.next()) {
        (Some(encode_data), Some(assets_data)) => (encode_data, assets_data),
        _ => {
            return Err(FlowlineError::Internal(
                "sealer returned fewer ciphertexts than parts".to_string(),
            ))
        }
    };

    Ok(SignRequest {
        time_stamp: Utc::now().timestamp().to_string(),
        encode_data,
        assets_data,
        key: envelope.wrapped_key,
    })
}
