//! Configuration surface for the signing flow.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Default period between status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Default ceiling on how long one item may stay in the polling stage.
pub const DEFAULT_POLL_DEADLINE: Duration = Duration::from_secs(300);

fn default_poll_interval() -> Duration {
    DEFAULT_POLL_INTERVAL
}

fn default_poll_deadline() -> Duration {
    DEFAULT_POLL_DEADLINE
}

/// Endpoints, identifiers, and timing for one signing flow.
///
/// All fields are fixed at construction time; there is no mid-run
/// reconfiguration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignConfig {
    /// Endpoint receiving the sealed payload.
    pub submit_url: String,
    /// Endpoint answering status requests; the job id is appended to it.
    pub poll_url: String,
    /// PEM file holding the service's RSA public key.
    pub public_key_path: PathBuf,
    /// Contract the signature is requested for.
    #[serde(default)]
    pub contract_address: String,
    /// Asset kind forwarded in the asset descriptor.
    #[serde(default)]
    pub asset_kind: String,
    /// Token id forwarded in the asset descriptor.
    #[serde(default)]
    pub token_id: u64,
    /// Extra headers attached to submit requests.
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Period between status polls.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: Duration,
    /// Ceiling on one item's total polling time.
    #[serde(default = "default_poll_deadline")]
    pub poll_deadline: Duration,
}

impl SignConfig {
    /// Creates a config with the required endpoints and key file.
    pub fn new(
        submit_url: impl Into<String>,
        poll_url: impl Into<String>,
        public_key_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            submit_url: submit_url.into(),
            poll_url: poll_url.into(),
            public_key_path: public_key_path.into(),
            contract_address: String::new(),
            asset_kind: String::new(),
            token_id: 0,
            headers: HashMap::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_deadline: DEFAULT_POLL_DEADLINE,
        }
    }

    /// Sets the contract address.
    #[must_use]
    pub fn with_contract_address(mut self, address: impl Into<String>) -> Self {
        self.contract_address = address.into();
        self
    }

    /// Sets the asset kind.
    #[must_use]
    pub fn with_asset_kind(mut self, kind: impl Into<String>) -> Self {
        self.asset_kind = kind.into();
        self
    }

    /// Sets the token id.
    #[must_use]
    pub fn with_token_id(mut self, token_id: u64) -> Self {
        self.token_id = token_id;
        self
    }

    /// Adds one submit header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets the poll period.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the polling deadline.
    #[must_use]
    pub fn with_poll_deadline(mut self, deadline: Duration) -> Self {
        self.poll_deadline = deadline;
        self
    }
}
