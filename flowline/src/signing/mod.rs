//! The applied signing workflow: submit a sealed payload, poll for the
//! signature.
//!
//! [`SignFlow`] wires the two remote stages onto the generic pipeline: a
//! source of seeded items, a submit stage that trades the sealed payload for
//! a job id, and a polling stage that watches that job until the service
//! reports a terminal status. Failures never abort the stream; they ride the
//! item to the terminal consumer.

mod config;
mod item;
mod payload;
mod poll;
mod submit;


pub use config::{SignConfig, DEFAULT_POLL_DEADLINE, DEFAULT_POLL_INTERVAL};
pub use item::{SignItem, SignOutcome};
pub use payload::{
    build_sign_request, PollResponse, SignRequest, SubmitResponse, PENDING_SENTINEL,
};

use crate::cancellation::PipelineScope;
use crate::client::{HttpTransport, Transport};
use crate::crypto::{RsaEnvelopeSealer, Sealer};
use crate::errors::FlowlineError;
use crate::pipeline::{compose, compose_from, source, Sequence, StageFn};
use std::sync::Arc;

/// Drives signing requests through the submit and poll stages.
#[derive(Clone)]
pub struct SignFlow {
    config: Arc<SignConfig>,
    transport: Arc<dyn Transport>,
    sealer: Arc<dyn Sealer>,
}

impl SignFlow {
    /// Creates a flow over explicit collaborators.
    #[must_use]
    pub fn new(config: SignConfig, transport: Arc<dyn Transport>, sealer: Arc<dyn Sealer>) -> Self {
        Self {
            config: Arc::new(config),
            transport,
            sealer,
        }
    }

    /// Creates a flow with production collaborators: a pooled HTTP transport
    /// and a sealer keyed on the configured public key file.
    pub fn from_config(config: SignConfig) -> Result<Self, FlowlineError> {
        let transport = Arc::new(HttpTransport::with_defaults()?);
        let sealer = Arc::new(RsaEnvelopeSealer::from_pem_file(&config.public_key_path)?);
        Ok(Self::new(config, transport, sealer))
    }

    /// The configuration this flow was built with.
    #[must_use]
    pub fn config(&self) -> &SignConfig {
        &self.config
    }

    /// Runs the full pipeline over the seeded parameter hashes.
    ///
    /// The returned sequence yields exactly one item per seed, in seed order;
    /// the caller inspects each item's [`SignOutcome`].
    pub fn run(&self, scope: &PipelineScope, encode_hashes: Vec<String>) -> Sequence<SignItem> {
        let seed = encode_hashes.into_iter().map(SignItem::new).collect();
        compose(scope, seed, source, self.stages())
    }

    /// Runs the signing stages on an already-started sequence of items.
    pub fn run_from(
        &self,
        scope: &PipelineScope,
        input: Sequence<SignItem>,
    ) -> Sequence<SignItem> {
        compose_from(scope, input, self.stages())
    }

    fn stages(&self) -> Vec<StageFn<SignItem>> {
        vec![self.submit_stage(), self.poll_stage()]
    }
}

impl std::fmt::Debug for SignFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignFlow")
            .field("config", &self.config)
            .finish()
    }
}
