//! # Flowline
//!
//! Concurrent stage pipelines over one-slot blocking handoffs, and a
//! remote-signing workflow built on top of them.
//!
//! Flowline provides:
//!
//! - **Stage workers**: map, filter, and reduce stages, each running as an
//!   independent supervised worker connected by capacity-one channels
//! - **Composition**: variadic left-to-right wiring of a source and stages,
//!   from a seed or from an already-started sequence
//! - **Structured cancellation**: every worker lives in a [`cancellation::PipelineScope`]
//!   that can unblock and join all of them
//! - **The signing flow**: submit a sealed payload, then poll on a fixed
//!   period until the service reports a terminal signature
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use flowline::prelude::*;
//!
//! let scope = PipelineScope::new();
//! let flow = SignFlow::from_config(config)?;
//! let mut results = flow.run(&scope, vec!["0x01".into()]);
//!
//! while let Some(item) = results.recv().await {
//!     match item.outcome() {
//!         SignOutcome::Signed(sig) => println!("signed: {sig}"),
//!         other => eprintln!("not signed: {other:?}"),
//!     }
//! }
//! scope.join().await;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod client;
pub mod crypto;
pub mod errors;
pub mod observability;
pub mod pipeline;
pub mod retry;
pub mod signing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::{CancellationToken, PipelineScope};
    pub use crate::client::{ClientPool, HttpTransport, Transport};
    pub use crate::crypto::{RsaEnvelopeOpener, RsaEnvelopeSealer, SealedEnvelope, Sealer};
    pub use crate::errors::FlowlineError;
    pub use crate::pipeline::{
        collect, compose, compose_from, filter, map, map_async, reduce, source, Sequence, StageFn,
    };
    pub use crate::retry::{with_retry, RETRY_BUDGET};
    pub use crate::signing::{SignConfig, SignFlow, SignItem, SignOutcome};
}
