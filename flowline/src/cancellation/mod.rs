//! Cooperative cancellation for pipeline workers.
//!
//! Every pipeline runs its stage workers under a [`PipelineScope`]; cancelling
//! the scope unblocks workers suspended on a handoff or a poll timer, and
//! joining the scope guarantees no worker outlives the pipeline.

mod scope;
mod token;

pub use scope::PipelineScope;
pub use token::CancellationToken;
