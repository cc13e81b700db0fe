//! Concurrent stage pipelines over one-slot blocking handoffs.
//!
//! A pipeline is a source plus an ordered list of stages. Each stage runs as
//! one supervised worker that consumes its input sequence to exhaustion,
//! forwards its outputs through a capacity-one channel, and closes its output
//! by dropping the sender when the input closes. A send suspends until the
//! downstream worker is ready to accept, so a slow stage throttles everything
//! upstream without any explicit buffering.

mod compose;
mod stage;

pub use compose::{
    compose, compose_from, filter_stage, map_async_stage, map_stage, reduce_stage, StageFn,
};
pub use stage::{collect, filter, map, map_async, reduce, source};

use tokio::sync::mpsc;

/// Number of items a handoff holds while the downstream worker is busy.
pub const HANDOFF_CAPACITY: usize = 1;

/// The receiving end of a stage-to-stage handoff.
pub type Sequence<T> = mpsc::Receiver<T>;

/// Creates a one-slot handoff between two stage workers.
#[must_use]
pub fn handoff<T>() -> (mpsc::Sender<T>, Sequence<T>) {
    mpsc::channel(HANDOFF_CAPACITY)
}
