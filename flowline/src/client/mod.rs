//! HTTP client layer: a bounded client pool and the transport seam.
//!
//! Stage workers never talk to the network directly; they go through the
//! [`Transport`] trait so tests can script remote responses. The production
//! transport borrows clients from a bounded [`ClientPool`], which is the only
//! resource shared between stage workers.

mod pool;
mod transport;

pub use pool::{ClientPool, PooledClient, DEFAULT_POOL_SIZE, DEFAULT_REQUEST_TIMEOUT};
pub use transport::{HttpTransport, Transport};
