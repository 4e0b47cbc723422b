//! Tour booking service library.
//!
//! Layers follow a hexagonal split: [`domain`] holds schemas and services,
//! [`inbound`] adapts HTTP onto them, [`outbound`] provides storage and
//! hashing, and [`server`] wires everything into an Actix application.

pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod seed_data;
pub mod server;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Request tracing middleware.
pub use middleware::Trace;
