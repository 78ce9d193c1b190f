//! Helpers shared by unit and integration tests.
//!
//! [`config`] builds filter configurations tersely, [`stream`] provides an in-memory
//! [`crate::concurrency::batch_sender::MessageStream`] that records every batch.

pub mod config;
#[cfg(feature = "failpoints")]
pub mod failpoints;
pub mod stream;
