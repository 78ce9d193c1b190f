//! Event filter engine of a binlog replication task.
//!
//! For every DDL or row event read from the source, the engine decides whether the event is
//! replicated, and for DDL, which per-table fragments of the statement survive. See
//! [`filter::EventFilter`] for the entry points.

pub mod concurrency;
pub mod ddl;
pub mod error;
#[cfg(feature = "failpoints")]
pub mod failpoints;
pub mod filter;
mod macros;
pub mod metrics;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;

pub use syncer_config as config;
