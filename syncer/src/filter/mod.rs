//! The layered replication event filter.
//!
//! Events are checked against the server's system schemas, the block/allow list, the online
//! schema change detector and the binlog event rules. [`EventFilter`] combines the layers into
//! one decision per row event or decomposed DDL event. [`OnlineDdlTracker`] moves schema changes
//! made on ghost tables over to the real table at cut-over.

pub mod block_allow;
pub mod builtin;
mod cutover;
mod event_filter;
mod handle;
pub mod online_ddl;
pub mod pattern;
pub mod rules;
pub mod system;

pub use cutover::OnlineDdlTracker;
pub use event_filter::{EventFilter, QueryDecision, SkipDecision, SkipReason};
pub use handle::{FilterRx, FilterTx, create_filter_channel};
