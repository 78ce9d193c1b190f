//! Shared configuration types for binlog syncer tasks.

mod base;
mod batch;
mod filter;
mod online_ddl;
mod syncer;

pub use base::ValidationError;
pub use batch::BatchSenderConfig;
pub use filter::{BinlogEventRuleConfig, BlockAllowConfig, FilterAction, TableConfig};
pub use online_ddl::{DEFAULT_SHADOW_TABLE_RULE, DEFAULT_TRASH_TABLE_RULE, OnlineDdlConfig};
pub use syncer::SyncerConfig;
