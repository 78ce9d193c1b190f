use serde::{Deserialize, Serialize};

use crate::shared::{
    BatchSenderConfig, BinlogEventRuleConfig, BlockAllowConfig, OnlineDdlConfig, ValidationError,
};

/// Filter configuration of one replication task.
///
/// The three filter layers are configured independently and treated as an immutable
/// snapshot once the task starts.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SyncerConfig {
    /// Name of the replication task, used in logs.
    pub name: String,
    /// Whether schema and table names are compared case-sensitively.
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default)]
    pub block_allow_list: BlockAllowConfig,
    /// Binlog event rules in declaration order.
    #[serde(default)]
    pub filter_rules: Vec<BinlogEventRuleConfig>,
    #[serde(default)]
    pub online_ddl: OnlineDdlConfig,
    #[serde(default)]
    pub batch: BatchSenderConfig,
}

impl SyncerConfig {
    /// Creates a configuration with the given task name and default filter layers.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            case_sensitive: false,
            block_allow_list: BlockAllowConfig::default(),
            filter_rules: Vec::new(),
            online_ddl: OnlineDdlConfig::default(),
            batch: BatchSenderConfig::default(),
        }
    }

    /// Validates every section of the configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyField("name".to_string()));
        }

        self.block_allow_list.validate()?;
        for rule in &self.filter_rules {
            rule.validate()?;
        }
        self.online_ddl.validate()?;
        self.batch.validate()?;

        Ok(())
    }
}
