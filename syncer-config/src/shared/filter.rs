use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Action attached to a binlog event rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterAction {
    /// Replicate the matching event.
    Do,
    /// Drop the matching event.
    Ignore,
}

/// A `(schema, table)` entry of the block/allow list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TableConfig {
    pub schema: String,
    pub name: String,
}

impl TableConfig {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }
}

/// Schema and table inclusion or exclusion lists.
///
/// Entries are exact names, globs containing `*` or `?`, or regular expressions prefixed
/// with `~`. Allow entries (`do_*`) and ignore entries (`ignore_*`) are mutually exclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BlockAllowConfig {
    #[serde(default)]
    pub do_dbs: Vec<String>,
    #[serde(default)]
    pub do_tables: Vec<TableConfig>,
    #[serde(default)]
    pub ignore_dbs: Vec<String>,
    #[serde(default)]
    pub ignore_tables: Vec<TableConfig>,
}

impl BlockAllowConfig {
    /// Returns `true` when the list restricts replication to its entries.
    pub fn is_allow_mode(&self) -> bool {
        !self.do_dbs.is_empty() || !self.do_tables.is_empty()
    }

    /// Validates the block/allow list.
    ///
    /// Allow and ignore entries cannot be mixed, and no entry may be empty.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let has_ignore = !self.ignore_dbs.is_empty() || !self.ignore_tables.is_empty();
        if self.is_allow_mode() && has_ignore {
            return Err(ValidationError::MixedBlockAllowModes);
        }

        for db in self.do_dbs.iter().chain(self.ignore_dbs.iter()) {
            if db.is_empty() {
                return Err(ValidationError::EmptyField("block_allow_list.*_dbs".to_string()));
            }
        }

        for table in self.do_tables.iter().chain(self.ignore_tables.iter()) {
            if table.schema.is_empty() || table.name.is_empty() {
                return Err(ValidationError::EmptyField(
                    "block_allow_list.*_tables".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// One binlog event filter rule as written by the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BinlogEventRuleConfig {
    pub schema_pattern: String,
    /// Empty means the rule applies to the whole schema.
    #[serde(default)]
    pub table_pattern: String,
    /// Event names such as `create table`, `insert` or the selectors `all`, `all ddl`, `all dml`.
    #[serde(default)]
    pub events: Vec<String>,
    /// Regular expressions matched case-insensitively against the statement text.
    #[serde(default)]
    pub sql_pattern: Vec<String>,
    pub action: FilterAction,
}

impl BinlogEventRuleConfig {
    /// Validates the rule.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.schema_pattern.is_empty() {
            return Err(ValidationError::EmptyField(
                "filter_rules.schema_pattern".to_string(),
            ));
        }

        if self.events.iter().any(|event| event.trim().is_empty()) {
            return Err(ValidationError::InvalidFieldValue {
                field: "filter_rules.events".to_string(),
                constraint: "event names cannot be blank".to_string(),
            });
        }

        Ok(())
    }
}
