use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Default rule for ghost tables created by gh-ost (`_t_gho`) and pt-osc (`_t_new`).
pub const DEFAULT_SHADOW_TABLE_RULE: &str = r"^_(.+)_(?:new|gho)$";

/// Default rule for leftovers of gh-ost (`_t_ghc`, `_t_del`) and pt-osc (`_t_old`).
pub const DEFAULT_TRASH_TABLE_RULE: &str = r"^_(.+)_(?:ghc|del|old)$";

/// Naming conventions of the online schema change tool running against the source.
///
/// Every rule is a regular expression whose first capture group yields the logical table name.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OnlineDdlConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_shadow_table_rules")]
    pub shadow_table_rules: Vec<String>,
    #[serde(default = "default_trash_table_rules")]
    pub trash_table_rules: Vec<String>,
}

impl OnlineDdlConfig {
    /// Validates the online schema change settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.enabled {
            return Ok(());
        }

        if self.shadow_table_rules.is_empty() {
            return Err(ValidationError::EmptyField(
                "online_ddl.shadow_table_rules".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for OnlineDdlConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            shadow_table_rules: default_shadow_table_rules(),
            trash_table_rules: default_trash_table_rules(),
        }
    }
}

fn default_shadow_table_rules() -> Vec<String> {
    vec![DEFAULT_SHADOW_TABLE_RULE.to_string()]
}

fn default_trash_table_rules() -> Vec<String> {
    vec![DEFAULT_TRASH_TABLE_RULE.to_string()]
}
