use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Thresholds for the buffered message sender.
///
/// A batch is flushed as soon as either threshold is reached.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BatchSenderConfig {
    /// Maximum number of messages buffered before a flush.
    #[serde(default = "default_max_entry_count")]
    pub max_entry_count: usize,
    /// Maximum accumulated message size, in bytes, before a flush.
    #[serde(default = "default_max_size_bytes")]
    pub max_size_bytes: usize,
}

impl BatchSenderConfig {
    /// Default maximum number of buffered messages.
    pub const DEFAULT_MAX_ENTRY_COUNT: usize = 1024;

    /// Default maximum accumulated size in bytes.
    pub const DEFAULT_MAX_SIZE_BYTES: usize = 1024 * 1024;

    /// Validates batch sender settings.
    ///
    /// Both thresholds must be non-zero.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_entry_count == 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "batch.max_entry_count".to_string(),
                constraint: "must be greater than 0".to_string(),
            });
        }

        if self.max_size_bytes == 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "batch.max_size_bytes".to_string(),
                constraint: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for BatchSenderConfig {
    fn default() -> Self {
        Self {
            max_entry_count: default_max_entry_count(),
            max_size_bytes: default_max_size_bytes(),
        }
    }
}

fn default_max_entry_count() -> usize {
    BatchSenderConfig::DEFAULT_MAX_ENTRY_COUNT
}

fn default_max_size_bytes() -> usize {
    BatchSenderConfig::DEFAULT_MAX_SIZE_BYTES
}
