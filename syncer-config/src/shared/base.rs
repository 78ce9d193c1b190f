use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A field holds a value outside of its allowed range.
    #[error("invalid value for `{field}`: {constraint}")]
    InvalidFieldValue { field: String, constraint: String },
    /// A required field was left empty.
    #[error("`{0}` cannot be empty")]
    EmptyField(String),
    /// Allow-list and ignore-list entries were both configured.
    #[error(
        "block/allow list mixes `do_*` and `ignore_*` entries; configure either an allow list or an ignore list"
    )]
    MixedBlockAllowModes,
}
