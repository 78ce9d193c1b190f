//! DDL statement decomposition.

mod decomposer;
mod info;

pub(crate) use decomposer::retarget_alter_table;
pub use decomposer::{DdlDecomposer, split_statements};
pub(crate) use info::join_statements;
pub use info::{DdlInfo, DdlUnit};
