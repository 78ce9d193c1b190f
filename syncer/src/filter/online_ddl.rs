use std::borrow::Cow;

use regex::Regex;
use syncer_config::shared::OnlineDdlConfig;

use crate::error::{ErrorKind, SyncerError, SyncerResult};
use crate::syncer_error;

/// Role of a table name with respect to an online schema change tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    /// An ordinary user table.
    Real,
    /// The ghost table receiving the migrated schema.
    Shadow,
    /// A changelog or leftover table of a migration.
    Trash,
}

/// Recognizes transient tables created by online schema change tools.
#[derive(Debug, Clone, Default)]
pub struct OnlineDdlDetector {
    enabled: bool,
    shadow: Vec<Regex>,
    trash: Vec<Regex>,
}

impl OnlineDdlDetector {
    pub fn new(config: &OnlineDdlConfig) -> SyncerResult<Self> {
        config.validate()?;

        if !config.enabled {
            return Ok(Self::default());
        }

        Ok(Self {
            enabled: true,
            shadow: compile_rules(&config.shadow_table_rules)?,
            trash: compile_rules(&config.trash_table_rules)?,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn table_kind(&self, name: &str) -> TableKind {
        if self.shadow.iter().any(|rule| rule.is_match(name)) {
            TableKind::Shadow
        } else if self.trash.iter().any(|rule| rule.is_match(name)) {
            TableKind::Trash
        } else {
            TableKind::Real
        }
    }

    pub fn is_real_table(&self, name: &str) -> bool {
        self.table_kind(name) == TableKind::Real
    }

    /// Returns the logical table a shadow or trash table belongs to.
    ///
    /// Real table names are returned unchanged.
    pub fn real_table_name<'a>(&self, name: &'a str) -> Cow<'a, str> {
        self.shadow
            .iter()
            .chain(self.trash.iter())
            .find_map(|rule| rule.captures(name))
            .and_then(|captures| captures.get(1))
            .map(|logical| Cow::Owned(logical.as_str().to_string()))
            .unwrap_or(Cow::Borrowed(name))
    }
}

fn compile_rules(rules: &[String]) -> SyncerResult<Vec<Regex>> {
    let mut compiled = Vec::with_capacity(rules.len());
    let mut errors: Vec<SyncerError> = Vec::new();

    for rule in rules {
        match Regex::new(rule) {
            Ok(regex) if regex.captures_len() < 2 => errors.push(syncer_error!(
                ErrorKind::InvalidPattern,
                "Online DDL rule must capture the real table name",
                rule
            )),
            Ok(regex) => compiled.push(regex),
            Err(err) => errors.push(err.into()),
        }
    }

    if !errors.is_empty() {
        return Err(SyncerError::from(errors));
    }

    Ok(compiled)
}
