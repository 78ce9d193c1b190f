use syncer_config::shared::{BlockAllowConfig, TableConfig};

use crate::error::{SyncerError, SyncerResult};
use crate::filter::pattern::NamePattern;
use crate::filter::system::is_system_schema;
use crate::types::{Collation, TableRef};

/// A `(schema, table)` entry of the block/allow list.
#[derive(Debug, Clone)]
struct TablePattern {
    schema: NamePattern,
    name: NamePattern,
}

impl TablePattern {
    fn new(config: &TableConfig, collation: Collation) -> SyncerResult<Self> {
        Ok(Self {
            schema: NamePattern::new(&config.schema, collation)?,
            name: NamePattern::new(&config.name, collation)?,
        })
    }

    fn matches(&self, table: &TableRef) -> bool {
        self.schema.matches(&table.schema) && self.name.matches(&table.name)
    }
}

/// The configured entries of one mode.
#[derive(Debug, Clone, Default)]
pub struct Entries {
    dbs: Vec<NamePattern>,
    tables: Vec<TablePattern>,
}

impl Entries {
    fn new(dbs: &[String], tables: &[TableConfig], collation: Collation) -> SyncerResult<Self> {
        let mut errors = Vec::new();
        let mut entries = Entries::default();

        for db in dbs {
            match NamePattern::new(db, collation) {
                Ok(pattern) => entries.dbs.push(pattern),
                Err(err) => errors.push(err),
            }
        }
        for table in tables {
            match TablePattern::new(table, collation) {
                Ok(pattern) => entries.tables.push(pattern),
                Err(err) => errors.push(err),
            }
        }

        if !errors.is_empty() {
            return Err(SyncerError::from(errors));
        }

        Ok(entries)
    }

    fn matches_db(&self, schema: &str) -> bool {
        self.dbs.iter().any(|db| db.matches(schema))
    }

    fn matches_table(&self, table: &TableRef) -> bool {
        self.tables.iter().any(|pattern| pattern.matches(table))
    }
}

/// Schema and table level block/allow list.
///
/// System schemas are blocked in both modes.
#[derive(Debug, Clone)]
pub enum BlockAllowList {
    /// Everything is replicated except the listed entries.
    Ignore(Entries),
    /// Only the listed entries are replicated.
    Allow(Entries),
}

impl BlockAllowList {
    /// Builds the list from its configuration, collecting every invalid entry.
    pub fn new(config: &BlockAllowConfig, collation: Collation) -> SyncerResult<Self> {
        config.validate()?;

        if config.is_allow_mode() {
            Ok(BlockAllowList::Allow(Entries::new(
                &config.do_dbs,
                &config.do_tables,
                collation,
            )?))
        } else {
            Ok(BlockAllowList::Ignore(Entries::new(
                &config.ignore_dbs,
                &config.ignore_tables,
                collation,
            )?))
        }
    }

    /// Returns `true` if events on `table` must not be replicated.
    ///
    /// A schema-level target is only blocked by schema entries in ignore mode, and is allowed
    /// in allow mode as soon as any schema or table entry names its schema.
    pub fn is_blocked(&self, table: &TableRef) -> bool {
        if is_system_schema(&table.schema) {
            return true;
        }

        match self {
            BlockAllowList::Ignore(entries) => {
                entries.matches_db(&table.schema)
                    || (!table.is_schema_level() && entries.matches_table(table))
            }
            BlockAllowList::Allow(entries) => {
                if entries.matches_db(&table.schema) {
                    return false;
                }

                if table.is_schema_level() {
                    return !entries
                        .tables
                        .iter()
                        .any(|pattern| pattern.schema.matches(&table.schema));
                }

                !entries.matches_table(table)
            }
        }
    }
}

impl Default for BlockAllowList {
    fn default() -> Self {
        BlockAllowList::Ignore(Entries::default())
    }
}
