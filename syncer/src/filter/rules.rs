use regex::{Regex, RegexBuilder};
use syncer_config::shared::BinlogEventRuleConfig;
pub use syncer_config::shared::FilterAction;

use crate::bail;
use crate::error::{ErrorKind, SyncerError, SyncerResult};
use crate::filter::pattern::NamePattern;
use crate::types::{Collation, EventKind, EventSelector, TableRef};

/// A compiled binlog event rule.
#[derive(Debug, Clone)]
pub struct BinlogEventRule {
    schema: NamePattern,
    table: Option<NamePattern>,
    events: Vec<EventSelector>,
    sql: Option<Regex>,
    action: FilterAction,
}

impl BinlogEventRule {
    pub fn new(config: &BinlogEventRuleConfig, collation: Collation) -> SyncerResult<Self> {
        config.validate()?;

        let schema = NamePattern::new(&config.schema_pattern, collation)?;
        let table = if config.table_pattern.is_empty() {
            None
        } else {
            Some(NamePattern::new(&config.table_pattern, collation)?)
        };

        let events = config
            .events
            .iter()
            .map(|event| event.parse::<EventSelector>())
            .collect::<SyncerResult<Vec<_>>>()?;

        Ok(Self {
            schema,
            table,
            events,
            sql: compile_sql_patterns(&config.sql_pattern)?,
            action: config.action,
        })
    }

    /// Returns `true` if the rule only applies to tables matching a table pattern.
    pub fn is_table_level(&self) -> bool {
        self.table.is_some()
    }

    pub fn action(&self) -> FilterAction {
        self.action
    }

    fn matches(&self, table: &TableRef, kind: EventKind, sql: &str) -> bool {
        if !self.schema.matches(&table.schema) {
            return false;
        }

        if let Some(pattern) = &self.table {
            if table.is_schema_level() || !pattern.matches(&table.name) {
                return false;
            }
        }

        if !self.events.is_empty() && !self.events.iter().any(|event| event.covers(kind)) {
            return false;
        }

        match &self.sql {
            Some(regex) => !sql.is_empty() && regex.is_match(sql),
            None => true,
        }
    }
}

/// Joins the non-empty SQL patterns into one case-insensitive alternation.
fn compile_sql_patterns(patterns: &[String]) -> SyncerResult<Option<Regex>> {
    let patterns: Vec<&str> = patterns
        .iter()
        .map(String::as_str)
        .filter(|pattern| !pattern.is_empty())
        .collect();

    if patterns.is_empty() {
        return Ok(None);
    }

    // Each pattern is validated on its own so an error names the offending entry.
    for pattern in &patterns {
        Regex::new(pattern)?;
    }

    let alternation = patterns
        .iter()
        .map(|pattern| format!("(?:{pattern})"))
        .collect::<Vec<_>>()
        .join("|");

    let regex = RegexBuilder::new(&alternation)
        .case_insensitive(true)
        .build()?;

    Ok(Some(regex))
}

/// Ordered collection of binlog event rules.
///
/// Among the rules matching an event, a table-level rule outranks any schema-level rule.
/// Within one granularity the last declared rule wins. When nothing matches the event is
/// replicated.
#[derive(Debug, Clone, Default)]
pub struct BinlogRuleSet {
    rules: Vec<BinlogEventRule>,
}

impl BinlogRuleSet {
    /// Compiles every rule, reporting all invalid rules at once.
    pub fn new(configs: &[BinlogEventRuleConfig], collation: Collation) -> SyncerResult<Self> {
        let mut rules = Vec::with_capacity(configs.len());
        let mut errors = Vec::new();

        for config in configs {
            match BinlogEventRule::new(config, collation) {
                Ok(rule) => rules.push(rule),
                Err(err) => errors.push(err),
            }
        }

        if !errors.is_empty() {
            return Err(SyncerError::from(errors));
        }

        Ok(Self { rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Resolves the action for an event on `table`.
    ///
    /// `sql` is the statement text, or empty for row events.
    pub fn resolve(
        &self,
        table: &TableRef,
        kind: EventKind,
        sql: &str,
    ) -> SyncerResult<FilterAction> {
        if table.schema.is_empty() {
            bail!(
                ErrorKind::InvalidState,
                "Cannot resolve filter rules without a schema",
                format!("event {kind} on table {table}")
            );
        }

        let mut table_level = None;
        let mut schema_level = None;

        for rule in &self.rules {
            if !rule.matches(table, kind, sql) {
                continue;
            }

            if rule.is_table_level() {
                table_level = Some(rule.action);
            } else {
                schema_level = Some(rule.action);
            }
        }

        Ok(table_level.or(schema_level).unwrap_or(FilterAction::Do))
    }
}
