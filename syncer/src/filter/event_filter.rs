use std::fmt;

use metrics::counter;
use syncer_config::shared::SyncerConfig;
use tracing::{debug, info};

use crate::ddl::{DdlDecomposer, DdlInfo, DdlUnit, join_statements};
use crate::error::{ErrorKind, SyncerError, SyncerResult};
use crate::filter::block_allow::BlockAllowList;
use crate::filter::online_ddl::OnlineDdlDetector;
use crate::filter::rules::{BinlogRuleSet, FilterAction};
use crate::filter::system::is_system_schema;
use crate::metrics::{
    EVENT_KIND_LABEL, SKIP_REASON_LABEL, SYNCER_FILTER_KEPT_EVENTS_TOTAL,
    SYNCER_FILTER_SKIPPED_EVENTS_TOTAL,
};
use crate::syncer_error;
use crate::types::{Collation, EventKind, TableRef};

/// Event kind label used for statements that were dropped before being parsed.
const BUILTIN_EVENT_LABEL: &str = "builtin";

/// Why an event was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The table lives in a server-owned schema.
    SystemSchema,
    /// The block/allow list excludes the table.
    BlockAllowList,
    /// A binlog event rule resolved to [`FilterAction::Ignore`].
    BinlogRule,
    /// The table is a transient table of an online schema change tool.
    OnlineDdlArtifact,
    /// The statement is on the built-in skip list.
    BuiltinStatement,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::SystemSchema => "system_schema",
            SkipReason::BlockAllowList => "block_allow_list",
            SkipReason::BinlogRule => "binlog_rule",
            SkipReason::OnlineDdlArtifact => "online_ddl_artifact",
            SkipReason::BuiltinStatement => "builtin_statement",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict for a row event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkipDecision {
    pub skip: bool,
    /// Set iff `skip` is `true`.
    pub reason: Option<SkipReason>,
}

impl SkipDecision {
    pub fn keep() -> Self {
        Self {
            skip: false,
            reason: None,
        }
    }

    pub fn skip(reason: SkipReason) -> Self {
        Self {
            skip: true,
            reason: Some(reason),
        }
    }
}

/// Verdict for a DDL event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDecision {
    pub skip: bool,
    /// Reason the first excluded unit was dropped, if any unit was.
    pub reason: Option<SkipReason>,
    /// The statement to execute downstream, joined from the surviving units.
    ///
    /// Empty iff `skip` is `true`.
    pub statement: String,
}

/// Per-event filter combining the system schema classifier, the block/allow list, the binlog
/// rule set and the online schema change detector.
///
/// The filter is immutable once built and can be shared freely between evaluations.
#[derive(Debug)]
pub struct EventFilter {
    name: String,
    collation: Collation,
    block_allow: BlockAllowList,
    rules: BinlogRuleSet,
    online_ddl: OnlineDdlDetector,
}

impl EventFilter {
    /// Builds every filter layer from `config`.
    ///
    /// Errors from all layers are reported together.
    pub fn new(config: &SyncerConfig) -> SyncerResult<Self> {
        config.validate()?;

        let collation = Collation::from_case_sensitive(config.case_sensitive);

        let block_allow = BlockAllowList::new(&config.block_allow_list, collation);
        let rules = BinlogRuleSet::new(&config.filter_rules, collation);
        let online_ddl = OnlineDdlDetector::new(&config.online_ddl);

        let (block_allow, rules, online_ddl) = match (block_allow, rules, online_ddl) {
            (Ok(block_allow), Ok(rules), Ok(online_ddl)) => (block_allow, rules, online_ddl),
            (block_allow, rules, online_ddl) => {
                let errors: Vec<SyncerError> = [block_allow.err(), rules.err(), online_ddl.err()]
                    .into_iter()
                    .flatten()
                    .collect();

                return Err(SyncerError::from(errors));
            }
        };

        info!(
            task = %config.name,
            case_sensitive = config.case_sensitive,
            rules = rules.len(),
            online_ddl = online_ddl.is_enabled(),
            "event filter built"
        );

        Ok(Self {
            name: config.name.clone(),
            collation,
            block_allow,
            rules,
            online_ddl,
        })
    }

    /// Loads the task configuration from `./configuration` and builds the filter from it.
    pub fn load() -> SyncerResult<Self> {
        let config = SyncerConfig::load()?;
        Self::new(&config)
    }

    /// Name of the task the filter was built for.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn collation(&self) -> Collation {
        self.collation
    }

    /// Returns `true` if the table is a system table or excluded by the block/allow list.
    pub fn skip_by_table(&self, table: &TableRef) -> bool {
        self.block_reason(table).is_some()
    }

    /// Returns `true` if the binlog rules drop `kind` on `table` for the statement `sql`.
    ///
    /// System tables are always dropped.
    pub fn skip_by_filter(
        &self,
        table: &TableRef,
        kind: EventKind,
        sql: &str,
    ) -> SyncerResult<bool> {
        if is_system_schema(&table.schema) {
            return Ok(true);
        }

        Ok(self.rules.resolve(table, kind, sql)? == FilterAction::Ignore)
    }

    /// Splits a DDL statement into units, dropping create statements ignored by the rules.
    pub fn decompose(&self, schema: &str, sql: &str) -> SyncerResult<DdlInfo> {
        DdlDecomposer::new(&self.rules).decompose(schema, sql)
    }

    pub(crate) fn online_ddl(&self) -> &OnlineDdlDetector {
        &self.online_ddl
    }

    /// Decides whether a decomposed DDL event must be skipped.
    ///
    /// A unit is excluded when any table it touches is a transient online schema change table
    /// or is blocked, so a rename is never applied halfway, or when the rules ignore it on its
    /// primary table. The event is skipped iff no unit survives. `info` is left untouched.
    ///
    /// Schema changes made on a ghost table only reach the real table through
    /// [`OnlineDdlTracker`](crate::filter::OnlineDdlTracker).
    pub fn skip_query_event(&self, info: &DdlInfo) -> SyncerResult<QueryDecision> {
        if info.builtin_skipped {
            debug!(
                schema = %info.schema,
                reason = %SkipReason::BuiltinStatement,
                "query event skipped"
            );
            record_skip(BUILTIN_EVENT_LABEL, SkipReason::BuiltinStatement);

            return Ok(QueryDecision {
                skip: true,
                reason: Some(SkipReason::BuiltinStatement),
                statement: String::new(),
            });
        }

        let mut kept = Vec::with_capacity(info.units.len());
        let mut first_reason = None;

        for unit in &info.units {
            match self.unit_skip_reason(info, unit)? {
                Some(reason) => {
                    debug!(
                        schema = %info.schema,
                        tables = ?unit.tables,
                        event = %unit.kind,
                        reason = %reason,
                        "ddl unit excluded"
                    );
                    record_skip(unit.kind.as_str(), reason);
                    first_reason.get_or_insert(reason);
                }
                None => {
                    record_keep(unit.kind.as_str());
                    kept.push(unit.statement.as_str());
                }
            }
        }

        let skip = kept.is_empty();
        let statement = join_statements(kept.into_iter());

        Ok(QueryDecision {
            skip,
            reason: first_reason,
            statement,
        })
    }

    /// Decides whether a row event on `table` must be skipped.
    ///
    /// Transient online schema change tables are dropped before any configured filter is
    /// consulted. Rules carrying SQL patterns never match row events.
    pub fn skip_rows_event(
        &self,
        table: &TableRef,
        kind: EventKind,
    ) -> SyncerResult<SkipDecision> {
        let decision = self.rows_event_decision(table, kind)?;

        match decision.reason {
            Some(reason) => {
                debug!(
                    schema = %table.schema,
                    table = %table.name,
                    event = %kind,
                    reason = %reason,
                    "row event skipped"
                );
                record_skip(kind.as_str(), reason);
            }
            None => record_keep(kind.as_str()),
        }

        Ok(decision)
    }

    fn rows_event_decision(
        &self,
        table: &TableRef,
        kind: EventKind,
    ) -> SyncerResult<SkipDecision> {
        if !self.online_ddl.is_real_table(&table.name) {
            return Ok(SkipDecision::skip(SkipReason::OnlineDdlArtifact));
        }

        if let Some(reason) = self.block_reason(table) {
            return Ok(SkipDecision::skip(reason));
        }

        match self.rules.resolve(table, kind, "")? {
            FilterAction::Ignore => Ok(SkipDecision::skip(SkipReason::BinlogRule)),
            FilterAction::Do => Ok(SkipDecision::keep()),
        }
    }

    fn unit_skip_reason(
        &self,
        info: &DdlInfo,
        unit: &DdlUnit,
    ) -> SyncerResult<Option<SkipReason>> {
        if unit.is_dropped() {
            return Ok(Some(SkipReason::BinlogRule));
        }

        let transient = unit.tables.iter().any(|table| {
            !table.is_schema_level() && !self.online_ddl.is_real_table(&table.name)
        });
        if transient {
            return Ok(Some(SkipReason::OnlineDdlArtifact));
        }

        for table in &unit.tables {
            if let Some(reason) = self.block_reason(table) {
                return Ok(Some(reason));
            }
        }

        let Some(primary) = unit.primary_table() else {
            return Err(syncer_error!(
                ErrorKind::InvalidState,
                "DDL unit references no table",
                unit.statement
            ));
        };

        match self.rules.resolve(primary, unit.kind, info.rule_text(unit))? {
            FilterAction::Ignore => Ok(Some(SkipReason::BinlogRule)),
            FilterAction::Do => Ok(None),
        }
    }

    fn block_reason(&self, table: &TableRef) -> Option<SkipReason> {
        if is_system_schema(&table.schema) {
            Some(SkipReason::SystemSchema)
        } else if self.block_allow.is_blocked(table) {
            Some(SkipReason::BlockAllowList)
        } else {
            None
        }
    }
}

fn record_skip(event_kind: &'static str, reason: SkipReason) {
    counter!(
        SYNCER_FILTER_SKIPPED_EVENTS_TOTAL,
        EVENT_KIND_LABEL => event_kind,
        SKIP_REASON_LABEL => reason.as_str()
    )
    .increment(1);
}

fn record_keep(event_kind: &'static str) {
    counter!(SYNCER_FILTER_KEPT_EVENTS_TOTAL, EVENT_KIND_LABEL => event_kind).increment(1);
}
