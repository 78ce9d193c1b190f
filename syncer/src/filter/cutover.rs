use std::collections::HashMap;

use tracing::{debug, info};

use crate::ddl::{DdlInfo, DdlUnit, join_statements, retarget_alter_table};
use crate::error::SyncerResult;
use crate::filter::event_filter::{EventFilter, QueryDecision};
use crate::filter::online_ddl::TableKind;
use crate::types::{Collation, EventKind, TableRef};

/// Carries schema changes made by an online schema change tool over to the real table.
///
/// gh-ost and pt-osc alter a ghost copy of a table, fill it, then rename it over the original.
/// [`EventFilter::skip_query_event`] never replicates DDL on those transient tables, so the
/// tracker holds the ALTER statements run on a ghost table and replays them on the real table
/// at the cut-over rename. Rows copied into the ghost are never replicated; the real table
/// already received them.
///
/// A tracker belongs to one replication stream and must see its DDL events in binlog order.
#[derive(Debug, Default)]
pub struct OnlineDdlTracker {
    pending: HashMap<TableRef, Vec<String>>,
}

impl OnlineDdlTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// ALTER statements held for `table`, already rewritten against it.
    pub fn pending_statements(&self, filter: &EventFilter, table: &TableRef) -> &[String] {
        self.pending
            .get(&folded(filter.collation(), table))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Filters a DDL event like [`EventFilter::skip_query_event`], replacing a ghost to real
    /// table rename with the schema changes held for that table.
    pub fn skip_query_event(
        &mut self,
        filter: &EventFilter,
        info: &DdlInfo,
    ) -> SyncerResult<QueryDecision> {
        if !filter.online_ddl().is_enabled() || info.builtin_skipped {
            return filter.skip_query_event(info);
        }

        let mut units = Vec::with_capacity(info.units.len());
        let mut replayed = false;
        for unit in &info.units {
            replayed |= self.track_unit(filter, unit, &mut units)?;
        }

        if !replayed {
            return filter.skip_query_event(info);
        }

        let statement = join_statements(units.iter().map(|unit| unit.statement.as_str()));
        filter.skip_query_event(&DdlInfo::new(info.schema.clone(), statement, units))
    }

    /// Pushes the units standing for `unit` to `units`, returning `true` when held statements
    /// were replayed in its place.
    fn track_unit(
        &mut self,
        filter: &EventFilter,
        unit: &DdlUnit,
        units: &mut Vec<DdlUnit>,
    ) -> SyncerResult<bool> {
        let detector = filter.online_ddl();
        let collation = filter.collation();

        let Some(primary) = unit.primary_table() else {
            units.push(unit.clone());
            return Ok(false);
        };
        if unit.is_dropped() || detector.table_kind(&primary.name) != TableKind::Shadow {
            units.push(unit.clone());
            return Ok(false);
        }

        let logical = primary.with_name(detector.real_table_name(&primary.name));
        let key = folded(collation, &logical);

        match unit.kind {
            EventKind::CreateTable => {
                debug!(table = %logical, ghost = %primary.name, "online schema change started");
                self.pending.insert(key, Vec::new());
            }
            EventKind::AlterTable => {
                let statement = retarget_alter_table(&unit.statement, &logical)?;
                debug!(table = %logical, %statement, "holding ghost table alteration");
                self.pending.entry(key).or_default().push(statement);
            }
            EventKind::RenameTable => {
                let swaps_in = unit
                    .tables
                    .get(1)
                    .is_some_and(|target| target.eq_with(&logical, collation));

                let statements = if swaps_in {
                    self.pending.remove(&key).unwrap_or_default()
                } else {
                    Vec::new()
                };

                if !statements.is_empty() {
                    info!(
                        table = %logical,
                        statements = statements.len(),
                        "replaying online schema change at cut-over"
                    );
                    units.extend(statements.into_iter().map(|statement| {
                        DdlUnit::new(EventKind::AlterTable, vec![logical.clone()], statement)
                    }));
                    return Ok(true);
                }
            }
            EventKind::DropTable => {
                debug!(table = %logical, "online schema change abandoned");
                self.pending.remove(&key);
            }
            _ => {}
        }

        units.push(unit.clone());
        Ok(false)
    }
}

fn folded(collation: Collation, table: &TableRef) -> TableRef {
    TableRef::new(collation.fold(&table.schema), collation.fold(&table.name))
}
