use crate::types::{EventKind, TableRef};

/// One independently filterable piece of a DDL statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DdlUnit {
    pub kind: EventKind,
    /// Tables touched by the unit. A rename carries the old table followed by the new one.
    pub tables: Vec<TableRef>,
    /// The statement fragment for this unit, empty once the unit has been dropped.
    pub statement: String,
}

impl DdlUnit {
    pub fn new(kind: EventKind, tables: Vec<TableRef>, statement: impl Into<String>) -> Self {
        Self {
            kind,
            tables,
            statement: statement.into(),
        }
    }

    /// The table rules are resolved against.
    pub fn primary_table(&self) -> Option<&TableRef> {
        self.tables.first()
    }

    pub fn is_dropped(&self) -> bool {
        self.statement.is_empty()
    }

    /// Drops the unit from the reconstructed statement.
    pub fn drop_statement(&mut self) {
        self.statement.clear();
    }
}

/// A DDL event split into per-table units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DdlInfo {
    /// Schema the statement was executed in.
    pub schema: String,
    /// The statement exactly as read from the binlog.
    pub origin_sql: String,
    pub units: Vec<DdlUnit>,
    /// Set when the statement matched the built-in skip list and was never parsed.
    pub builtin_skipped: bool,
}

impl DdlInfo {
    pub fn new(
        schema: impl Into<String>,
        origin_sql: impl Into<String>,
        units: Vec<DdlUnit>,
    ) -> Self {
        Self {
            schema: schema.into(),
            origin_sql: origin_sql.into(),
            units,
            builtin_skipped: false,
        }
    }

    pub fn builtin_skipped(schema: impl Into<String>, origin_sql: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            origin_sql: origin_sql.into(),
            units: Vec::new(),
            builtin_skipped: true,
        }
    }

    /// Reconstructs the statement from the units that were not dropped.
    ///
    /// The result is empty iff every unit was dropped.
    pub fn origin_ddl(&self) -> String {
        join_statements(self.units.iter().map(|unit| unit.statement.as_str()))
    }

    /// Text SQL-pattern rules are matched against for `unit`.
    ///
    /// A statement that was not split is matched as read from the binlog, since rendering it
    /// back from the parsed form normalizes keywords and drops comments.
    pub fn rule_text<'a>(&'a self, unit: &'a DdlUnit) -> &'a str {
        if self.units.len() == 1 {
            &self.origin_sql
        } else {
            &unit.statement
        }
    }

    /// Every table referenced by any unit, in order of appearance.
    pub fn tables(&self) -> impl Iterator<Item = &TableRef> {
        self.units.iter().flat_map(|unit| unit.tables.iter())
    }
}

/// Joins non-empty statement fragments with `"; "`.
pub(crate) fn join_statements<'a>(fragments: impl Iterator<Item = &'a str>) -> String {
    fragments
        .filter(|fragment| !fragment.is_empty())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rename_info() -> DdlInfo {
        DdlInfo::new(
            "s1",
            "RENAME TABLE a TO b, c TO d",
            vec![
                DdlUnit::new(
                    EventKind::RenameTable,
                    vec![TableRef::new("s1", "a"), TableRef::new("s1", "b")],
                    "RENAME TABLE s1.a TO s1.b",
                ),
                DdlUnit::new(
                    EventKind::RenameTable,
                    vec![TableRef::new("s1", "c"), TableRef::new("s1", "d")],
                    "RENAME TABLE s1.c TO s1.d",
                ),
            ],
        )
    }

    #[test]
    fn test_origin_ddl_skips_dropped_units() {
        let mut info = rename_info();
        assert_eq!(
            info.origin_ddl(),
            "RENAME TABLE s1.a TO s1.b; RENAME TABLE s1.c TO s1.d"
        );

        info.units[0].drop_statement();
        assert_eq!(info.origin_ddl(), "RENAME TABLE s1.c TO s1.d");

        info.units[1].drop_statement();
        assert!(info.origin_ddl().is_empty());
    }

    #[test]
    fn test_rename_primary_table_is_the_old_name() {
        let info = rename_info();

        assert_eq!(
            info.units[0].primary_table(),
            Some(&TableRef::new("s1", "a"))
        );
        assert_eq!(info.tables().count(), 4);
    }

    #[test]
    fn test_rule_text_prefers_binlog_text_for_unsplit_statements() {
        let info = rename_info();
        assert_eq!(info.rule_text(&info.units[1]), "RENAME TABLE s1.c TO s1.d");

        let unit = DdlUnit::new(
            EventKind::AlterTable,
            vec![TableRef::new("s1", "t")],
            "ALTER TABLE t CHANGE COLUMN c d INT",
        );
        let info = DdlInfo::new("s1", "ALTER TABLE t CHANGE c d INT", vec![unit]);
        assert_eq!(info.rule_text(&info.units[0]), "ALTER TABLE t CHANGE c d INT");
    }

    #[test]
    fn test_builtin_skipped_info_has_no_units() {
        let info = DdlInfo::builtin_skipped("s1", "FLUSH PRIVILEGES");

        assert!(info.builtin_skipped);
        assert!(info.units.is_empty());
        assert!(info.origin_ddl().is_empty());
    }
}
