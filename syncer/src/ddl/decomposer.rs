//! Splits DDL statements into per-table units.
//!
//! A statement touching several tables (`DROP TABLE a, b`, `RENAME TABLE a TO b, c TO d`,
//! `ALTER TABLE a ADD c INT, RENAME TO b`) becomes one unit per table or table pair, each
//! carrying a standalone statement fragment so that filter decisions can be made per table and
//! the surviving fragments reassembled afterwards.

use sqlparser::ast::{
    AlterTableOperation, Ident, ObjectName, ObjectType, RenameTable, SchemaName, Statement,
};
use sqlparser::dialect::MySqlDialect;
use sqlparser::keywords::Keyword;
use sqlparser::parser::Parser;
use tracing::{debug, warn};

use crate::{bail, ensure};
use crate::ddl::info::{DdlInfo, DdlUnit};
use crate::error::{ErrorKind, SyncerResult};
use crate::filter::builtin::is_builtin_skipped;
use crate::filter::rules::{BinlogRuleSet, FilterAction};
use crate::types::{EventKind, TableRef};

/// Decomposes DDL statements, applying binlog rules to create-class units on the way.
#[derive(Debug, Clone, Copy)]
pub struct DdlDecomposer<'a> {
    rules: &'a BinlogRuleSet,
}

impl<'a> DdlDecomposer<'a> {
    pub fn new(rules: &'a BinlogRuleSet) -> Self {
        Self { rules }
    }

    /// Parses `sql`, executed in `schema`, into a [`DdlInfo`].
    ///
    /// Create-class units resolving to [`FilterAction::Ignore`] come back with an empty
    /// fragment. Statements on the built-in skip list are not parsed at all.
    pub fn decompose(&self, schema: &str, sql: &str) -> SyncerResult<DdlInfo> {
        if is_builtin_skipped(sql) {
            warn!(schema, sql, "statement dropped by the built-in skip list");
            return Ok(DdlInfo::builtin_skipped(schema, sql));
        }

        let mut units = split_statements(schema, sql)?;
        let unsplit = units.len() == 1;

        for unit in units.iter_mut().filter(|unit| unit.kind.is_create()) {
            let Some(table) = unit.primary_table() else {
                continue;
            };
            let text = if unsplit { sql } else { unit.statement.as_str() };
            let action = self.rules.resolve(table, unit.kind, text)?;

            if action == FilterAction::Ignore {
                debug!(
                    schema,
                    event = %unit.kind,
                    statement = %unit.statement,
                    "create statement ignored by binlog rule"
                );
                unit.drop_statement();
            }
        }

        Ok(DdlInfo::new(schema, sql, units))
    }
}

/// Parses `sql` and returns the units of every statement it contains, in order.
///
/// No rule is applied.
pub fn split_statements(schema: &str, sql: &str) -> SyncerResult<Vec<DdlUnit>> {
    if let Some(unit) = drop_index_on_table(schema, sql)? {
        return Ok(vec![unit]);
    }

    let statements = Parser::parse_sql(&MySqlDialect {}, sql)?;
    ensure!(
        !statements.is_empty(),
        ErrorKind::DdlParseError,
        "Empty DDL statement",
        sql
    );

    let mut units = Vec::with_capacity(statements.len());
    for statement in &statements {
        split_statement(schema, statement, &mut units)?;
    }

    Ok(units)
}

fn split_statement(
    schema: &str,
    statement: &Statement,
    units: &mut Vec<DdlUnit>,
) -> SyncerResult<()> {
    match statement {
        Statement::CreateTable(create) => {
            // `CREATE TABLE t LIKE src` also reads from `src`.
            let mut tables = vec![table_ref(schema, &create.name)?];
            if let Some(source) = &create.like {
                tables.push(table_ref(schema, source)?);
            }
            units.push(DdlUnit::new(
                EventKind::CreateTable,
                tables,
                statement.to_string(),
            ));
        }
        Statement::CreateView { name, .. } => units.push(DdlUnit::new(
            EventKind::CreateView,
            vec![table_ref(schema, name)?],
            statement.to_string(),
        )),
        Statement::CreateIndex(create) => units.push(DdlUnit::new(
            EventKind::CreateIndex,
            vec![table_ref(schema, &create.table_name)?],
            statement.to_string(),
        )),
        Statement::CreateDatabase { db_name, .. } => units.push(DdlUnit::new(
            EventKind::CreateDatabase,
            vec![schema_ref(db_name)?],
            statement.to_string(),
        )),
        Statement::CreateSchema { schema_name, .. } => {
            let target = match schema_name {
                SchemaName::Simple(name) | SchemaName::NamedAuthorization(name, _) => {
                    schema_ref(name)?
                }
                SchemaName::UnnamedAuthorization(ident) => {
                    TableRef::schema_only(ident.value.clone())
                }
            };
            units.push(DdlUnit::new(
                EventKind::CreateDatabase,
                vec![target],
                statement.to_string(),
            ));
        }
        Statement::Drop {
            object_type, names, ..
        } => {
            let kind = match object_type {
                ObjectType::Table => EventKind::DropTable,
                ObjectType::View => EventKind::DropView,
                ObjectType::Schema => EventKind::DropDatabase,
                other if other.to_string() == "DATABASE" => EventKind::DropDatabase,
                other => bail!(
                    ErrorKind::UnsupportedStatement,
                    "Unsupported DROP statement",
                    other
                ),
            };

            for name in names {
                let target = match kind {
                    EventKind::DropDatabase => schema_ref(name)?,
                    _ => table_ref(schema, name)?,
                };

                let mut single = statement.clone();
                if let Statement::Drop { names, .. } = &mut single {
                    *names = vec![name.clone()];
                }
                units.push(DdlUnit::new(kind, vec![target], single.to_string()));
            }
        }
        Statement::Truncate { table_names, .. } => {
            for target in table_names {
                let table = table_ref(schema, &target.name)?;

                let mut single = statement.clone();
                if let Statement::Truncate { table_names, .. } = &mut single {
                    *table_names = vec![target.clone()];
                }
                units.push(DdlUnit::new(
                    EventKind::TruncateTable,
                    vec![table],
                    single.to_string(),
                ));
            }
        }
        Statement::RenameTable(renames) => {
            for rename in renames {
                units.push(rename_unit(schema, &rename.old_name, &rename.new_name)?);
            }
        }
        Statement::AlterTable {
            name, operations, ..
        } => {
            let (renames, others): (Vec<_>, Vec<_>) =
                operations.iter().cloned().partition(|operation| {
                    matches!(operation, AlterTableOperation::RenameTable { .. })
                });

            if !others.is_empty() || renames.is_empty() {
                let mut altered = statement.clone();
                if let Statement::AlterTable { operations, .. } = &mut altered {
                    *operations = others;
                }
                units.push(DdlUnit::new(
                    EventKind::AlterTable,
                    vec![table_ref(schema, name)?],
                    altered.to_string(),
                ));
            }

            // Chained renames move the table step by step.
            let mut current = name.clone();
            for operation in renames {
                if let AlterTableOperation::RenameTable { table_name } = operation {
                    units.push(rename_unit(schema, &current, &table_name)?);
                    current = table_name;
                }
            }
        }
        other => bail!(
            ErrorKind::UnsupportedStatement,
            "Statement is not a supported DDL",
            other
        ),
    }

    Ok(())
}

fn rename_unit(
    schema: &str,
    old_name: &ObjectName,
    new_name: &ObjectName,
) -> SyncerResult<DdlUnit> {
    let tables = vec![table_ref(schema, old_name)?, table_ref(schema, new_name)?];
    let statement = Statement::RenameTable(vec![RenameTable {
        old_name: old_name.clone(),
        new_name: new_name.clone(),
    }]);

    Ok(DdlUnit::new(EventKind::RenameTable, tables, statement.to_string()))
}

/// Resolves a possibly unqualified table name against the current schema.
fn table_ref(schema: &str, name: &ObjectName) -> SyncerResult<TableRef> {
    match name.0.as_slice() {
        [table] => {
            if schema.is_empty() {
                bail!(ErrorKind::DdlParseError, "No database selected", name);
            }
            Ok(TableRef::new(schema, table.value.clone()))
        }
        [db, table] => Ok(TableRef::new(db.value.clone(), table.value.clone())),
        _ => bail!(ErrorKind::DdlParseError, "Invalid table name", name),
    }
}

fn schema_ref(name: &ObjectName) -> SyncerResult<TableRef> {
    match name.0.as_slice() {
        [db] => Ok(TableRef::schema_only(db.value.clone())),
        _ => bail!(ErrorKind::DdlParseError, "Invalid database name", name),
    }
}

/// Renders a single `ALTER TABLE` statement against `table` instead of the table it names.
pub(crate) fn retarget_alter_table(statement: &str, table: &TableRef) -> SyncerResult<String> {
    let mut statements = Parser::parse_sql(&MySqlDialect {}, statement)?;

    let [Statement::AlterTable { name, .. }] = statements.as_mut_slice() else {
        bail!(
            ErrorKind::InvalidState,
            "Expected a single ALTER TABLE statement",
            statement
        );
    };
    *name = ObjectName(vec![
        Ident::with_quote('`', table.schema.clone()),
        Ident::with_quote('`', table.name.clone()),
    ]);

    Ok(statements[0].to_string())
}

/// Recognizes MySQL's `DROP INDEX idx ON tbl`, which the parser has no statement for.
///
/// The unit targets the table owning the index and keeps the statement text as written.
fn drop_index_on_table(schema: &str, sql: &str) -> SyncerResult<Option<DdlUnit>> {
    let mut parser = Parser::new(&MySqlDialect {}).try_with_sql(sql)?;

    if !parser.parse_keywords(&[Keyword::DROP, Keyword::INDEX]) {
        return Ok(None);
    }
    parser.parse_object_name(false)?;
    if !parser.parse_keyword(Keyword::ON) {
        return Ok(None);
    }
    let table = parser.parse_object_name(false)?;

    let statement = sql.trim().trim_end_matches(';').trim_end();
    Ok(Some(DdlUnit::new(
        EventKind::DropIndex,
        vec![table_ref(schema, &table)?],
        statement,
    )))
}

#[cfg(test)]
mod tests {
    use syncer_config::shared::BinlogEventRuleConfig;

    use super::*;
    use crate::types::Collation;

    fn lowercase_statements(units: &[DdlUnit]) -> Vec<String> {
        units
            .iter()
            .map(|unit| unit.statement.to_lowercase())
            .collect()
    }

    #[test]
    fn test_create_table_single_unit() {
        let units = split_statements("foo", "create table test (id int)").unwrap();

        assert_eq!(units.len(), 1);
        assert_eq!(units[0].kind, EventKind::CreateTable);
        assert_eq!(units[0].tables, vec![TableRef::new("foo", "test")]);
        assert!(units[0].statement.to_lowercase().starts_with("create table"));
    }

    #[test]
    fn test_drop_tables_split_per_name() {
        let units = split_statements("s1", "DROP TABLE a, s2.b").unwrap();

        assert_eq!(units.len(), 2);
        assert_eq!(units[0].tables, vec![TableRef::new("s1", "a")]);
        assert_eq!(units[1].tables, vec![TableRef::new("s2", "b")]);
        let statements = lowercase_statements(&units);
        assert!(!statements[0].contains("s2.b"));
        assert!(statements[1].contains("s2.b"));
    }

    #[test]
    fn test_rename_pairs_carry_both_tables() {
        let units =
            split_statements("s1", "rename table s1.test to s1.test1, a to other.b").unwrap();

        assert_eq!(units.len(), 2);
        assert!(units.iter().all(|unit| unit.kind == EventKind::RenameTable));
        assert_eq!(
            units[0].tables,
            vec![TableRef::new("s1", "test"), TableRef::new("s1", "test1")]
        );
        assert_eq!(
            units[1].tables,
            vec![TableRef::new("s1", "a"), TableRef::new("other", "b")]
        );
        assert!(lowercase_statements(&units)[0].contains("s1.test to s1.test1"));
    }

    #[test]
    fn test_alter_table_rename_is_split() {
        let units =
            split_statements("s1", "ALTER TABLE t ADD COLUMN c INT, RENAME TO u").unwrap();

        assert_eq!(units.len(), 2);
        assert_eq!(units[0].kind, EventKind::AlterTable);
        assert_eq!(units[0].tables, vec![TableRef::new("s1", "t")]);
        assert!(!units[0].statement.to_lowercase().contains("rename"));
        assert_eq!(units[1].kind, EventKind::RenameTable);
        assert_eq!(
            units[1].tables,
            vec![TableRef::new("s1", "t"), TableRef::new("s1", "u")]
        );
    }

    #[test]
    fn test_truncate_and_database_statements() {
        let units = split_statements("s1", "TRUNCATE TABLE t").unwrap();
        assert_eq!(units[0].kind, EventKind::TruncateTable);
        assert_eq!(units[0].tables, vec![TableRef::new("s1", "t")]);

        let units = split_statements("", "CREATE DATABASE db1").unwrap();
        assert_eq!(units[0].kind, EventKind::CreateDatabase);
        assert_eq!(units[0].tables, vec![TableRef::schema_only("db1")]);
    }

    #[test]
    fn test_mysql_drop_index_targets_owning_table() {
        let units = split_statements("s1", "DROP INDEX idx ON t ALGORITHM = INPLACE;").unwrap();

        assert_eq!(units.len(), 1);
        assert_eq!(units[0].kind, EventKind::DropIndex);
        assert_eq!(units[0].tables, vec![TableRef::new("s1", "t")]);
        assert_eq!(units[0].statement, "DROP INDEX idx ON t ALGORITHM = INPLACE");

        let units = split_statements("", "drop index idx on s2.t").unwrap();
        assert_eq!(units[0].tables, vec![TableRef::new("s2", "t")]);
    }

    #[test]
    fn test_create_table_like_carries_source_table() {
        let units = split_statements("s1", "CREATE TABLE t2 LIKE s2.t").unwrap();

        assert_eq!(units[0].kind, EventKind::CreateTable);
        assert_eq!(
            units[0].tables,
            vec![TableRef::new("s1", "t2"), TableRef::new("s2", "t")]
        );
        assert_eq!(units[0].primary_table(), Some(&TableRef::new("s1", "t2")));
    }

    #[test]
    fn test_retarget_alter_table() {
        let statement = retarget_alter_table(
            "ALTER TABLE s1._t_gho ADD COLUMN c INT",
            &TableRef::new("s1", "t"),
        )
        .unwrap()
        .to_lowercase();
        assert!(statement.starts_with("alter table `s1`.`t` "));
        assert!(statement.contains("add column c int"));
        assert!(!statement.contains("_t_gho"));

        let err = retarget_alter_table("DROP TABLE t", &TableRef::new("s1", "t")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn test_unqualified_name_without_schema_fails() {
        let err = split_statements("", "DROP TABLE t").unwrap_err();

        assert_eq!(err.kind(), ErrorKind::DdlParseError);
    }

    #[test]
    fn test_malformed_and_unsupported_statements() {
        let err = split_statements("s1", "CREATE TABLE (").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DdlParseError);

        let err = split_statements("s1", "INSERT INTO t VALUES (1)").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedStatement);
    }

    #[test]
    fn test_decompose_drops_ignored_create_units() {
        let rules = BinlogRuleSet::new(
            &[BinlogEventRuleConfig {
                schema_pattern: "foo*".to_string(),
                table_pattern: String::new(),
                events: vec!["create table".to_string()],
                sql_pattern: vec![r"^create\s+table".to_string()],
                action: FilterAction::Ignore,
            }],
            Collation::CaseInsensitive,
        )
        .unwrap();
        let decomposer = DdlDecomposer::new(&rules);

        let info = decomposer
            .decompose("foo", "create table foo.test (id int)")
            .unwrap();
        assert_eq!(info.units.len(), 1);
        assert!(info.origin_ddl().is_empty());

        // Only create-class units are filtered while decomposing.
        let info = decomposer.decompose("foo", "drop table foo.test").unwrap();
        assert!(!info.origin_ddl().is_empty());
    }

    #[test]
    fn test_decompose_matches_rules_against_binlog_text() {
        let rules = BinlogRuleSet::new(
            &[BinlogEventRuleConfig {
                schema_pattern: "foo".to_string(),
                table_pattern: String::new(),
                events: vec!["create table".to_string()],
                sql_pattern: vec![r"^create\s+table\s+t\s+/\*\s*skip".to_string()],
                action: FilterAction::Ignore,
            }],
            Collation::CaseInsensitive,
        )
        .unwrap();

        let info = DdlDecomposer::new(&rules)
            .decompose("foo", "create table t /* skip */ (id int)")
            .unwrap();

        assert!(info.units[0].is_dropped());
    }

    #[test]
    fn test_decompose_builtin_statement() {
        let rules = BinlogRuleSet::default();

        let info = DdlDecomposer::new(&rules)
            .decompose("s1", "GRANT ALL ON s1.* TO 'u'@'%'")
            .unwrap();

        assert!(info.builtin_skipped);
        assert!(info.units.is_empty());
        assert_eq!(info.origin_sql, "GRANT ALL ON s1.* TO 'u'@'%'");
    }
}
