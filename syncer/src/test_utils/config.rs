use syncer_config::shared::{BinlogEventRuleConfig, FilterAction, SyncerConfig, TableConfig};

/// Name given to every configuration built by these helpers.
pub const TEST_TASK_NAME: &str = "test-task";

/// Returns a configuration with default filter layers.
pub fn test_config() -> SyncerConfig {
    SyncerConfig::new(TEST_TASK_NAME)
}

/// Returns a configuration ignoring the given schemas.
pub fn ignore_dbs_config(dbs: &[&str]) -> SyncerConfig {
    let mut config = test_config();
    config.block_allow_list.ignore_dbs = dbs.iter().map(|db| db.to_string()).collect();
    config
}

/// Returns a configuration ignoring the given `(schema, table)` pairs.
pub fn ignore_tables_config(tables: &[(&str, &str)]) -> SyncerConfig {
    let mut config = test_config();
    config.block_allow_list.ignore_tables = tables
        .iter()
        .map(|(schema, name)| TableConfig::new(*schema, *name))
        .collect();
    config
}

/// Builds a schema-level rule.
pub fn schema_rule(
    schema: &str,
    events: &[&str],
    sql_patterns: &[&str],
    action: FilterAction,
) -> BinlogEventRuleConfig {
    table_rule(schema, "", events, sql_patterns, action)
}

/// Builds a rule; an empty `table` yields a schema-level rule.
pub fn table_rule(
    schema: &str,
    table: &str,
    events: &[&str],
    sql_patterns: &[&str],
    action: FilterAction,
) -> BinlogEventRuleConfig {
    BinlogEventRuleConfig {
        schema_pattern: schema.to_string(),
        table_pattern: table.to_string(),
        events: events.iter().map(|event| event.to_string()).collect(),
        sql_pattern: sql_patterns
            .iter()
            .map(|pattern| pattern.to_string())
            .collect(),
        action,
    }
}
