#![cfg(feature = "test-utils")]

use syncer::config::shared::FilterAction;
use syncer::filter::{EventFilter, OnlineDdlTracker, SkipReason, create_filter_channel};
use syncer::test_utils::config::{
    ignore_dbs_config, ignore_tables_config, schema_rule, table_rule, test_config,
};
use syncer::types::{EventKind, TableRef};
use syncer_telemetry::tracing::init_test_tracing;

#[test]
fn query_events_follow_system_schema_block_list_and_rules() {
    init_test_tracing();

    let mut config = ignore_tables_config(&[("s1", "test")]);
    config.filter_rules = vec![schema_rule(
        "foo*",
        &["create table"],
        &[r"^create\s+table"],
        FilterAction::Ignore,
    )];
    let filter = EventFilter::new(&config).unwrap();

    // (sql, schema, expected skip, expected empty reconstructed statement)
    let cases = [
        ("create table mysql.test (id int)", "mysql", true, false),
        ("drop table foo.test", "foo", false, false),
        ("create table foo.test (id int)", "foo", true, true),
        ("rename table s1.test to s1.test1", "s1", true, false),
        ("rename table s1.test1 to s1.test", "s1", true, false),
        ("rename table s1.test1 to s1.test2", "s1", false, false),
        ("create table s1.test2 (id int)", "s1", false, false),
        ("rename table mysql.test to s1.test3", "s1", true, false),
        ("rename table s1.test4 to mysql.test4", "s1", true, false),
    ];

    for (sql, schema, expect_skip, expect_empty) in cases {
        let info = filter.decompose(schema, sql).unwrap();
        let decision = filter.skip_query_event(&info).unwrap();

        assert_eq!(decision.skip, expect_skip, "skip mismatch for '{sql}'");
        assert_eq!(
            info.origin_ddl().is_empty(),
            expect_empty,
            "statement mismatch for '{sql}'"
        );
        assert_eq!(decision.statement.is_empty(), expect_skip);
    }
}

#[test]
fn rename_is_excluded_when_either_table_is_blocked() {
    init_test_tracing();

    let filter = EventFilter::new(&ignore_tables_config(&[("s1", "test")])).unwrap();

    let info = filter
        .decompose("s1", "RENAME TABLE s1.a TO s1.b, s1.test TO s1.c")
        .unwrap();
    let decision = filter.skip_query_event(&info).unwrap();

    assert!(!decision.skip);
    assert_eq!(decision.reason, Some(SkipReason::BlockAllowList));
    let statement = decision.statement.to_lowercase();
    assert!(statement.contains("s1.a to s1.b"));
    assert!(!statement.contains("s1.test"));
}

#[test]
fn table_copied_from_a_blocked_table_is_not_created() {
    init_test_tracing();

    let filter = EventFilter::new(&ignore_tables_config(&[("s1", "test")])).unwrap();

    let info = filter
        .decompose("s1", "CREATE TABLE s1.test_copy LIKE s1.test")
        .unwrap();
    let decision = filter.skip_query_event(&info).unwrap();

    assert!(decision.skip);
    assert_eq!(decision.reason, Some(SkipReason::BlockAllowList));
}

#[test]
fn drop_index_follows_the_owning_table() {
    init_test_tracing();

    let filter = EventFilter::new(&ignore_tables_config(&[("s1", "test")])).unwrap();

    let info = filter.decompose("s1", "DROP INDEX idx ON test").unwrap();
    let decision = filter.skip_query_event(&info).unwrap();
    assert!(decision.skip);
    assert_eq!(decision.reason, Some(SkipReason::BlockAllowList));

    let info = filter.decompose("s1", "DROP INDEX idx ON other").unwrap();
    let decision = filter.skip_query_event(&info).unwrap();
    assert!(!decision.skip);
    assert_eq!(decision.statement, "DROP INDEX idx ON other");
}

#[test]
fn sql_pattern_rules_see_the_binlog_text() {
    init_test_tracing();

    let mut config = test_config();
    config.filter_rules = vec![schema_rule(
        "s1",
        &["alter table"],
        &[r"^alter\s+table\s+t\s+change\s+c\s+d"],
        FilterAction::Ignore,
    )];
    let filter = EventFilter::new(&config).unwrap();

    let info = filter.decompose("s1", "ALTER TABLE t CHANGE c d INT").unwrap();
    let decision = filter.skip_query_event(&info).unwrap();

    assert!(decision.skip);
    assert_eq!(decision.reason, Some(SkipReason::BinlogRule));
}

#[test]
fn gh_ost_migration_reaches_the_real_table_at_cut_over() {
    init_test_tracing();

    let mut config = test_config();
    config.online_ddl.enabled = true;
    let filter = EventFilter::new(&config).unwrap();
    let mut tracker = OnlineDdlTracker::new();

    let mut replay = |sql: &str| {
        let info = filter.decompose("s1", sql).unwrap();
        tracker.skip_query_event(&filter, &info).unwrap()
    };

    for sql in [
        "CREATE TABLE s1._t_ghc (id BIGINT, hint VARCHAR(64))",
        "CREATE TABLE s1._t_gho LIKE s1.t",
        "ALTER TABLE s1._t_gho ADD COLUMN c INT",
        "ALTER TABLE s1._t_gho ADD INDEX idx_c (c)",
    ] {
        let decision = replay(sql);
        assert!(decision.skip, "expected '{sql}' to be held back");
        assert_eq!(decision.reason, Some(SkipReason::OnlineDdlArtifact));
    }

    let decision = replay("RENAME TABLE s1.t TO s1._t_del, s1._t_gho TO s1.t");
    assert!(!decision.skip);
    let statement = decision.statement.to_lowercase();
    assert!(!statement.contains("rename"));
    assert!(!statement.contains("_t_gho"));
    let alterations: Vec<&str> = statement.split("; ").collect();
    assert_eq!(alterations.len(), 2);
    assert!(alterations[0].starts_with("alter table `s1`.`t` add column c int"));
    assert!(alterations[1].starts_with("alter table `s1`.`t` add"));

    for sql in ["DROP TABLE IF EXISTS s1._t_ghc", "DROP TABLE IF EXISTS s1._t_del"] {
        let decision = replay(sql);
        assert!(decision.skip, "expected '{sql}' to be held back");
    }

    let ghost = TableRef::new("s1", "_t_gho");
    assert!(filter.skip_rows_event(&ghost, EventKind::Insert).unwrap().skip);
}

#[test]
fn pt_osc_migration_reaches_the_real_table_at_cut_over() {
    init_test_tracing();

    let mut config = test_config();
    config.online_ddl.enabled = true;
    let filter = EventFilter::new(&config).unwrap();
    let mut tracker = OnlineDdlTracker::new();

    let mut replay = |sql: &str| {
        let info = filter.decompose("s1", sql).unwrap();
        tracker.skip_query_event(&filter, &info).unwrap()
    };

    assert!(replay("CREATE TABLE s1._orders_new LIKE s1.orders").skip);
    assert!(replay("ALTER TABLE s1._orders_new DROP COLUMN legacy").skip);

    let decision = replay("RENAME TABLE s1.orders TO s1._orders_old, s1._orders_new TO s1.orders");
    assert!(!decision.skip);
    assert!(
        decision
            .statement
            .to_lowercase()
            .starts_with("alter table `s1`.`orders` drop")
    );

    assert!(replay("DROP TABLE IF EXISTS s1._orders_old").skip);
}

#[test]
fn row_events_skip_online_ddl_tables_and_ignored_events() {
    init_test_tracing();

    let mut config = test_config();
    config.online_ddl.enabled = true;
    config.filter_rules = vec![schema_rule("foo*", &["insert"], &[""], FilterAction::Ignore)];
    let filter = EventFilter::new(&config).unwrap();

    let ghost = TableRef::new("foo", "_test_gho");
    let table = TableRef::new("foo", "test");

    let decision = filter.skip_rows_event(&ghost, EventKind::Insert).unwrap();
    assert!(decision.skip);
    assert_eq!(decision.reason, Some(SkipReason::OnlineDdlArtifact));

    let decision = filter.skip_rows_event(&table, EventKind::Insert).unwrap();
    assert!(decision.skip);
    assert_eq!(decision.reason, Some(SkipReason::BinlogRule));

    assert!(!filter.skip_rows_event(&table, EventKind::Update).unwrap().skip);
    assert!(!filter.skip_rows_event(&table, EventKind::Delete).unwrap().skip);
}

#[test]
fn sql_pattern_rules_never_affect_row_events() {
    init_test_tracing();

    let mut config = test_config();
    config.filter_rules = vec![schema_rule("*", &[], &["^insert"], FilterAction::Ignore)];
    let filter = EventFilter::new(&config).unwrap();

    let decision = filter
        .skip_rows_event(&TableRef::new("foo", "test"), EventKind::Insert)
        .unwrap();

    assert!(!decision.skip);
}

#[test]
fn finer_granularity_rule_wins() {
    init_test_tracing();

    let mut config = ignore_dbs_config(&["s1"]);
    config.filter_rules = vec![
        schema_rule("*", &["drop table"], &[r"^drop\s+table"], FilterAction::Ignore),
        schema_rule("foo*", &["create table"], &[r"^create\s+table"], FilterAction::Do),
        table_rule(
            "foo*",
            "bar*",
            &["create table"],
            &[r"^create\s+table"],
            FilterAction::Ignore,
        ),
    ];
    let filter = EventFilter::new(&config).unwrap();

    let cases = [
        ("drop table tx.test", TableRef::new("tx", "test"), EventKind::DropTable, true),
        (
            "create table foo.test (id int)",
            TableRef::new("foo", "test"),
            EventKind::CreateTable,
            false,
        ),
        (
            "create table foo.bar (id int)",
            TableRef::new("foo", "bar"),
            EventKind::CreateTable,
            true,
        ),
    ];

    for (sql, table, kind, expect_skip) in cases {
        assert_eq!(
            filter.skip_by_filter(&table, kind, sql).unwrap(),
            expect_skip,
            "skip mismatch for '{sql}'"
        );
    }
}

#[test]
fn block_allow_list_skips_tables() {
    init_test_tracing();

    let filter = EventFilter::new(&ignore_dbs_config(&["s1"])).unwrap();

    assert!(filter.skip_by_table(&TableRef::new("mysql", "test")));
    assert!(filter.skip_by_table(&TableRef::new("s1", "test")));
    assert!(!filter.skip_by_table(&TableRef::new("s2", "test")));
}

#[test]
fn allow_mode_only_replicates_listed_tables() {
    init_test_tracing();

    let mut config = test_config();
    config.block_allow_list.do_dbs = vec!["app_*".to_string()];
    let filter = EventFilter::new(&config).unwrap();

    let info = filter
        .decompose("app_1", "CREATE TABLE orders (id INT)")
        .unwrap();
    assert!(!filter.skip_query_event(&info).unwrap().skip);

    let info = filter.decompose("other", "DROP TABLE orders").unwrap();
    let decision = filter.skip_query_event(&info).unwrap();
    assert!(decision.skip);
    assert_eq!(decision.reason, Some(SkipReason::BlockAllowList));
}

#[test]
fn published_filter_replaces_the_running_one() {
    init_test_tracing();

    let (tx, mut rx) = create_filter_channel(EventFilter::new(&test_config()).unwrap());
    let table = TableRef::new("s1", "test");

    let snapshot = rx.current();
    assert!(!snapshot.skip_by_table(&table));

    tx.publish(EventFilter::new(&ignore_dbs_config(&["s1"])).unwrap());

    assert!(rx.has_changed());
    assert!(rx.current().skip_by_table(&table));
    assert!(!snapshot.skip_by_table(&table));
}
