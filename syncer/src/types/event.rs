use std::fmt;
use std::str::FromStr;

use crate::error::{ErrorKind, SyncerError};
use crate::syncer_error;

/// Kind of a binlog event as seen by the filter.
///
/// Every row event and every decomposed DDL statement maps to exactly one [`EventKind`]
/// before any filter layer looks at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Row insertion.
    Insert,
    /// Row update.
    Update,
    /// Row deletion.
    Delete,
    CreateDatabase,
    DropDatabase,
    CreateTable,
    DropTable,
    TruncateTable,
    RenameTable,
    AlterTable,
    CreateIndex,
    DropIndex,
    CreateView,
    DropView,
}

impl EventKind {
    /// Every known event kind.
    pub const ALL: [EventKind; 14] = [
        EventKind::Insert,
        EventKind::Update,
        EventKind::Delete,
        EventKind::CreateDatabase,
        EventKind::DropDatabase,
        EventKind::CreateTable,
        EventKind::DropTable,
        EventKind::TruncateTable,
        EventKind::RenameTable,
        EventKind::AlterTable,
        EventKind::CreateIndex,
        EventKind::DropIndex,
        EventKind::CreateView,
        EventKind::DropView,
    ];

    /// Returns `true` for row events.
    pub fn is_dml(&self) -> bool {
        matches!(
            self,
            EventKind::Insert | EventKind::Update | EventKind::Delete
        )
    }

    /// Returns `true` for schema-change events.
    pub fn is_ddl(&self) -> bool {
        !self.is_dml()
    }

    /// Returns `true` for statements that bring a new object into existence.
    ///
    /// Rules are applied to these while the statement is decomposed.
    pub fn is_create(&self) -> bool {
        matches!(
            self,
            EventKind::CreateDatabase
                | EventKind::CreateTable
                | EventKind::CreateIndex
                | EventKind::CreateView
        )
    }

    /// Returns the name used in rule configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Insert => "insert",
            EventKind::Update => "update",
            EventKind::Delete => "delete",
            EventKind::CreateDatabase => "create database",
            EventKind::DropDatabase => "drop database",
            EventKind::CreateTable => "create table",
            EventKind::DropTable => "drop table",
            EventKind::TruncateTable => "truncate table",
            EventKind::RenameTable => "rename table",
            EventKind::AlterTable => "alter table",
            EventKind::CreateIndex => "create index",
            EventKind::DropIndex => "drop index",
            EventKind::CreateView => "create view",
            EventKind::DropView => "drop view",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = SyncerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize_event_name(s);
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| {
                syncer_error!(
                    ErrorKind::ConfigError,
                    "Unknown binlog event type",
                    format!("'{s}' is not a known event type")
                )
            })
    }
}

/// An entry of a rule's event list: a single kind or a group selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventSelector {
    All,
    AllDdl,
    AllDml,
    Kind(EventKind),
}

impl EventSelector {
    /// Returns `true` if `kind` is covered by this selector.
    pub fn covers(&self, kind: EventKind) -> bool {
        match self {
            EventSelector::All => true,
            EventSelector::AllDdl => kind.is_ddl(),
            EventSelector::AllDml => kind.is_dml(),
            EventSelector::Kind(selected) => *selected == kind,
        }
    }
}

impl FromStr for EventSelector {
    type Err = SyncerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_event_name(s).as_str() {
            "all" => Ok(EventSelector::All),
            "all ddl" => Ok(EventSelector::AllDdl),
            "all dml" => Ok(EventSelector::AllDml),
            _ => s.parse().map(EventSelector::Kind),
        }
    }
}

/// Lowercases the name and collapses runs of whitespace.
fn normalize_event_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
