use std::borrow::Cow;
use std::fmt;

/// How schema and table names are compared across the whole task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Collation {
    CaseSensitive,
    #[default]
    CaseInsensitive,
}

impl Collation {
    /// Returns the collation matching the task-wide `case_sensitive` switch.
    pub fn from_case_sensitive(case_sensitive: bool) -> Self {
        if case_sensitive {
            Collation::CaseSensitive
        } else {
            Collation::CaseInsensitive
        }
    }

    /// Returns the comparison form of `name`.
    pub fn fold<'a>(&self, name: &'a str) -> Cow<'a, str> {
        match self {
            Collation::CaseSensitive => Cow::Borrowed(name),
            Collation::CaseInsensitive if name.chars().any(char::is_uppercase) => {
                Cow::Owned(name.to_lowercase())
            }
            Collation::CaseInsensitive => Cow::Borrowed(name),
        }
    }

    /// Compares two names under this collation.
    pub fn names_eq(&self, a: &str, b: &str) -> bool {
        self.fold(a) == self.fold(b)
    }
}

/// A schema-qualified table reference as seen in the binlog.
///
/// An empty `name` denotes a schema-level target such as the subject of `CREATE DATABASE`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableRef {
    /// The schema (database) name.
    pub schema: String,
    /// The table name, empty for schema-level targets.
    pub name: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> TableRef {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// Creates a schema-level target.
    pub fn schema_only(schema: impl Into<String>) -> TableRef {
        Self {
            schema: schema.into(),
            name: String::new(),
        }
    }

    /// Returns `true` if this reference names a schema rather than a table.
    pub fn is_schema_level(&self) -> bool {
        self.name.is_empty()
    }

    /// Compares two references under the given collation.
    pub fn eq_with(&self, other: &TableRef, collation: Collation) -> bool {
        collation.names_eq(&self.schema, &other.schema)
            && collation.names_eq(&self.name, &other.name)
    }

    /// Returns the reference with its table name replaced.
    pub fn with_name(&self, name: impl Into<String>) -> TableRef {
        Self {
            schema: self.schema.clone(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_schema_level() {
            write!(f, "`{}`", self.schema)
        } else {
            write!(f, "`{}`.`{}`", self.schema, self.name)
        }
    }
}
