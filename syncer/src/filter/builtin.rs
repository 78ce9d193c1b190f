use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

/// Statements that never change replicated table data.
const BUILTIN_SKIP_PATTERNS: &[&str] = &[
    // account management
    r"^GRANT\b",
    r"^REVOKE\b",
    r"^(CREATE|DROP|ALTER|RENAME)\s+USER\b",
    r"^(CREATE|DROP)\s+ROLE\b",
    r"^SET\s+(DEFAULT\s+)?(PASSWORD|ROLE)\b",
    // maintenance
    r"^FLUSH\b",
    r"^(ANALYZE|OPTIMIZE|REPAIR)\s+(NO_WRITE_TO_BINLOG\s+|LOCAL\s+)?TABLE\b",
    // stored programs
    r"^(CREATE|ALTER|DROP)\s+(DEFINER\s*=\s*\S+\s+)?(PROCEDURE|FUNCTION)\b",
    r"^CREATE\s+(DEFINER\s*=\s*\S+\s+)?(AGGREGATE\s+)?FUNCTION\b",
    r"^(CREATE|DROP)\s+(DEFINER\s*=\s*\S+\s+)?TRIGGER\b",
    r"^(CREATE|ALTER|DROP)\s+(DEFINER\s*=\s*\S+\s+)?EVENT\b",
    // server objects
    r"^(CREATE|ALTER|DROP)\s+SERVER\b",
    r"^(CREATE|ALTER|DROP)\s+(UNDO\s+)?TABLESPACE\b",
    r"^(CREATE|ALTER|DROP)\s+LOGFILE\s+GROUP\b",
    r"^(INSTALL|UNINSTALL)\s+PLUGIN\b",
];

static BUILTIN_SKIP_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    let alternation = BUILTIN_SKIP_PATTERNS
        .iter()
        .map(|pattern| format!("(?:{pattern})"))
        .collect::<Vec<_>>()
        .join("|");

    RegexBuilder::new(&alternation)
        .case_insensitive(true)
        .build()
        .expect("built-in skip patterns are valid regular expressions")
});

/// Returns `true` if `sql` is a statement the replication stream always drops.
///
/// Leading whitespace and comments are ignored.
pub fn is_builtin_skipped(sql: &str) -> bool {
    BUILTIN_SKIP_REGEX.is_match(strip_leading_comments(sql))
}

fn strip_leading_comments(mut sql: &str) -> &str {
    loop {
        sql = sql.trim_start();

        if let Some(rest) = sql.strip_prefix("/*") {
            // Executable comments such as `/*!50003 ... */` carry the statement itself.
            if rest.starts_with('!') {
                return sql;
            }
            match rest.find("*/") {
                Some(end) => sql = &rest[end + 2..],
                None => return "",
            }
        } else if let Some(rest) = sql.strip_prefix("--").or_else(|| sql.strip_prefix('#')) {
            match rest.find('\n') {
                Some(end) => sql = &rest[end + 1..],
                None => return "",
            }
        } else {
            return sql;
        }
    }
}
