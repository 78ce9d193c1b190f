/// Schemas owned by the server itself; never replicated.
const SYSTEM_SCHEMAS: &[&str] = &[
    "information_schema",
    "performance_schema",
    "mysql",
    "sys",
    "metrics_schema",
    "inspection_schema",
];

/// Returns `true` if `schema` is one of the server's administrative schemas.
///
/// The comparison ignores case regardless of the task collation since the server resolves
/// these names case-insensitively.
pub fn is_system_schema(schema: &str) -> bool {
    SYSTEM_SCHEMAS
        .iter()
        .any(|system| system.eq_ignore_ascii_case(schema))
}
