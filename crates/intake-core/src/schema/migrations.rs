/// A schema migration.
#[derive(Debug)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

const MIGRATION_001: &str = r"
-- Key-value blobs (one row per storage key, overwritten on every write)
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
";

/// All migrations in order.
pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_kv",
    sql: MIGRATION_001,
}];
