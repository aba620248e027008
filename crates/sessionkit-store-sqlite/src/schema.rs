//! SQL schema for the sessionkit SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Uids are unique per type hierarchy, named by its root type.
CREATE TABLE IF NOT EXISTS entities (
    root_type    TEXT    NOT NULL,
    entity_type  TEXT    NOT NULL,
    uid          INTEGER NOT NULL CHECK (uid > 0),
    partition_id INTEGER NOT NULL DEFAULT 0,
    properties   TEXT    NOT NULL DEFAULT '{}',   -- JSON object
    PRIMARY KEY (root_type, uid)
);

-- One payload per (user, scope); writes overwrite.
CREATE TABLE IF NOT EXISTS session_data (
    user_id    INTEGER NOT NULL,
    scope      TEXT    NOT NULL,
    payload    TEXT    NOT NULL,
    updated_at TEXT    NOT NULL,   -- RFC 3339 UTC
    PRIMARY KEY (user_id, scope)
);

CREATE INDEX IF NOT EXISTS entities_type_idx ON entities(entity_type, uid);
CREATE INDEX IF NOT EXISTS entities_partition_idx ON entities(partition_id);

PRAGMA user_version = 1;
";
