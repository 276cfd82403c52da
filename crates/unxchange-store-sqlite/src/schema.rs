//! SQL schema for the convocatorias SQLite store.
//!
//! Executed once at connection startup. Document bodies are versioned per
//! row, so schema evolution of the JSON body does not need a migration.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One JSON document per convocatoria. `seq` gives a stable insertion order.
CREATE TABLE IF NOT EXISTS convocatorias (
    seq      INTEGER PRIMARY KEY AUTOINCREMENT,
    id       TEXT    NOT NULL UNIQUE,
    version  INTEGER NOT NULL,   -- schema version of `doc`
    doc      TEXT    NOT NULL    -- JSON object
);

-- Set membership: a user appears at most once per convocatoria.
CREATE TABLE IF NOT EXISTS interests (
    seq              INTEGER PRIMARY KEY AUTOINCREMENT,
    convocatoria_id  TEXT NOT NULL REFERENCES convocatorias(id) ON DELETE CASCADE,
    user_id          TEXT NOT NULL,
    UNIQUE (convocatoria_id, user_id)
);

CREATE INDEX IF NOT EXISTS interests_convocatoria_idx ON interests(convocatoria_id);

PRAGMA user_version = 1;
";
