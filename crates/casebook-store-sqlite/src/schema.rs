//! SQL schema for the Casebook document store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per document. `body` is the record serialised as JSON.
CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,   -- '{prefix}{workspace}/{kind}' or '{prefix}{name}'
    doc_id     TEXT NOT NULL,
    body       TEXT NOT NULL,
    PRIMARY KEY (collection, doc_id)
);

-- Monotonic sequence per collection for records with integer IDs.
-- Never decremented, so deleted IDs are never handed out again.
CREATE TABLE IF NOT EXISTS counters (
    collection TEXT PRIMARY KEY,
    value      INTEGER NOT NULL
);

PRAGMA user_version = 1;
";
