//! SQL schema for the Leadbook SQLite store.
//!
//! Executed once at connection startup; `PRAGMA user_version` records the
//! schema revision for future migrations.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS leads (
    lead_id       TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    email         TEXT NOT NULL,
    country_code  TEXT NOT NULL DEFAULT '',
    phone_number  TEXT NOT NULL DEFAULT '',
    lead_type     TEXT NOT NULL,   -- 'b2i' | 'b2b' | 'b2c' | 'b2g' | 'general'
    sub_category  TEXT,
    query         TEXT NOT NULL DEFAULT '',
    status        TEXT NOT NULL DEFAULT 'NEW',
    comment       TEXT NOT NULL DEFAULT '',
    course_json   TEXT,            -- JSON-encoded CourseRef or NULL
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

-- Notes are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS notes (
    seq         INTEGER PRIMARY KEY AUTOINCREMENT,   -- insertion order
    lead_id     TEXT NOT NULL REFERENCES leads(lead_id),
    text        TEXT NOT NULL CHECK (length(trim(text)) > 0),
    status      TEXT NOT NULL,
    added_by    TEXT NOT NULL,
    created_at  TEXT NOT NULL   -- fixed-width RFC 3339, sorts lexically
);

CREATE INDEX IF NOT EXISTS notes_lead_idx    ON notes(lead_id, created_at);
CREATE INDEX IF NOT EXISTS leads_created_idx ON leads(created_at);

PRAGMA user_version = 1;
";
