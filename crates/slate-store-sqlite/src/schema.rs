//! SQL schema for the Slate SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Local identity provider accounts.
CREATE TABLE IF NOT EXISTS accounts (
    uid           TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,   -- lowercased
    display_name  TEXT,
    photo_url     TEXT,
    password_hash TEXT NOT NULL,          -- argon2 PHC string
    created_at    TEXT NOT NULL
);

-- One document per identity; written by role selection, never deleted.
CREATE TABLE IF NOT EXISTS profiles (
    uid          TEXT PRIMARY KEY,
    role         TEXT,                    -- NULL means role selection pending
    display_name TEXT,
    photo_url    TEXT,
    bio          TEXT,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS requests (
    request_id TEXT PRIMARY KEY,
    kind       TEXT NOT NULL,             -- 'casting' | 'collaboration' | 'booking' | 'other'
    from_user  TEXT NOT NULL,
    from_name  TEXT NOT NULL,
    to_user    TEXT NOT NULL,
    status     TEXT NOT NULL DEFAULT 'pending',
    message    TEXT NOT NULL DEFAULT '',
    project    TEXT,
    is_read    INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS requests_inbox_idx ON requests(to_user, status);

PRAGMA user_version = 1;
";
