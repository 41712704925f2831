//! SQL schema for the Punchcard SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    id                    TEXT PRIMARY KEY,
    first_name            TEXT NOT NULL,
    last_name             TEXT NOT NULL,
    phone_number          TEXT NOT NULL UNIQUE,
    total_visits          INTEGER NOT NULL DEFAULT 0 CHECK (total_visits >= 0),
    current_reward_points INTEGER NOT NULL DEFAULT 0 CHECK (current_reward_points >= 0),
    pass_serial_number    TEXT UNIQUE,     -- NULL until the pass is issued
    created_at            TEXT NOT NULL,   -- ISO 8601 UTC, microseconds
    updated_at            TEXT NOT NULL
);

-- Visits are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS visits (
    id                   TEXT PRIMARY KEY,
    user_id              TEXT NOT NULL REFERENCES users(id),
    pass_serial_number   TEXT NOT NULL,
    visited_at           TEXT NOT NULL,
    reward_points_earned INTEGER NOT NULL DEFAULT 1,
    is_reward_visit      INTEGER NOT NULL DEFAULT 0
);

-- Only the claim columns are ever updated.
CREATE TABLE IF NOT EXISTS reward_notifications (
    id                   TEXT PRIMARY KEY,
    user_id              TEXT NOT NULL REFERENCES users(id),
    notification_sent_at TEXT NOT NULL,
    reward_claimed       INTEGER NOT NULL DEFAULT 0,
    reward_claimed_at    TEXT
);

CREATE INDEX IF NOT EXISTS visits_user_idx        ON visits(user_id, visited_at);
CREATE INDEX IF NOT EXISTS notifications_user_idx ON reward_notifications(user_id, notification_sent_at);

PRAGMA user_version = 1;
";
