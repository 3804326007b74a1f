//! SQL schema for the expense SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- `seq` defines insertion order for paging; `expense_id` is the public id.
CREATE TABLE IF NOT EXISTS expenses (
    seq          INTEGER PRIMARY KEY AUTOINCREMENT,
    expense_id   TEXT NOT NULL UNIQUE,
    merchant     TEXT NOT NULL,
    total        TEXT NOT NULL,     -- decimal text, scale preserved
    datetime_ms  INTEGER NOT NULL,  -- epoch milliseconds, UTC
    comments     TEXT,
    status       TEXT NOT NULL CHECK (status IN ('new', 'reimbursed'))
);

CREATE INDEX IF NOT EXISTS expenses_merchant_idx ON expenses(merchant);
CREATE INDEX IF NOT EXISTS expenses_status_idx   ON expenses(status);
CREATE INDEX IF NOT EXISTS expenses_datetime_idx ON expenses(datetime_ms);

PRAGMA user_version = 1;
";
