//! Centralized database schema definitions for the journal database.
//!
//! Arborist keeps one SQLite database per store (`journal.db`) with one table per
//! care action. Both tables are append-only: nothing in the crate issues UPDATE
//! or DELETE against them.
//!
//! `seq` is the insertion order. `entry_id` is the ULID reported by audits.
//! `timestamp` is fixed-width RFC 3339 UTC text (`YYYY-MM-DDTHH:MM:SS.ffffffZ`),
//! so text comparison and SQLite date functions both work on it.

pub const JOURNAL_DB_NAME: &str = "journal.db";

pub const CUT_JOURNAL_TABLE: &str = "CutJournal";
pub const WATER_JOURNAL_TABLE: &str = "WaterJournal";

pub const CUT_JOURNAL_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS CutJournal (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        entry_id TEXT NOT NULL UNIQUE,
        robot_id TEXT NOT NULL,
        timestamp TEXT NOT NULL,
        number_of_branches INTEGER NOT NULL CHECK (number_of_branches >= 0)
    )
";
pub const CUT_JOURNAL_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_cut_journal_timestamp ON CutJournal(timestamp)";

pub const WATER_JOURNAL_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS WaterJournal (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        entry_id TEXT NOT NULL UNIQUE,
        robot_id TEXT NOT NULL,
        timestamp TEXT NOT NULL,
        water_amount REAL NOT NULL CHECK (water_amount >= 0)
    )
";
pub const WATER_JOURNAL_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_water_journal_timestamp ON WaterJournal(timestamp)";

/// Every statement needed to bring a fresh journal database up.
pub const JOURNAL_DB_SCHEMA: &[&str] = &[
    CUT_JOURNAL_SCHEMA,
    CUT_JOURNAL_INDEX,
    WATER_JOURNAL_SCHEMA,
    WATER_JOURNAL_INDEX,
];

/// Name of the append-only JSONL trail written by the journal broker.
pub const BROKER_EVENTS_NAME: &str = "journal.events.jsonl";

/// Name of the optional quota override file inside the store root.
pub const CONFIG_FILE_NAME: &str = "arborist.toml";
