use crate::core::error;
use crate::core::schemas;
use rusqlite::{Connection, OpenFlags};
use std::fs;
use std::path::{Path, PathBuf};

/// Busy timeout for journal connections. Contention between the two robots is rare.
const BUSY_TIMEOUT_SECS: u64 = 5;

/// Open a connection to an existing journal database.
///
/// The database file is never created here, so a missing or unreadable store
/// surfaces as `StorageUnavailable` instead of an empty journal.
pub fn db_connect(db_path: &Path) -> Result<Connection, error::ArboristError> {
    let conn = Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|e| {
        error::ArboristError::StorageUnavailable(format!("{}: {}", db_path.display(), e))
    })?;
    conn.busy_timeout(std::time::Duration::from_secs(BUSY_TIMEOUT_SECS))
        .map_err(error::ArboristError::RusqliteError)?;
    conn.query_row("PRAGMA journal_mode=WAL;", [], |_| Ok(()))
        .map_err(|e| {
            error::ArboristError::StorageUnavailable(format!("{}: {}", db_path.display(), e))
        })?;
    Ok(conn)
}

pub fn journal_db_path(root: &Path) -> PathBuf {
    root.join(schemas::JOURNAL_DB_NAME)
}

/// Create the store root and the journal tables if they do not exist yet.
pub fn initialize_journal_db(root: &Path) -> Result<PathBuf, error::ArboristError> {
    fs::create_dir_all(root).map_err(error::ArboristError::IoError)?;
    let db_path = journal_db_path(root);

    let conn = Connection::open(&db_path).map_err(|e| {
        error::ArboristError::StorageUnavailable(format!("{}: {}", db_path.display(), e))
    })?;
    for statement in schemas::JOURNAL_DB_SCHEMA {
        conn.execute(statement, [])?;
    }
    Ok(db_path)
}
