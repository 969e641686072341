use crate::core::db;
use crate::core::error;
use crate::core::schemas;
use crate::core::time;
use colored::Colorize;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// The journal broker is the single path into `journal.db`.
///
/// Writes are serialized in-process and each one leaves a line in
/// `journal.events.jsonl`. Reads open a fresh connection and leave no trace.
/// Serialization covers one statement only: a quota check followed by an insert
/// is still two broker calls, and another process can write in between.
pub struct JournalBroker {
    audit_log_path: PathBuf,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BrokerEvent {
    pub ts: String,
    pub event_id: String,
    pub actor: String,
    pub op: String,
    pub db_id: String,
    pub status: String,
}

impl JournalBroker {
    pub fn new(root: &Path) -> Self {
        Self {
            audit_log_path: root.join(schemas::BROKER_EVENTS_NAME),
        }
    }

    /// Execute a write closure with a serialized connection and record the outcome.
    pub fn with_write<F, R>(
        &self,
        db_path: &Path,
        actor: &str,
        op_name: &str,
        f: F,
    ) -> Result<R, error::ArboristError>
    where
        F: FnOnce(&Connection) -> Result<R, error::ArboristError>,
    {
        static WRITE_LOCK: Mutex<()> = Mutex::new(());
        let _lock = WRITE_LOCK.lock().map_err(|_| {
            error::ArboristError::StorageUnavailable("journal write lock poisoned".to_string())
        })?;

        let db_id = db_path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        let result = db::db_connect(db_path).and_then(|conn| f(&conn));

        let status = if result.is_ok() { "success" } else { "error" };
        let logged = self.log_event(actor, op_name, &db_id, status);

        // A committed write stays committed; a lost trail line is only a warning.
        let value = result?;
        if let Err(e) = logged {
            eprintln!(
                "{} {} committed but the trail was not written: {}",
                "warning:".yellow().bold(),
                op_name,
                e
            );
        }
        Ok(value)
    }

    /// Execute a read-only closure.
    pub fn with_read<F, R>(&self, db_path: &Path, f: F) -> Result<R, error::ArboristError>
    where
        F: FnOnce(&Connection) -> Result<R, error::ArboristError>,
    {
        let conn = db::db_connect(db_path)?;
        f(&conn)
    }

    fn log_event(
        &self,
        actor: &str,
        op: &str,
        db_id: &str,
        status: &str,
    ) -> Result<(), error::ArboristError> {
        let ev = BrokerEvent {
            ts: time::now_epoch_z(),
            event_id: time::new_event_id(),
            actor: actor.to_string(),
            op: op.to_string(),
            db_id: db_id.to_string(),
            status: status.to_string(),
        };

        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.audit_log_path)
            .map_err(error::ArboristError::IoError)?;

        writeln!(f, "{}", serde_json::to_string(&ev)?).map_err(error::ArboristError::IoError)?;
        Ok(())
    }
}

/// Read the broker trail back, oldest first.
pub fn read_events(root: &Path) -> Result<Vec<BrokerEvent>, error::ArboristError> {
    let path = root.join(schemas::BROKER_EVENTS_NAME);
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(&path).map_err(error::ArboristError::IoError)?;
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(error::ArboristError::from))
        .collect()
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "broker",
        "version": "0.1.0",
        "description": "Journal write broker and its append-only trail",
        "commands": [
            { "name": "trail", "description": "Show the journal write trail" }
        ],
        "storage": ["journal.events.jsonl"]
    })
}
