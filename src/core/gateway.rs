//! Storage gateway over the journal database.
//!
//! The gateway is the only code that speaks SQL. It exposes the small set of
//! aggregation and query operations the quota and audit engines need, keyed by
//! typed collections and fields so no column name ever comes from user input.
//! Failures propagate as-is; nothing here retries.

use crate::core::broker::JournalBroker;
use crate::core::db;
use crate::core::entry::{ActionKind, DailyTotal, JournalEntry, NewEntry, WeeklyTotal};
use crate::core::error::ArboristError;
use crate::core::schemas;
use crate::core::store::Store;
use crate::core::time;
use chrono::{DateTime, Utc};
use rusqlite::types::{ToSql, ToSqlOutput};
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use ulid::Ulid;

/// Logical collection of journal entries, one per care action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Collection {
    CutJournal,
    WaterJournal,
}

impl Collection {
    pub const ALL: [Collection; 2] = [Collection::CutJournal, Collection::WaterJournal];

    pub fn for_kind(kind: ActionKind) -> Self {
        match kind {
            ActionKind::Cut => Collection::CutJournal,
            ActionKind::Water => Collection::WaterJournal,
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Collection::CutJournal => ActionKind::Cut,
            Collection::WaterJournal => ActionKind::Water,
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            Collection::CutJournal => schemas::CUT_JOURNAL_TABLE,
            Collection::WaterJournal => schemas::WATER_JOURNAL_TABLE,
        }
    }

    /// The field holding this collection's amount.
    pub fn amount_field(&self) -> Field {
        match self {
            Collection::CutJournal => Field::NumberOfBranches,
            Collection::WaterJournal => Field::WaterAmount,
        }
    }

    pub fn from_table(name: &str) -> Option<Self> {
        Collection::ALL.into_iter().find(|c| c.table() == name)
    }

    fn has_field(&self, field: Field) -> bool {
        match field {
            Field::WaterAmount => *self == Collection::WaterJournal,
            Field::NumberOfBranches => *self == Collection::CutJournal,
            _ => true,
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// Document fields addressable through the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// Insertion identifier.
    Seq,
    EntryId,
    RobotId,
    Timestamp,
    WaterAmount,
    NumberOfBranches,
}

impl Field {
    pub fn column(&self) -> &'static str {
        match self {
            Field::Seq => "seq",
            Field::EntryId => "entry_id",
            Field::RobotId => "robot_id",
            Field::Timestamp => "timestamp",
            Field::WaterAmount => "water_amount",
            Field::NumberOfBranches => "number_of_branches",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Comparison {
    fn sql(&self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Ne => "<>",
            Comparison::Gt => ">",
            Comparison::Gte => ">=",
            Comparison::Lt => "<",
            Comparison::Lte => "<=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    fn sql(&self) -> &'static str {
        match self {
            Direction::Ascending => "ASC",
            Direction::Descending => "DESC",
        }
    }
}

/// Right-hand side of a match condition.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchValue {
    Text(String),
    Timestamp(DateTime<Utc>),
    Integer(i64),
    Number(f64),
}

impl ToSql for MatchValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            MatchValue::Text(s) => s.to_sql(),
            MatchValue::Timestamp(ts) => Ok(ToSqlOutput::from(time::format_timestamp(ts))),
            MatchValue::Integer(i) => i.to_sql(),
            MatchValue::Number(n) => n.to_sql(),
        }
    }
}

/// Gateway handle for one store's journal database.
pub struct StorageGateway {
    db_path: PathBuf,
    broker: JournalBroker,
    actor: String,
}

impl StorageGateway {
    /// Build a gateway for `store`. Nothing is opened until the first call.
    pub fn new(store: &Store) -> Self {
        Self {
            db_path: db::journal_db_path(&store.root),
            broker: JournalBroker::new(&store.root),
            actor: "arborist".to_string(),
        }
    }

    /// Name recorded as the actor of every write in the broker trail.
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = actor.into();
        self
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Sum `sum_field` over documents where `match_field <op> match_value`.
    /// `op` defaults to equality. Returns 0 when nothing matches.
    pub fn sum_where(
        &self,
        collection: Collection,
        match_field: Field,
        match_value: &MatchValue,
        sum_field: Field,
        op: Option<Comparison>,
    ) -> Result<f64, ArboristError> {
        ensure_field(collection, match_field)?;
        ensure_field(collection, sum_field)?;
        let sql = format!(
            "SELECT TOTAL({}) FROM {} WHERE {} {} ?1",
            sum_field.column(),
            collection.table(),
            match_field.column(),
            op.unwrap_or(Comparison::Eq).sql()
        );
        self.broker.with_read(&self.db_path, |conn| {
            let total: f64 = conn.query_row(&sql, params![match_value], |row| row.get(0))?;
            Ok(total)
        })
    }

    /// Totals per UTC calendar day, ascending by date.
    pub fn sum_grouped_by_day(
        &self,
        collection: Collection,
        sum_field: Field,
        timestamp_field: Field,
    ) -> Result<Vec<DailyTotal>, ArboristError> {
        ensure_field(collection, sum_field)?;
        ensure_timestamp(timestamp_field)?;
        // Stored timestamps are fixed-width UTC text, so the first ten bytes are the date.
        let sql = format!(
            "SELECT substr({ts}, 1, 10) AS day, TOTAL({sum}) FROM {table} GROUP BY day ORDER BY day ASC",
            ts = timestamp_field.column(),
            sum = sum_field.column(),
            table = collection.table()
        );
        let rows = self.grouped_rows(&sql)?;
        rows.into_iter()
            .map(|(day, total)| {
                Ok(DailyTotal {
                    date: time::parse_date(&day)?,
                    total,
                })
            })
            .collect()
    }

    /// Totals per Monday-started UTC week, ascending by week start.
    pub fn sum_grouped_by_week(
        &self,
        collection: Collection,
        sum_field: Field,
        timestamp_field: Field,
    ) -> Result<Vec<WeeklyTotal>, ArboristError> {
        ensure_field(collection, sum_field)?;
        ensure_timestamp(timestamp_field)?;
        // '-6 days' then 'weekday 1' lands on the Monday on or before the date.
        let sql = format!(
            "SELECT date(substr({ts}, 1, 10), '-6 days', 'weekday 1') AS week_start, TOTAL({sum}) \
             FROM {table} GROUP BY week_start ORDER BY week_start ASC",
            ts = timestamp_field.column(),
            sum = sum_field.column(),
            table = collection.table()
        );
        let rows = self.grouped_rows(&sql)?;
        rows.into_iter()
            .map(|(start, total)| {
                let week_start = time::parse_date(&start)?;
                Ok(WeeklyTotal {
                    week_start,
                    week_number: time::week_number(week_start),
                    total,
                })
            })
            .collect()
    }

    /// Append one entry. The amount must be finite and non-negative, and a
    /// whole number for cuts.
    pub fn insert(
        &self,
        collection: Collection,
        entry: &NewEntry,
    ) -> Result<JournalEntry, ArboristError> {
        validate_new_entry(collection, entry)?;
        let entry_id = Ulid::new().to_string();
        let ts = time::format_timestamp(&entry.timestamp);
        let sql = format!(
            "INSERT INTO {}(entry_id, robot_id, timestamp, {}) VALUES(?1, ?2, ?3, ?4)",
            collection.table(),
            collection.amount_field().column()
        );
        let op = format!("journal.insert.{}", collection.kind());

        let seq = self
            .broker
            .with_write(&self.db_path, &self.actor, &op, |conn| {
                match collection {
                    Collection::CutJournal => conn.execute(
                        &sql,
                        params![entry_id, entry.robot_id, ts, entry.amount as i64],
                    )?,
                    Collection::WaterJournal => conn.execute(
                        &sql,
                        params![entry_id, entry.robot_id, ts, entry.amount],
                    )?,
                };
                Ok(conn.last_insert_rowid())
            })?;

        Ok(JournalEntry {
            entry_id,
            seq,
            robot_id: entry.robot_id.clone(),
            timestamp: entry.timestamp,
            amount: entry.amount,
            kind: collection.kind(),
        })
    }

    /// Journal collections present in the database, in name order.
    pub fn list_collections(&self) -> Result<Vec<Collection>, ArboristError> {
        self.broker.with_read(&self.db_path, |conn| {
            let mut stmt =
                conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")?;
            let names = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(names
                .iter()
                .filter_map(|name| Collection::from_table(name))
                .collect())
        })
    }

    /// Every entry of `collection` ordered by `field`. Ties keep insertion order.
    pub fn find_all_sorted_by(
        &self,
        collection: Collection,
        field: Field,
        direction: Direction,
    ) -> Result<Vec<JournalEntry>, ArboristError> {
        ensure_field(collection, field)?;
        let sql = format!(
            "SELECT seq, entry_id, robot_id, timestamp, {amount} FROM {table} ORDER BY {field} {dir}, seq ASC",
            amount = collection.amount_field().column(),
            table = collection.table(),
            field = field.column(),
            dir = direction.sql()
        );
        self.broker
            .with_read(&self.db_path, |conn| read_entries(conn, collection, &sql, &[]))
    }

    /// The `limit` most recently inserted entries, newest first.
    pub fn find_last(
        &self,
        collection: Collection,
        limit: usize,
    ) -> Result<Vec<JournalEntry>, ArboristError> {
        let sql = format!(
            "SELECT seq, entry_id, robot_id, timestamp, {amount} FROM {table} ORDER BY seq DESC LIMIT ?1",
            amount = collection.amount_field().column(),
            table = collection.table()
        );
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.broker.with_read(&self.db_path, |conn| {
            read_entries(conn, collection, &sql, &[&limit as &dyn ToSql])
        })
    }

    fn grouped_rows(&self, sql: &str) -> Result<Vec<(String, f64)>, ArboristError> {
        self.broker.with_read(&self.db_path, |conn| {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?)))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn read_entries(
    conn: &Connection,
    collection: Collection,
    sql: &str,
    sql_params: &[&dyn ToSql],
) -> Result<Vec<JournalEntry>, ArboristError> {
    let mut stmt = conn.prepare(sql)?;
    let raw = stmt
        .query_map(sql_params, |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, f64>(4)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    raw.into_iter()
        .map(|(seq, entry_id, robot_id, ts, amount)| {
            Ok(JournalEntry {
                entry_id,
                seq,
                robot_id,
                timestamp: time::parse_timestamp(&ts)?,
                amount,
                kind: collection.kind(),
            })
        })
        .collect()
}

fn ensure_field(collection: Collection, field: Field) -> Result<(), ArboristError> {
    if collection.has_field(field) {
        Ok(())
    } else {
        Err(ArboristError::ValidationError(format!(
            "{} has no field '{}'",
            collection,
            field.column()
        )))
    }
}

fn ensure_timestamp(field: Field) -> Result<(), ArboristError> {
    if field == Field::Timestamp {
        Ok(())
    } else {
        Err(ArboristError::ValidationError(format!(
            "'{}' is not a timestamp field",
            field.column()
        )))
    }
}

fn validate_new_entry(collection: Collection, entry: &NewEntry) -> Result<(), ArboristError> {
    if entry.robot_id.trim().is_empty() {
        return Err(ArboristError::ValidationError(
            "robot_id must not be empty".to_string(),
        ));
    }
    if !entry.amount.is_finite() || entry.amount < 0.0 {
        return Err(ArboristError::ValidationError(format!(
            "amount must be a non-negative number, got {}",
            entry.amount
        )));
    }
    if collection == Collection::CutJournal && entry.amount.fract() != 0.0 {
        return Err(ArboristError::ValidationError(format!(
            "number_of_branches must be a whole number, got {}",
            entry.amount
        )));
    }
    Ok(())
}
