//! Journal records and the care actions they describe.

use crate::core::error::ArboristError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Care action a journal entry records. Each kind owns one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Cut,
    Water,
}

impl ActionKind {
    pub const ALL: [ActionKind; 2] = [ActionKind::Cut, ActionKind::Water];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Cut => "cut",
            ActionKind::Water => "water",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = ArboristError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cut" => Ok(ActionKind::Cut),
            "water" => Ok(ActionKind::Water),
            other => Err(ArboristError::InvalidConfiguration(format!(
                "Unknown action '{}'. Should be one of {}",
                other,
                ActionKind::ALL
                    .iter()
                    .map(ActionKind::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }
}

/// A proposed entry that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEntry {
    pub robot_id: String,
    pub timestamp: DateTime<Utc>,
    /// Liters for water, branch count for cuts.
    pub amount: f64,
}

impl NewEntry {
    pub fn new(robot_id: impl Into<String>, timestamp: DateTime<Utc>, amount: f64) -> Self {
        Self {
            robot_id: robot_id.into(),
            timestamp,
            amount,
        }
    }
}

/// A persisted, immutable journal entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub entry_id: String,
    /// Insertion order within the entry's collection.
    pub seq: i64,
    pub robot_id: String,
    pub timestamp: DateTime<Utc>,
    pub amount: f64,
    pub kind: ActionKind,
}

impl fmt::Display for JournalEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self.kind {
            ActionKind::Cut => "branches",
            ActionKind::Water => "l",
        };
        write!(
            f,
            "#{} {} robot={} {} {}{}",
            self.seq,
            self.entry_id,
            self.robot_id,
            crate::core::time::format_timestamp(&self.timestamp),
            self.amount,
            unit
        )
    }
}

/// Sum of one collection's amounts on one UTC calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub total: f64,
}

/// Sum of one collection's amounts in one Monday-started week.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeeklyTotal {
    pub week_start: NaiveDate,
    /// ISO week number of `week_start`.
    pub week_number: u32,
    pub total: f64,
}
