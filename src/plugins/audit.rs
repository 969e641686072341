//! Read-only consistency audits over the journal.
//!
//! Two kinds of check:
//! - ordering: insertion order should follow event time in an append-only
//!   journal, so an entry timestamped earlier than the entry inserted right
//!   before it is a backdated or out-of-band write.
//! - range: per-day water and per-week cut totals must stay inside the quota
//!   bounds. Days and weeks with no entries between the first and last recorded
//!   period count as zero, which is always out of range when a minimum is set.
//!
//! Audits only report. Nothing here writes to the journal.

use crate::core::config::QuotaConfig;
use crate::core::entry::{DailyTotal, JournalEntry, WeeklyTotal};
use crate::core::error::ArboristError;
use crate::core::gateway::{Collection, Direction, Field, StorageGateway};
use crate::core::time;
use chrono::{Duration, NaiveDate};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Entry ids flagged by the ordering audit, keyed by collection.
pub type OrderingReport = BTreeMap<Collection, Vec<String>>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyAnomaly {
    pub date: NaiveDate,
    pub amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeeklyAnomaly {
    pub week_start: NaiveDate,
    pub week_number: u32,
    pub amount: f64,
}

pub struct AuditEngine<'a> {
    gateway: &'a StorageGateway,
    config: &'a QuotaConfig,
}

impl<'a> AuditEngine<'a> {
    pub fn new(gateway: &'a StorageGateway, config: &'a QuotaConfig) -> Self {
        Self { gateway, config }
    }

    /// Every journal collection maps to the ids of its out-of-order entries.
    /// Collections without anomalies map to an empty list.
    pub fn detect_ordering_anomalies(&self) -> Result<OrderingReport, ArboristError> {
        let mut report = OrderingReport::new();
        for collection in self.gateway.list_collections()? {
            let by_insertion =
                self.gateway
                    .find_all_sorted_by(collection, Field::Seq, Direction::Ascending)?;
            let by_time =
                self.gateway
                    .find_all_sorted_by(collection, Field::Timestamp, Direction::Ascending)?;
            report.insert(collection, ordering_inversions(&by_insertion, &by_time));
        }
        Ok(report)
    }

    /// Days whose water total falls outside `[min_water_per_day, max_water_per_day]`.
    pub fn detect_water_anomalies(&self) -> Result<Vec<DailyAnomaly>, ArboristError> {
        let totals = self.gateway.sum_grouped_by_day(
            Collection::WaterJournal,
            Field::WaterAmount,
            Field::Timestamp,
        )?;
        if totals.is_empty() {
            return Err(ArboristError::InsufficientData(
                "WaterJournal has no entries to audit".to_string(),
            ));
        }

        let (min, max) = (self.config.min_water_per_day, self.config.max_water_per_day);
        Ok(fill_daily_gaps(totals)
            .into_iter()
            .filter(|day| !(min..=max).contains(&day.total))
            .map(|day| DailyAnomaly {
                date: day.date,
                amount: day.total,
            })
            .collect())
    }

    /// Weeks whose cut total falls outside `[min_branches_per_week, max_branches_per_week]`.
    pub fn detect_cut_anomalies(&self) -> Result<Vec<WeeklyAnomaly>, ArboristError> {
        let totals = self.gateway.sum_grouped_by_week(
            Collection::CutJournal,
            Field::NumberOfBranches,
            Field::Timestamp,
        )?;
        if totals.is_empty() {
            return Err(ArboristError::InsufficientData(
                "CutJournal has no entries to audit".to_string(),
            ));
        }

        let min = self.config.min_branches_per_week as f64;
        let max = self.config.max_branches_per_week as f64;
        Ok(fill_weekly_gaps(totals)
            .into_iter()
            .filter(|week| !(min..=max).contains(&week.total))
            .map(|week| WeeklyAnomaly {
                week_start: week.week_start,
                week_number: week.week_number,
                amount: week.total,
            })
            .collect())
    }
}

/// Ids of entries timestamped earlier than their predecessor in insertion order.
///
/// When both orderings agree there is nothing to report.
pub fn ordering_inversions(
    by_insertion: &[JournalEntry],
    by_time: &[JournalEntry],
) -> Vec<String> {
    let same_order = by_insertion.len() == by_time.len()
        && by_insertion
            .iter()
            .zip(by_time)
            .all(|(a, b)| a.entry_id == b.entry_id);
    if same_order {
        return Vec::new();
    }

    by_insertion
        .windows(2)
        .filter(|pair| pair[0].timestamp > pair[1].timestamp)
        .map(|pair| pair[1].entry_id.clone())
        .collect()
}

/// Sorted daily series from the first to the last date, missing days as zero.
pub fn fill_daily_gaps(totals: Vec<DailyTotal>) -> Vec<DailyTotal> {
    let by_date: BTreeMap<NaiveDate, f64> = totals.iter().map(|d| (d.date, d.total)).collect();
    let (Some(first), Some(last)) = (by_date.keys().next(), by_date.keys().next_back()) else {
        return Vec::new();
    };

    let mut filled = Vec::new();
    let mut date = *first;
    while date <= *last {
        filled.push(DailyTotal {
            date,
            total: by_date.get(&date).copied().unwrap_or(0.0),
        });
        date += Duration::days(1);
    }
    filled
}

/// Sorted weekly series from the first to the last week inclusive, missing weeks as zero.
pub fn fill_weekly_gaps(totals: Vec<WeeklyTotal>) -> Vec<WeeklyTotal> {
    let by_week: BTreeMap<NaiveDate, f64> = totals
        .iter()
        .map(|w| (time::week_start(w.week_start), w.total))
        .collect();
    let (Some(first), Some(last)) = (by_week.keys().next(), by_week.keys().next_back()) else {
        return Vec::new();
    };

    let mut filled = Vec::new();
    let mut week_start = *first;
    while week_start <= *last {
        filled.push(WeeklyTotal {
            week_start,
            week_number: time::week_number(week_start),
            total: by_week.get(&week_start).copied().unwrap_or(0.0),
        });
        week_start += Duration::weeks(1);
    }
    filled
}

#[derive(Parser, Debug)]
#[clap(name = "audit", about = "Audit the journal for ordering and range anomalies")]
pub struct AuditCli {
    #[clap(subcommand)]
    pub command: AuditCommand,
    /// Output format: 'text' or 'json'.
    #[clap(long, default_value = "text", global = true)]
    pub format: String,
}

#[derive(Subcommand, Debug)]
pub enum AuditCommand {
    /// Entries whose timestamp runs backwards against insertion order.
    Ordering,
    /// Days with too little or too much water.
    Water,
    /// Weeks with too few or too many cut branches.
    Cuts,
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "audit",
        "version": "0.1.0",
        "description": "Read-only ordering and range audits over the care journal",
        "commands": [
            { "name": "ordering", "description": "Flag entries inserted out of time order" },
            { "name": "water", "description": "Flag days outside the daily water bounds" },
            { "name": "cuts", "description": "Flag weeks outside the weekly branch bounds" }
        ],
        "storage": ["journal.db"]
    })
}
