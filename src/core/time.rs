//! Shared timestamp helpers for journal rows and command envelopes.
//!
//! All calendar math is UTC: a "day" is a UTC calendar date and a "week" starts
//! on the UTC Monday on or before a given date.

use crate::core::error::ArboristError;
use chrono::{DateTime, Datelike, Duration, NaiveDate, SecondsFormat, Utc};
use serde_json::Value as JsonValue;
use ulid::Ulid;

/// Returns unix-epoch seconds with `Z` suffix (e.g. `1771220592Z`).
pub fn now_epoch_z() -> String {
    format!("{}Z", Utc::now().timestamp())
}

pub fn new_event_id() -> String {
    Ulid::new().to_string()
}

/// Fixed-width RFC 3339 rendering used for the `timestamp` column.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ArboristError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| ArboristError::ValidationError(format!("bad timestamp '{}': {}", raw, e)))
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, ArboristError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| ArboristError::ValidationError(format!("bad date '{}': {}", raw, e)))
}

/// Midnight UTC of the day containing `ts`.
pub fn start_of_day(ts: &DateTime<Utc>) -> DateTime<Utc> {
    ts.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc())
        .unwrap_or(*ts)
}

/// Monday on or before `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Midnight UTC of the Monday starting the week that contains `ts`.
pub fn start_of_week(ts: &DateTime<Utc>) -> DateTime<Utc> {
    let today = start_of_day(ts);
    today - Duration::days(i64::from(today.weekday().num_days_from_monday()))
}

/// ISO week number of the week starting at `monday`.
pub fn week_number(monday: NaiveDate) -> u32 {
    monday.iso_week().week()
}

/// Standard command response envelope shape used by `--format json`.
pub fn command_envelope(cmd: &str, status: &str, extra: JsonValue) -> JsonValue {
    let mut base = serde_json::json!({
        "envelope_version": "1.0.0",
        "ts": now_epoch_z(),
        "event_id": new_event_id(),
        "cmd": cmd,
        "status": status
    });
    if let (Some(base_obj), Some(extra_obj)) = (base.as_object_mut(), extra.as_object()) {
        for (k, v) in extra_obj {
            base_obj.insert(k.clone(), v.clone());
        }
    }
    base
}
