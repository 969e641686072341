//! Remaining daily water and weekly cut allowances.
//!
//! Both answers are computed from the journal on every call. Nothing is cached,
//! so two robots checking at the same moment can both see quota left before
//! either records; the journal does not guard against that.

use crate::core::config::QuotaConfig;
use crate::core::error::ArboristError;
use crate::core::gateway::{Collection, Comparison, Field, MatchValue, StorageGateway};
use crate::core::time;
use chrono::{DateTime, Utc};

pub struct QuotaEngine<'a> {
    gateway: &'a StorageGateway,
    config: &'a QuotaConfig,
}

impl<'a> QuotaEngine<'a> {
    pub fn new(gateway: &'a StorageGateway, config: &'a QuotaConfig) -> Self {
        Self { gateway, config }
    }

    /// Liters still allowed today (UTC), never negative.
    pub fn remaining_water(&self, read_at: DateTime<Utc>) -> Result<f64, ArboristError> {
        let today = time::start_of_day(&read_at);
        let used = self.gateway.sum_where(
            Collection::WaterJournal,
            Field::Timestamp,
            &MatchValue::Timestamp(today),
            Field::WaterAmount,
            Some(Comparison::Gte),
        )?;
        Ok(clamp_remaining(self.config.max_water_per_day, used))
    }

    /// Branches still allowed this week (Monday 00:00 UTC onwards), never negative.
    pub fn remaining_cuts(&self, read_at: DateTime<Utc>) -> Result<i64, ArboristError> {
        let monday = time::start_of_week(&read_at);
        let used = self.gateway.sum_where(
            Collection::CutJournal,
            Field::Timestamp,
            &MatchValue::Timestamp(monday),
            Field::NumberOfBranches,
            Some(Comparison::Gte),
        )?;
        Ok(clamp_remaining(self.config.max_branches_per_week as f64, used) as i64)
    }
}

fn clamp_remaining(max: f64, used: f64) -> f64 {
    if used >= max { 0.0 } else { max - used }
}
