//! One care cycle per robot invocation.
//!
//! The water cycle owns the refill policy: on a short tank it refills once and
//! tries once more. Any second shortfall becomes `InsufficientSupply`.

use crate::core::error::ArboristError;
use crate::plugins::agents::{CutAgent, CutOutcome, WaterAgent, WaterOutcome};
use crate::plugins::journal::Journal;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct WaterCycleReport {
    pub outcome: WaterOutcome,
    pub refilled: bool,
}

pub fn run_cut_cycle(
    journal: &Journal,
    robot_id: &str,
    now: DateTime<Utc>,
) -> Result<CutOutcome, ArboristError> {
    CutAgent::new(robot_id).cut_if_due(journal, now)
}

pub fn run_water_cycle(
    journal: &Journal,
    agent: &mut WaterAgent,
    now: DateTime<Utc>,
) -> Result<WaterCycleReport, ArboristError> {
    match agent.water_if_due(journal, now)? {
        WaterOutcome::InsufficientSupply { .. } => {
            agent.refill();
            match agent.water_if_due(journal, now)? {
                WaterOutcome::InsufficientSupply {
                    required,
                    available,
                } => Err(ArboristError::InsufficientSupply {
                    required,
                    available,
                }),
                outcome => Ok(WaterCycleReport {
                    outcome,
                    refilled: true,
                }),
            }
        }
        outcome => Ok(WaterCycleReport {
            outcome,
            refilled: false,
        }),
    }
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "cycles",
        "version": "0.1.0",
        "description": "Run one cut or water cycle against the care journal",
        "commands": [
            { "name": "cut", "parameters": ["robot_id"] },
            { "name": "water", "parameters": ["robot_id", "capacity"] }
        ],
        "storage": ["journal.db", "journal.events.jsonl"]
    })
}
