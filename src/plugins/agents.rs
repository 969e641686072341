//! The two care robots.
//!
//! Agents ask the journal how much is still due, act, and record what they did.
//! Their tank level and ids live in memory only.

use crate::core::entry::{ActionKind, JournalEntry, NewEntry};
use crate::core::error::ArboristError;
use crate::plugins::journal::Journal;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub enum WaterOutcome {
    Watered { entry: JournalEntry },
    /// Today's allowance is already used up.
    AlreadySatisfied,
    InsufficientSupply { required: f64, available: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum CutOutcome {
    Cut { entry: JournalEntry },
    NothingToDo,
}

#[derive(Debug, Clone)]
pub struct WaterAgent {
    robot_id: String,
    tank_capacity: f64,
    current_level: f64,
}

impl WaterAgent {
    /// A new agent starts with a full tank.
    pub fn new(robot_id: impl Into<String>, tank_capacity: f64) -> Result<Self, ArboristError> {
        validate_capacity(tank_capacity)?;
        Ok(Self {
            robot_id: robot_id.into(),
            tank_capacity,
            current_level: tank_capacity,
        })
    }

    pub fn robot_id(&self) -> &str {
        &self.robot_id
    }

    pub fn tank_capacity(&self) -> f64 {
        self.tank_capacity
    }

    pub fn water_level(&self) -> f64 {
        self.current_level
    }

    /// Change the tank size. The current level is capped at the new capacity.
    pub fn set_tank_capacity(&mut self, tank_capacity: f64) -> Result<(), ArboristError> {
        validate_capacity(tank_capacity)?;
        self.tank_capacity = tank_capacity;
        self.current_level = self.current_level.min(tank_capacity);
        Ok(())
    }

    pub fn refill(&mut self) {
        self.current_level = self.tank_capacity;
    }

    /// Pour whatever is still due today, if the tank holds enough.
    pub fn water_if_due(
        &mut self,
        journal: &Journal,
        now: DateTime<Utc>,
    ) -> Result<WaterOutcome, ArboristError> {
        let required = journal.water_quota(now)?;
        if required <= 0.0 {
            return Ok(WaterOutcome::AlreadySatisfied);
        }
        if required > self.current_level {
            return Ok(WaterOutcome::InsufficientSupply {
                required,
                available: self.current_level,
            });
        }

        let entry = journal.record_action(
            ActionKind::Water,
            &NewEntry::new(self.robot_id.clone(), now, required),
        )?;
        self.current_level -= required;
        Ok(WaterOutcome::Watered { entry })
    }
}

fn validate_capacity(tank_capacity: f64) -> Result<(), ArboristError> {
    if tank_capacity.is_finite() && tank_capacity > 0.0 {
        Ok(())
    } else {
        Err(ArboristError::InvalidConfiguration(format!(
            "tank capacity must be > 0, got {}",
            tank_capacity
        )))
    }
}

#[derive(Debug, Clone)]
pub struct CutAgent {
    robot_id: String,
}

impl CutAgent {
    pub fn new(robot_id: impl Into<String>) -> Self {
        Self {
            robot_id: robot_id.into(),
        }
    }

    pub fn robot_id(&self) -> &str {
        &self.robot_id
    }

    /// Cut exactly the branches still due this week.
    pub fn cut_if_due(
        &self,
        journal: &Journal,
        now: DateTime<Utc>,
    ) -> Result<CutOutcome, ArboristError> {
        let remaining = journal.cut_quota(now)?;
        if remaining <= 0 {
            return Ok(CutOutcome::NothingToDo);
        }
        let entry = journal.record_action(
            ActionKind::Cut,
            &NewEntry::new(self.robot_id.clone(), now, remaining as f64),
        )?;
        Ok(CutOutcome::Cut { entry })
    }
}
