//! Structured steps emitted by the rule engine.
//!
//! Each step commits at most one duty segment and raises at most one trigger.
//! Triggers are advisory: they tell downstream consumers (the stop planner,
//! log output) why the engine changed course; they are never persisted state.

use serde::{Deserialize, Serialize};

use crate::clock::DutyClock;
use crate::duty::DutySegment;

/// Why a shift was closed with a full rest period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftEndReason {
    /// Shift driving reached the daily driving limit.
    DrivingLimit,
    /// The duty window closed.
    DutyWindow,
    /// Dropoff would not fit inside the remaining window.
    DropoffOverflow,
}

/// Advisory trigger raised by a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum Trigger {
    Break,
    Fuel,
    ShiftEnd(ShiftEndReason),
    TripEnd,
}

/// One transition of the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineStep {
    /// Absolute trip hour at which the step begins.
    pub at_hour: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment: Option<DutySegment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<Trigger>,
    /// Budgets after the step was applied.
    pub clock: DutyClock,
    pub remaining_mi: f64,
}

impl EngineStep {
    #[must_use]
    pub fn is_trip_end(&self) -> bool {
        matches!(self.trigger, Some(Trigger::TripEnd))
    }

    /// Absolute hour at which the step finishes.
    #[must_use]
    pub fn end_hour(&self) -> f64 {
        self.segment
            .as_ref()
            .map_or(self.at_hour, |segment| segment.end_hour)
    }
}
