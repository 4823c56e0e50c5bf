//! Fuel and rest stop records derived from engine triggers.
use serde::{Deserialize, Serialize};

use crate::audit::InvariantViolation;
use crate::constants::{AUDIT_TOLERANCE, HOURS_PER_DAY};
use crate::engine::{EngineStep, Trigger};
use crate::numbers::{floor_f64_to_u32, round_f64_to_u32, u32_to_f64};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopKind {
    Fuel,
    Rest,
}

impl std::fmt::Display for StopKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fuel => f.write_str("fuel"),
            Self::Rest => f.write_str("rest"),
        }
    }
}

/// Refuelling waypoint. Takes no schedule time of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelStop {
    pub day: u32,
    #[serde(rename = "time")]
    pub elapsed_hour_in_day: f64,
    pub time_str: String,
    /// Cumulative trip miles at the stop.
    pub miles_in: f64,
}

/// Mandatory 30-minute break.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestStop {
    pub day: u32,
    #[serde(rename = "time")]
    pub elapsed_hour_in_day: f64,
    pub time_str: String,
    pub miles_in: f64,
}

/// Calendar position of an absolute trip hour: 1-based day and hour of that day.
#[must_use]
pub fn locate_hour(at_hour: f64) -> (u32, f64) {
    let day_index = floor_f64_to_u32(at_hour / HOURS_PER_DAY);
    let hour_in_day = (at_hour - u32_to_f64(day_index) * HOURS_PER_DAY).max(0.0);
    (day_index + 1, hour_in_day)
}

/// Render an hour of the day as a 12-hour clock string such as `3:30 PM`.
///
/// Minutes are rounded; a rounded 60 carries into the hour and midnight
/// renders as `12:00 AM`.
#[must_use]
pub fn format_clock_time(hour_of_day: f64) -> String {
    let whole = floor_f64_to_u32(hour_of_day);
    let mut minutes = round_f64_to_u32((hour_of_day - u32_to_f64(whole)) * 60.0);
    let mut hour = whole;
    if minutes >= 60 {
        hour += 1;
        minutes = 0;
    }
    let hour = hour % 24;
    let period = if hour < 12 { "AM" } else { "PM" };
    let display = match hour {
        0 => 12,
        13.. => hour - 12,
        _ => hour,
    };
    format!("{display}:{minutes:02} {period}")
}

/// Collects stop records from the engine's trigger stream.
#[derive(Debug, Default)]
pub struct StopPlanner {
    fuel_stops: Vec<FuelStop>,
    rest_stops: Vec<RestStop>,
}

impl StopPlanner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a stop for break and fuel triggers; other steps are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`InvariantViolation::UnsortedStops`] when the step would
    /// place a stop before the previous one of the same kind.
    pub fn observe(&mut self, step: &EngineStep) -> Result<(), InvariantViolation> {
        let kind = match step.trigger {
            Some(Trigger::Fuel) => StopKind::Fuel,
            Some(Trigger::Break) => StopKind::Rest,
            Some(Trigger::ShiftEnd(_) | Trigger::TripEnd) | None => return Ok(()),
        };
        let (day, hour) = locate_hour(step.at_hour);
        let miles_in = step.clock.miles_traveled;
        let previous = match kind {
            StopKind::Fuel => self
                .fuel_stops
                .last()
                .map(|stop| (stop.day, stop.elapsed_hour_in_day, stop.miles_in)),
            StopKind::Rest => self
                .rest_stops
                .last()
                .map(|stop| (stop.day, stop.elapsed_hour_in_day, stop.miles_in)),
        };
        if let Some((prev_day, prev_hour, prev_miles)) = previous {
            let earlier =
                day < prev_day || (day == prev_day && hour + AUDIT_TOLERANCE < prev_hour);
            if earlier || miles_in + AUDIT_TOLERANCE < prev_miles {
                return Err(InvariantViolation::UnsortedStops { kind, day, hour });
            }
        }

        let time_str = format_clock_time(hour);
        log::trace!("{kind} stop day {day} {time_str} at {miles_in:.1} mi");
        match kind {
            StopKind::Fuel => self.fuel_stops.push(FuelStop {
                day,
                elapsed_hour_in_day: hour,
                time_str,
                miles_in,
            }),
            StopKind::Rest => self.rest_stops.push(RestStop {
                day,
                elapsed_hour_in_day: hour,
                time_str,
                miles_in,
            }),
        }
        Ok(())
    }

    #[must_use]
    pub fn fuel_stops(&self) -> &[FuelStop] {
        &self.fuel_stops
    }

    #[must_use]
    pub fn rest_stops(&self) -> &[RestStop] {
        &self.rest_stops
    }

    #[must_use]
    pub fn finish(self) -> (Vec<FuelStop>, Vec<RestStop>) {
        (self.fuel_stops, self.rest_stops)
    }
}
