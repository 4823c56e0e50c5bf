//! Planned trip inputs.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    AVG_SPEED_MPH, DAY_START_HOUR, DROPOFF_DURATION_HRS, HOURS_PER_DAY, MILES_EPSILON,
    PICKUP_DURATION_HRS,
};
use crate::rules::HosRules;

/// Driver and carrier labels carried through to reports. No effect on scheduling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverMeta {
    #[serde(default)]
    pub driver_name: String,
    #[serde(default)]
    pub carrier_name: String,
}

/// A planned trip as handed over by the routing collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripInput {
    pub distance_mi: f64,
    #[serde(default = "TripInput::default_avg_speed_mph")]
    pub avg_speed_mph: f64,
    #[serde(alias = "cycle_hours_used")]
    pub cycle_hours_used_start: f64,
    #[serde(default = "TripInput::default_pickup_hrs")]
    pub pickup_hrs: f64,
    #[serde(default = "TripInput::default_dropoff_hrs")]
    pub dropoff_hrs: f64,
    /// Hour of day 1 at which the driver comes on duty.
    #[serde(default = "TripInput::default_start_hour_of_day")]
    pub start_hour_of_day: f64,
    /// Router's own drive-time estimate; informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_s: Option<f64>,
    #[serde(default)]
    pub driver: DriverMeta,
}

/// Input rejected before simulation starts.
#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("distance must be a positive number of miles (got {0})")]
    NonPositiveDistance(f64),
    #[error("average speed must be a positive number of mph (got {0})")]
    NonPositiveSpeed(f64),
    #[error("cycle hours used must be between 0 and {limit} (got {value})")]
    CycleOutOfRange { value: f64, limit: f64 },
    #[error("{field} must be a positive number of hours (got {value})")]
    NonPositiveDuration { field: &'static str, value: f64 },
    #[error("{field} of {value} hours does not fit the {limit}-hour duty window")]
    HandlingExceedsWindow {
        field: &'static str,
        value: f64,
        limit: f64,
    },
    #[error("start hour must be within [0, 24) (got {0})")]
    StartHourOutOfRange(f64),
}

impl TripInput {
    const fn default_avg_speed_mph() -> f64 {
        AVG_SPEED_MPH
    }

    const fn default_pickup_hrs() -> f64 {
        PICKUP_DURATION_HRS
    }

    const fn default_dropoff_hrs() -> f64 {
        DROPOFF_DURATION_HRS
    }

    const fn default_start_hour_of_day() -> f64 {
        DAY_START_HOUR
    }

    /// Trip with the standard speed, pickup/dropoff and 06:00 start.
    #[must_use]
    pub fn new(distance_mi: f64, cycle_hours_used: f64) -> Self {
        Self {
            distance_mi,
            avg_speed_mph: Self::default_avg_speed_mph(),
            cycle_hours_used_start: cycle_hours_used,
            pickup_hrs: Self::default_pickup_hrs(),
            dropoff_hrs: Self::default_dropoff_hrs(),
            start_hour_of_day: Self::default_start_hour_of_day(),
            duration_s: None,
            driver: DriverMeta::default(),
        }
    }

    #[must_use]
    pub const fn with_avg_speed(mut self, mph: f64) -> Self {
        self.avg_speed_mph = mph;
        self
    }

    #[must_use]
    pub const fn with_start_hour(mut self, hour_of_day: f64) -> Self {
        self.start_hour_of_day = hour_of_day;
        self
    }

    #[must_use]
    pub const fn with_handling(mut self, pickup_hrs: f64, dropoff_hrs: f64) -> Self {
        self.pickup_hrs = pickup_hrs;
        self.dropoff_hrs = dropoff_hrs;
        self
    }

    #[must_use]
    pub const fn with_duration_s(mut self, duration_s: f64) -> Self {
        self.duration_s = Some(duration_s);
        self
    }

    #[must_use]
    pub fn with_driver(mut self, driver_name: &str, carrier_name: &str) -> Self {
        self.driver = DriverMeta {
            driver_name: driver_name.to_string(),
            carrier_name: carrier_name.to_string(),
        };
        self
    }

    /// Hours of driving the trip needs at the assumed speed.
    #[must_use]
    pub fn driving_hours(&self) -> f64 {
        self.distance_mi / self.avg_speed_mph
    }

    /// Reject inputs the engine cannot schedule.
    ///
    /// # Errors
    ///
    /// Returns the first failed check.
    pub fn validate(&self, rules: &HosRules) -> Result<(), InputError> {
        if !self.distance_mi.is_finite() || self.distance_mi <= MILES_EPSILON {
            return Err(InputError::NonPositiveDistance(self.distance_mi));
        }
        if !self.avg_speed_mph.is_finite() || self.avg_speed_mph <= 0.0 {
            return Err(InputError::NonPositiveSpeed(self.avg_speed_mph));
        }
        let cycle = self.cycle_hours_used_start;
        if !cycle.is_finite() || !(0.0..=rules.cycle_limit_hrs).contains(&cycle) {
            return Err(InputError::CycleOutOfRange {
                value: cycle,
                limit: rules.cycle_limit_hrs,
            });
        }
        for (field, value) in [
            ("pickup_hrs", self.pickup_hrs),
            ("dropoff_hrs", self.dropoff_hrs),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(InputError::NonPositiveDuration { field, value });
            }
            if value > rules.duty_window_hrs {
                return Err(InputError::HandlingExceedsWindow {
                    field,
                    value,
                    limit: rules.duty_window_hrs,
                });
            }
        }
        let start = self.start_hour_of_day;
        if !start.is_finite() || !(0.0..HOURS_PER_DAY).contains(&start) {
            return Err(InputError::StartHourOutOfRange(start));
        }
        Ok(())
    }
}
