//! Hours-of-service rule configuration.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    BREAK_AFTER_HRS, BREAK_DURATION_HRS, CYCLE_DAYS, DUTY_WINDOW_HRS, FUEL_INTERVAL_MI,
    MAX_CYCLE_HRS, MAX_DRIVING_HRS, MIN_OFF_DUTY_HRS,
};
use crate::duty::DutyStatus;

/// Tunable limits applied by the rule engine.
///
/// Defaults are the property-carrying 70-hour/8-day rules. Every field can be
/// omitted from a JSON overlay and falls back to its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HosRules {
    #[serde(default = "HosRules::default_max_driving_hrs")]
    pub max_driving_hrs: f64,
    #[serde(default = "HosRules::default_duty_window_hrs")]
    pub duty_window_hrs: f64,
    #[serde(default = "HosRules::default_min_off_duty_hrs")]
    pub min_off_duty_hrs: f64,
    #[serde(default = "HosRules::default_break_after_hrs")]
    pub break_after_hrs: f64,
    #[serde(default = "HosRules::default_break_duration_hrs")]
    pub break_duration_hrs: f64,
    #[serde(default = "HosRules::default_cycle_limit_hrs")]
    pub cycle_limit_hrs: f64,
    #[serde(default = "HosRules::default_cycle_days")]
    pub cycle_days: u8,
    #[serde(default = "HosRules::default_fuel_interval_mi")]
    pub fuel_interval_mi: f64,
    /// Status logged for the 10-hour reset between shifts.
    #[serde(default = "HosRules::default_rest_status")]
    pub reset_status: DutyStatus,
    /// Status logged for the 30-minute break.
    #[serde(default = "HosRules::default_rest_status")]
    pub break_status: DutyStatus,
}

/// Errors raised when rule configuration invariants are violated.
#[derive(Debug, Error, PartialEq)]
pub enum RulesError {
    #[error("{field} must be a positive finite number (got {value})")]
    NotPositive { field: &'static str, value: f64 },
    #[error("{field} ({value:.2}) must not exceed {limit_field} ({limit:.2})")]
    ExceedsLimit {
        field: &'static str,
        value: f64,
        limit_field: &'static str,
        limit: f64,
    },
    #[error("{field} must be a rest status (off_duty or sleeper), got {status}")]
    NotRestStatus {
        field: &'static str,
        status: DutyStatus,
    },
    #[error("cycle_days must be at least 1")]
    ZeroCycleDays,
    #[error("rules JSON is malformed: {0}")]
    Parse(String),
}

impl HosRules {
    const fn default_max_driving_hrs() -> f64 {
        MAX_DRIVING_HRS
    }

    const fn default_duty_window_hrs() -> f64 {
        DUTY_WINDOW_HRS
    }

    const fn default_min_off_duty_hrs() -> f64 {
        MIN_OFF_DUTY_HRS
    }

    const fn default_break_after_hrs() -> f64 {
        BREAK_AFTER_HRS
    }

    const fn default_break_duration_hrs() -> f64 {
        BREAK_DURATION_HRS
    }

    const fn default_cycle_limit_hrs() -> f64 {
        MAX_CYCLE_HRS
    }

    const fn default_cycle_days() -> u8 {
        CYCLE_DAYS
    }

    const fn default_fuel_interval_mi() -> f64 {
        FUEL_INTERVAL_MI
    }

    const fn default_rest_status() -> DutyStatus {
        DutyStatus::OffDuty
    }

    /// Parse a JSON overlay and validate the result.
    ///
    /// # Errors
    ///
    /// Returns [`RulesError::Parse`] for malformed JSON, or the first
    /// validation failure.
    pub fn from_json(json: &str) -> Result<Self, RulesError> {
        let rules: Self =
            serde_json::from_str(json).map_err(|err| RulesError::Parse(err.to_string()))?;
        rules.validate()?;
        Ok(rules)
    }

    /// Check that the limits describe a schedulable rule set.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), RulesError> {
        let positives = [
            ("max_driving_hrs", self.max_driving_hrs),
            ("duty_window_hrs", self.duty_window_hrs),
            ("min_off_duty_hrs", self.min_off_duty_hrs),
            ("break_after_hrs", self.break_after_hrs),
            ("break_duration_hrs", self.break_duration_hrs),
            ("cycle_limit_hrs", self.cycle_limit_hrs),
            ("fuel_interval_mi", self.fuel_interval_mi),
        ];
        for (field, value) in positives {
            if !value.is_finite() || value <= 0.0 {
                return Err(RulesError::NotPositive { field, value });
            }
        }
        if self.cycle_days == 0 {
            return Err(RulesError::ZeroCycleDays);
        }
        if self.max_driving_hrs > self.duty_window_hrs {
            return Err(RulesError::ExceedsLimit {
                field: "max_driving_hrs",
                value: self.max_driving_hrs,
                limit_field: "duty_window_hrs",
                limit: self.duty_window_hrs,
            });
        }
        if self.break_duration_hrs >= self.min_off_duty_hrs {
            return Err(RulesError::ExceedsLimit {
                field: "break_duration_hrs",
                value: self.break_duration_hrs,
                limit_field: "min_off_duty_hrs",
                limit: self.min_off_duty_hrs,
            });
        }
        if self.duty_window_hrs > self.cycle_limit_hrs {
            return Err(RulesError::ExceedsLimit {
                field: "duty_window_hrs",
                value: self.duty_window_hrs,
                limit_field: "cycle_limit_hrs",
                limit: self.cycle_limit_hrs,
            });
        }
        for (field, status) in [
            ("reset_status", self.reset_status),
            ("break_status", self.break_status),
        ] {
            if !status.is_rest() {
                return Err(RulesError::NotRestStatus { field, status });
            }
        }
        Ok(())
    }
}

impl Default for HosRules {
    fn default() -> Self {
        Self {
            max_driving_hrs: Self::default_max_driving_hrs(),
            duty_window_hrs: Self::default_duty_window_hrs(),
            min_off_duty_hrs: Self::default_min_off_duty_hrs(),
            break_after_hrs: Self::default_break_after_hrs(),
            break_duration_hrs: Self::default_break_duration_hrs(),
            cycle_limit_hrs: Self::default_cycle_limit_hrs(),
            cycle_days: Self::default_cycle_days(),
            fuel_interval_mi: Self::default_fuel_interval_mi(),
            reset_status: Self::default_rest_status(),
            break_status: Self::default_rest_status(),
        }
    }
}
