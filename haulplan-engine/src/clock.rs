//! Accumulated hours-of-service budgets for a simulation in progress.
use serde::{Deserialize, Serialize};

use crate::constants::HOURS_EPSILON;
use crate::rules::HosRules;

/// Pure accumulator of the budgets the rule engine consults.
///
/// The clock never fails and never clamps; limit checks belong to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DutyClock {
    pub driving_hrs_this_shift: f64,
    /// Hours elapsed since the shift's first on-duty minute, breaks included.
    pub duty_hrs_this_window: f64,
    pub driving_hrs_since_break: f64,
    pub cycle_hrs_used: f64,
    pub miles_since_fuel: f64,
    pub miles_traveled: f64,
    /// Contiguous off-duty/sleeper hours ending now.
    pub rest_streak_hrs: f64,
    /// Whether the 14-hour window has been opened by on-duty time.
    pub window_open: bool,
}

impl DutyClock {
    #[must_use]
    pub fn new(cycle_hrs_used: f64) -> Self {
        Self {
            cycle_hrs_used,
            ..Self::default()
        }
    }

    pub fn advance_driving(&mut self, hours: f64, miles: f64) {
        self.driving_hrs_this_shift += hours;
        self.driving_hrs_since_break += hours;
        self.miles_since_fuel += miles;
        self.miles_traveled += miles;
        self.charge_on_duty(hours);
    }

    pub fn advance_on_duty(&mut self, hours: f64) {
        self.charge_on_duty(hours);
    }

    /// Off-duty or sleeper time. Resets the shift once the contiguous rest
    /// block reaches `reset_after_hrs`; the cycle is never reset.
    pub fn advance_off_duty(&mut self, hours: f64, reset_after_hrs: f64) {
        self.rest_streak_hrs += hours;
        if self.window_open {
            self.duty_hrs_this_window += hours;
        }
        if self.rest_streak_hrs + HOURS_EPSILON >= reset_after_hrs {
            self.driving_hrs_this_shift = 0.0;
            self.duty_hrs_this_window = 0.0;
            self.driving_hrs_since_break = 0.0;
            self.window_open = false;
        }
    }

    pub const fn reset_break(&mut self) {
        self.driving_hrs_since_break = 0.0;
    }

    pub const fn reset_fuel(&mut self) {
        self.miles_since_fuel = 0.0;
    }

    fn charge_on_duty(&mut self, hours: f64) {
        self.duty_hrs_this_window += hours;
        self.cycle_hrs_used += hours;
        self.window_open = true;
        self.rest_streak_hrs = 0.0;
    }

    #[must_use]
    pub fn hours_until_break(&self, rules: &HosRules) -> f64 {
        rules.break_after_hrs - self.driving_hrs_since_break
    }

    #[must_use]
    pub fn hours_until_drive_limit(&self, rules: &HosRules) -> f64 {
        rules.max_driving_hrs - self.driving_hrs_this_shift
    }

    #[must_use]
    pub fn hours_until_window_close(&self, rules: &HosRules) -> f64 {
        rules.duty_window_hrs - self.duty_hrs_this_window
    }

    #[must_use]
    pub fn miles_until_fuel(&self, rules: &HosRules) -> f64 {
        rules.fuel_interval_mi - self.miles_since_fuel
    }

    #[must_use]
    pub fn cycle_hours_remaining(&self, rules: &HosRules) -> f64 {
        rules.cycle_limit_hrs - self.cycle_hrs_used
    }
}
