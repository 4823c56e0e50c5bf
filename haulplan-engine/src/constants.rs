//! Centralized regulatory and trip constants for the haulplan engine.
//!
//! Defaults for 49 CFR §395 property-carrying drivers on the 70-hour/8-day
//! cycle. `HosRules` and `TripInput` read their serde defaults from here.

// Hours-of-service limits ---------------------------------------------------
pub(crate) const MAX_DRIVING_HRS: f64 = 11.0;
pub(crate) const DUTY_WINDOW_HRS: f64 = 14.0;
pub(crate) const MIN_OFF_DUTY_HRS: f64 = 10.0;
pub(crate) const BREAK_AFTER_HRS: f64 = 8.0;
pub(crate) const BREAK_DURATION_HRS: f64 = 0.5;
pub(crate) const MAX_CYCLE_HRS: f64 = 70.0;
pub(crate) const CYCLE_DAYS: u8 = 8;

// Trip defaults -------------------------------------------------------------
pub(crate) const AVG_SPEED_MPH: f64 = 55.0;
pub(crate) const FUEL_INTERVAL_MI: f64 = 1_000.0;
pub(crate) const PICKUP_DURATION_HRS: f64 = 1.0;
pub(crate) const DROPOFF_DURATION_HRS: f64 = 1.0;
pub(crate) const DAY_START_HOUR: f64 = 6.0;
pub(crate) const HOURS_PER_DAY: f64 = 24.0;

// Numeric tolerances ----------------------------------------------------------
/// Hours below this are treated as zero when comparing against a limit.
pub(crate) const HOURS_EPSILON: f64 = 1e-9;
/// Miles below this count as "arrived".
pub(crate) const MILES_EPSILON: f64 = 1e-6;
/// Tolerance used by the audit pass when re-checking accumulated sums.
pub(crate) const AUDIT_TOLERANCE: f64 = 1e-6;

// Segment notes ---------------------------------------------------------------
pub(crate) const NOTE_PRE_SHIFT: &str = "Off duty";
pub(crate) const NOTE_PICKUP: &str = "Pickup";
pub(crate) const NOTE_DROPOFF: &str = "Dropoff";
pub(crate) const NOTE_DRIVING: &str = "Driving";
pub(crate) const NOTE_BREAK: &str = "30-min break";
pub(crate) const NOTE_RESET: &str = "10-hr reset";
pub(crate) const NOTE_TRIP_COMPLETE: &str = "Off duty - trip complete";

// Step budget -----------------------------------------------------------------
/// Fixed headroom added to the derived step budget.
pub(crate) const STEP_BUDGET_HEADROOM: usize = 64;
/// Steps allotted per expected shift / fuel cycle when deriving the budget.
pub(crate) const STEPS_PER_CYCLE: usize = 8;
