//! Planning outcomes that are not a schedule.
use thiserror::Error;

use crate::audit::InvariantViolation;
use crate::rules::RulesError;
use crate::trip::InputError;

#[derive(Debug, Error, PartialEq)]
pub enum PlanningError {
    #[error("invalid trip input: {0}")]
    InvalidInput(#[from] InputError),
    #[error("invalid hours-of-service rules: {0}")]
    InvalidRules(#[from] RulesError),
    /// The 70-hour cycle would run out before the trip is delivered.
    #[error(
        "{limit:.1}-hour cycle exhausted on day {day} at hour {at_hour:.2} \
         ({cycle_hours:.2} h would be used, {miles_completed:.1} mi completed)"
    )]
    CycleExceeded {
        at_hour: f64,
        day: u32,
        cycle_hours: f64,
        limit: f64,
        miles_completed: f64,
    },
    #[error("internal invariant violated: {0}")]
    InternalInvariantViolation(#[from] InvariantViolation),
}

impl PlanningError {
    /// True when the caller can fix the request and try again.
    #[must_use]
    pub const fn is_user_correctable(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::InvalidRules(_))
    }

    #[must_use]
    pub const fn is_cycle_exceeded(&self) -> bool {
        matches!(self, Self::CycleExceeded { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_helpers() {
        let err = PlanningError::from(InputError::NonPositiveDistance(0.0));
        assert!(err.is_user_correctable());
        assert!(!err.is_cycle_exceeded());

        let err = PlanningError::CycleExceeded {
            at_hour: 9.0,
            day: 1,
            cycle_hours: 70.5,
            limit: 70.0,
            miles_completed: 110.0,
        };
        assert!(err.is_cycle_exceeded());
        assert!(!err.is_user_correctable());
        let msg = err.to_string();
        assert!(msg.contains("70.0-hour cycle exhausted on day 1"), "{msg}");
    }
}
