//! Hours-of-service rule engine.
//!
//! [`RuleEngine`] is a forward-only generator of [`EngineStep`]s. It owns its
//! [`DutyClock`] and the trip progress; nothing is shared between runs, and
//! re-running with the same input reproduces the same stream.

pub mod event;
mod kernel;

pub use event::{EngineStep, ShiftEndReason, Trigger};

use crate::audit::InvariantViolation;
use crate::clock::DutyClock;
use crate::constants::{
    HOURS_EPSILON, HOURS_PER_DAY, NOTE_BREAK, NOTE_DRIVING, NOTE_DROPOFF, NOTE_PICKUP,
    NOTE_PRE_SHIFT, NOTE_RESET, NOTE_TRIP_COMPLETE, STEP_BUDGET_HEADROOM, STEPS_PER_CYCLE,
};
use crate::duty::{DutySegment, DutyStatus};
use crate::error::PlanningError;
use crate::numbers::{ceil_f64_to_usize, floor_f64_to_u32};
use crate::rules::HosRules;
use crate::trip::TripInput;
use kernel::{Binding, DriveAction, DrivingKernel};

/// Lifecycle of a single trip simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    /// Off duty from midnight until the driver's start hour.
    Opening,
    Pickup,
    Driving,
    Dropoff,
    /// Off duty through the end of the final day.
    Closing,
    Finished,
}

#[derive(Debug, Clone)]
pub struct RuleEngine<'a> {
    input: &'a TripInput,
    rules: &'a HosRules,
    clock: DutyClock,
    phase: EnginePhase,
    status: DutyStatus,
    now: f64,
    remaining_mi: f64,
    steps_taken: usize,
    step_budget: usize,
    halted: bool,
}

impl<'a> RuleEngine<'a> {
    /// Validate the rules and trip, then position the engine at midnight of day 1.
    ///
    /// # Errors
    ///
    /// Returns [`PlanningError::InvalidRules`] or [`PlanningError::InvalidInput`].
    pub fn new(input: &'a TripInput, rules: &'a HosRules) -> Result<Self, PlanningError> {
        rules.validate()?;
        input.validate(rules)?;
        Ok(Self {
            input,
            rules,
            clock: DutyClock::new(input.cycle_hours_used_start),
            phase: EnginePhase::Opening,
            status: DutyStatus::OffDuty,
            now: 0.0,
            remaining_mi: input.distance_mi,
            steps_taken: 0,
            step_budget: step_budget(input, rules),
            halted: false,
        })
    }

    #[must_use]
    pub const fn phase(&self) -> EnginePhase {
        self.phase
    }

    /// Status of the most recently committed segment.
    #[must_use]
    pub const fn status(&self) -> DutyStatus {
        self.status
    }

    #[must_use]
    pub const fn clock(&self) -> &DutyClock {
        &self.clock
    }

    fn advance(&mut self) -> Result<EngineStep, PlanningError> {
        match self.phase {
            EnginePhase::Opening => Ok(self.open_day()),
            EnginePhase::Pickup => self.pickup(),
            EnginePhase::Driving => self.drive_step(),
            EnginePhase::Dropoff => self.dropoff(),
            EnginePhase::Closing => Ok(self.close_trip()),
            EnginePhase::Finished => Err(InvariantViolation::EngineFinished.into()),
        }
    }

    fn open_day(&mut self) -> EngineStep {
        self.phase = EnginePhase::Pickup;
        let start = self.input.start_hour_of_day;
        if start <= HOURS_EPSILON {
            return self.step(self.now, None, None);
        }
        let segment = self.commit_rest(DutyStatus::OffDuty, start, NOTE_PRE_SHIFT);
        self.step(0.0, Some(segment), None)
    }

    fn pickup(&mut self) -> Result<EngineStep, PlanningError> {
        let at = self.now;
        let segment = self.commit_on_duty(self.input.pickup_hrs, NOTE_PICKUP)?;
        self.phase = EnginePhase::Driving;
        Ok(self.step(at, Some(segment), None))
    }

    fn drive_step(&mut self) -> Result<EngineStep, PlanningError> {
        let kernel = DrivingKernel::new(self.rules, self.input.avg_speed_mph);
        let at = self.now;
        match kernel.next_action(&self.clock, self.remaining_mi) {
            DriveAction::Arrive => {
                self.remaining_mi = 0.0;
                self.phase = EnginePhase::Dropoff;
                Ok(self.step(at, None, None))
            }
            DriveAction::TakeBreak => {
                let segment = self.commit_rest(
                    self.rules.break_status,
                    self.rules.break_duration_hrs,
                    NOTE_BREAK,
                );
                self.clock.reset_break();
                log::trace!("30-minute break at hour {at:.3}");
                Ok(self.step(at, Some(segment), Some(Trigger::Break)))
            }
            DriveAction::Refuel => {
                self.clock.reset_fuel();
                log::trace!(
                    "fuel stop at hour {at:.3} ({:.1} mi)",
                    self.clock.miles_traveled
                );
                Ok(self.step(at, None, Some(Trigger::Fuel)))
            }
            DriveAction::EndShift(reason) => Ok(self.end_shift(reason)),
            DriveAction::Drive {
                hours,
                miles,
                binding,
            } => {
                let segment = self.commit_driving(hours, miles)?;
                if binding == Binding::Destination {
                    self.remaining_mi = 0.0;
                }
                log::trace!("driving capped by {binding:?}");
                Ok(self.step(at, Some(segment), None))
            }
        }
    }

    fn dropoff(&mut self) -> Result<EngineStep, PlanningError> {
        let at = self.now;
        let needed = self.input.dropoff_hrs;
        if self.clock.window_open
            && self.clock.hours_until_window_close(self.rules) + HOURS_EPSILON < needed
        {
            return Ok(self.end_shift(ShiftEndReason::DropoffOverflow));
        }
        let segment = self.commit_on_duty(needed, NOTE_DROPOFF)?;
        self.phase = EnginePhase::Closing;
        Ok(self.step(at, Some(segment), None))
    }

    fn close_trip(&mut self) -> EngineStep {
        self.phase = EnginePhase::Finished;
        let at = self.now;
        let into_day = at - (at / HOURS_PER_DAY).floor() * HOURS_PER_DAY;
        if into_day <= HOURS_EPSILON {
            return self.step(at, None, Some(Trigger::TripEnd));
        }
        let segment = self.commit_rest(
            DutyStatus::OffDuty,
            HOURS_PER_DAY - into_day,
            NOTE_TRIP_COMPLETE,
        );
        self.step(at, Some(segment), Some(Trigger::TripEnd))
    }

    fn end_shift(&mut self, reason: ShiftEndReason) -> EngineStep {
        let at = self.now;
        let segment = self.commit_rest(
            self.rules.reset_status,
            self.rules.min_off_duty_hrs,
            NOTE_RESET,
        );
        log::debug!("shift ended at hour {at:.3} ({reason:?})");
        self.step(at, Some(segment), Some(Trigger::ShiftEnd(reason)))
    }

    /// Commit a rest segment of `hours`.
    fn commit_rest(&mut self, status: DutyStatus, hours: f64, note: &str) -> DutySegment {
        debug_assert!(status.is_rest());
        self.clock.advance_off_duty(hours, self.rules.min_off_duty_hrs);
        self.push_segment(DutySegment::new(status, self.now, self.now + hours, note))
    }

    fn commit_on_duty(&mut self, hours: f64, note: &str) -> Result<DutySegment, PlanningError> {
        self.check_cycle(hours)?;
        self.clock.advance_on_duty(hours);
        Ok(self.push_segment(DutySegment::new(
            DutyStatus::OnDuty,
            self.now,
            self.now + hours,
            note,
        )))
    }

    fn commit_driving(&mut self, hours: f64, miles: f64) -> Result<DutySegment, PlanningError> {
        if hours <= 0.0 || miles < 0.0 {
            return Err(InvariantViolation::NonPositiveDuration {
                at_hour: self.now,
                hours,
            }
            .into());
        }
        self.check_cycle(hours)?;
        self.clock.advance_driving(hours, miles);
        self.remaining_mi = (self.remaining_mi - miles).max(0.0);
        Ok(self.push_segment(DutySegment::driving(
            self.now,
            self.now + hours,
            miles,
            NOTE_DRIVING,
        )))
    }

    fn check_cycle(&self, hours: f64) -> Result<(), PlanningError> {
        let projected = self.clock.cycle_hrs_used + hours;
        if projected <= self.rules.cycle_limit_hrs + HOURS_EPSILON {
            return Ok(());
        }
        let day = floor_f64_to_u32(self.now / HOURS_PER_DAY) + 1;
        log::warn!(
            "cycle limit {:.1} h reached on day {day}: {projected:.2} h projected",
            self.rules.cycle_limit_hrs
        );
        Err(PlanningError::CycleExceeded {
            at_hour: self.now,
            day,
            cycle_hours: projected,
            limit: self.rules.cycle_limit_hrs,
            miles_completed: self.clock.miles_traveled,
        })
    }

    fn push_segment(&mut self, segment: DutySegment) -> DutySegment {
        log::debug!(
            "{} {:.3}-{:.3} h {}",
            segment.status,
            segment.start_hour,
            segment.end_hour,
            segment.note.as_deref().unwrap_or_default()
        );
        self.now = segment.end_hour;
        self.status = segment.status;
        segment
    }

    fn step(
        &self,
        at_hour: f64,
        segment: Option<DutySegment>,
        trigger: Option<Trigger>,
    ) -> EngineStep {
        EngineStep {
            at_hour,
            segment,
            trigger,
            clock: self.clock,
            remaining_mi: self.remaining_mi,
        }
    }
}

impl Iterator for RuleEngine<'_> {
    type Item = Result<EngineStep, PlanningError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.halted || self.phase == EnginePhase::Finished {
            return None;
        }
        self.steps_taken += 1;
        if self.steps_taken > self.step_budget {
            self.halted = true;
            return Some(Err(InvariantViolation::StepBudgetExhausted {
                budget: self.step_budget,
            }
            .into()));
        }
        let result = self.advance();
        if result.is_err() {
            self.halted = true;
        }
        Some(result)
    }
}

/// Upper bound on steps for a trip; generous relative to the number of
/// fuel cycles and break cycles the distance implies.
fn step_budget(input: &TripInput, rules: &HosRules) -> usize {
    let fuel_cycles = ceil_f64_to_usize(input.distance_mi / rules.fuel_interval_mi);
    let per_break = rules.break_after_hrs.min(rules.max_driving_hrs);
    let break_cycles = ceil_f64_to_usize(input.driving_hours() / per_break);
    (fuel_cycles + break_cycles + 1) * STEPS_PER_CYCLE + STEP_BUDGET_HEADROOM
}
