//! Per-step decision logic for the driving phase.

use crate::clock::DutyClock;
use crate::constants::{HOURS_EPSILON, MILES_EPSILON};
use crate::engine::event::ShiftEndReason;
use crate::rules::HosRules;

/// The threshold that capped a driving segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Binding {
    Destination,
    Break,
    Fuel,
    DrivingLimit,
    DutyWindow,
}

/// What the driving phase does next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum DriveAction {
    Arrive,
    TakeBreak,
    Refuel,
    EndShift(ShiftEndReason),
    Drive {
        hours: f64,
        miles: f64,
        binding: Binding,
    },
}

pub(crate) struct DrivingKernel<'a> {
    rules: &'a HosRules,
    speed_mph: f64,
}

impl<'a> DrivingKernel<'a> {
    pub(crate) const fn new(rules: &'a HosRules, speed_mph: f64) -> Self {
        Self { rules, speed_mph }
    }

    /// Decide the next action. Gates run in priority order
    /// arrive > break > fuel > driving limit > duty window > drive.
    pub(crate) fn next_action(&self, clock: &DutyClock, remaining_mi: f64) -> DriveAction {
        if remaining_mi <= MILES_EPSILON {
            return DriveAction::Arrive;
        }
        if let Some(action) = self.run_break_gate(clock) {
            return action;
        }
        if let Some(action) = self.run_fuel_gate(clock) {
            return action;
        }
        if let Some(action) = self.run_shift_gate(clock) {
            return action;
        }
        self.plan_drive(clock, remaining_mi)
    }

    fn run_break_gate(&self, clock: &DutyClock) -> Option<DriveAction> {
        (clock.hours_until_break(self.rules) <= HOURS_EPSILON).then_some(DriveAction::TakeBreak)
    }

    fn run_fuel_gate(&self, clock: &DutyClock) -> Option<DriveAction> {
        (clock.miles_until_fuel(self.rules) <= MILES_EPSILON).then_some(DriveAction::Refuel)
    }

    fn run_shift_gate(&self, clock: &DutyClock) -> Option<DriveAction> {
        if clock.hours_until_drive_limit(self.rules) <= HOURS_EPSILON {
            return Some(DriveAction::EndShift(ShiftEndReason::DrivingLimit));
        }
        if clock.hours_until_window_close(self.rules) <= HOURS_EPSILON {
            return Some(DriveAction::EndShift(ShiftEndReason::DutyWindow));
        }
        None
    }

    /// Drive up to the nearest threshold. Candidates are listed in tie-break
    /// order and only a strictly smaller value displaces an earlier one; the
    /// destination wins any tie so the trip never stops at its last mile.
    fn plan_drive(&self, clock: &DutyClock, remaining_mi: f64) -> DriveAction {
        let to_fuel_mi = clock.miles_until_fuel(self.rules);
        let candidates = [
            (Binding::Break, clock.hours_until_break(self.rules)),
            (Binding::Fuel, to_fuel_mi / self.speed_mph),
            (Binding::DrivingLimit, clock.hours_until_drive_limit(self.rules)),
            (Binding::DutyWindow, clock.hours_until_window_close(self.rules)),
        ];
        let (binding, hours) = candidates
            .into_iter()
            .fold(None, |best: Option<(Binding, f64)>, (binding, hours)| match best {
                Some((_, best_hours)) if best_hours <= hours => best,
                _ => Some((binding, hours)),
            })
            .unwrap_or((Binding::Destination, f64::INFINITY));

        let to_destination_hrs = remaining_mi / self.speed_mph;
        if to_destination_hrs <= hours {
            return DriveAction::Drive {
                hours: to_destination_hrs,
                miles: remaining_mi,
                binding: Binding::Destination,
            };
        }

        let miles = match binding {
            Binding::Fuel => to_fuel_mi,
            _ => hours * self.speed_mph,
        }
        .min(remaining_mi);
        DriveAction::Drive {
            hours,
            miles,
            binding,
        }
    }
}
