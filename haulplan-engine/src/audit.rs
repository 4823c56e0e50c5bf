//! Independent re-verification of a planned schedule.
//!
//! The engine enforces every hours-of-service rule as it builds segments.
//! These checks run again over the finished output; any failure is an
//! [`InvariantViolation`].

use thiserror::Error;

use crate::constants::{AUDIT_TOLERANCE, HOURS_PER_DAY, NOTE_DROPOFF, NOTE_PICKUP};
use crate::day_accounting::DayLog;
use crate::duty::{DutySegment, DutyStatus};
use crate::result::ScheduleResult;
use crate::rules::HosRules;
use crate::stops::StopKind;
use crate::trip::TripInput;

/// Accounting failure detected while planning or auditing a schedule.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum InvariantViolation {
    #[error("rule engine advanced after the trip finished")]
    EngineFinished,
    #[error("rule engine exceeded its step budget of {budget}")]
    StepBudgetExhausted { budget: usize },
    #[error("schedule contains no segments")]
    EmptySchedule,
    #[error("segment at hour {at_hour:.4} has non-positive duration {hours}")]
    NonPositiveDuration { at_hour: f64, hours: f64 },
    #[error("schedule must start at hour 0 (starts at {start_hour:.4})")]
    LateStart { start_hour: f64 },
    #[error("gap or overlap at hour {at_hour:.4}: next segment starts at {next_start:.4}")]
    NotContiguous { at_hour: f64, next_start: f64 },
    #[error("driven miles {actual:.4} do not add up to the trip distance {expected:.4}")]
    MilesNotConserved { expected: f64, actual: f64 },
    #[error("trip has no driving time")]
    NoDriving,
    #[error("shift {shift} drives {hours:.4} h, over the {limit:.1} h limit")]
    ShiftDrivingExceeded { shift: u32, hours: f64, limit: f64 },
    #[error("shift {shift} spans {span:.4} h, over the {limit:.1} h duty window")]
    DutyWindowExceeded { shift: u32, span: f64, limit: f64 },
    #[error("{driving_hrs:.4} h driven without a break by hour {at_hour:.4} (limit {limit:.1} h)")]
    BreakOverdue {
        at_hour: f64,
        driving_hrs: f64,
        limit: f64,
    },
    #[error("cycle total {total:.4} h exceeds the {limit:.1} h limit")]
    CycleOverrun { total: f64, limit: f64 },
    #[error("pickup is not the on-duty segment right before the first drive (hour {at_hour:.4})")]
    MisplacedPickup { at_hour: f64 },
    #[error("dropoff is not the last on-duty segment after the final drive (hour {at_hour:.4})")]
    MisplacedDropoff { at_hour: f64 },
    #[error("{label} lasts {hours:.4} h, expected {expected:.4} h")]
    HandlingDuration {
        label: &'static str,
        hours: f64,
        expected: f64,
    },
    #[error("day {day_num} is out of sequence (expected day {expected})")]
    DayOutOfSequence { day_num: u32, expected: u32 },
    #[error("day {day_num} accounts for {hours:.4} h instead of a full day")]
    DayHoursMismatch { day_num: u32, hours: f64 },
    #[error("day {day_num} timeline is broken at {at_hour:.4}")]
    TimelineBroken { day_num: u32, at_hour: f64 },
    #[error("day {day_num} {status} total does not match its timeline")]
    TotalsMismatch { day_num: u32, status: DutyStatus },
    #[error("trip stats field {field} disagrees with the day logs")]
    StatsMismatch { field: &'static str },
    #[error("{kind} stop on day {day} at {hour:.4} is out of order")]
    UnsortedStops { kind: StopKind, day: u32, hour: f64 },
    #[error("fuel gap {from_mi:.2} -> {to_mi:.2} mi exceeds the {limit:.1} mi interval")]
    FuelCadence { from_mi: f64, to_mi: f64, limit: f64 },
    #[error("fuel stop at {miles_in:.2} mi is not before the destination ({total:.2} mi)")]
    FuelPastDestination { miles_in: f64, total: f64 },
}

/// Check a raw segment stream: contiguity, conservation, shift limits,
/// break cadence, pickup/dropoff placement and the cycle total.
///
/// # Errors
///
/// Returns the first violated invariant.
pub fn audit_segments(
    segments: &[DutySegment],
    input: &TripInput,
    rules: &HosRules,
) -> Result<(), InvariantViolation> {
    check_contiguity(segments)?;
    check_miles(segments, input)?;
    check_shifts(segments, rules)?;
    check_breaks(segments, rules)?;
    check_bookends(segments, input)?;
    check_cycle(
        segments
            .iter()
            .filter(|segment| segment.status.is_on_duty())
            .map(DutySegment::duration)
            .sum(),
        input,
        rules,
    )
}

/// Check a folded schedule: day boundaries, per-day totals, stop ordering,
/// fuel cadence and agreement between the trip stats and the days.
///
/// # Errors
///
/// Returns the first violated invariant.
pub fn audit_schedule(
    result: &ScheduleResult,
    input: &TripInput,
    rules: &HosRules,
) -> Result<(), InvariantViolation> {
    if result.days.is_empty() {
        return Err(InvariantViolation::EmptySchedule);
    }
    let last_index = result.days.len() - 1;
    for (index, day) in result.days.iter().enumerate() {
        check_day(day, index, index == last_index)?;
    }

    let driven: f64 = result.days.iter().map(|day| day.driven_miles).sum();
    if !within(driven, input.distance_mi, miles_tolerance(input)) {
        return Err(InvariantViolation::MilesNotConserved {
            expected: input.distance_mi,
            actual: driven,
        });
    }

    check_stats(result, input)?;
    check_stop_order(
        StopKind::Fuel,
        result
            .fuel_stops
            .iter()
            .map(|stop| (stop.day, stop.elapsed_hour_in_day, stop.miles_in)),
    )?;
    check_stop_order(
        StopKind::Rest,
        result
            .rest_stops
            .iter()
            .map(|stop| (stop.day, stop.elapsed_hour_in_day, stop.miles_in)),
    )?;
    check_fuel_cadence(
        result.fuel_stops.iter().map(|stop| stop.miles_in),
        input,
        rules,
    )?;
    check_cycle(
        result
            .days
            .iter()
            .map(|day| day.totals.on_duty_total())
            .sum(),
        input,
        rules,
    )
}

fn within(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance
}

fn miles_tolerance(input: &TripInput) -> f64 {
    AUDIT_TOLERANCE * input.distance_mi.max(1.0)
}

fn check_contiguity(segments: &[DutySegment]) -> Result<(), InvariantViolation> {
    let first = segments.first().ok_or(InvariantViolation::EmptySchedule)?;
    if first.start_hour.abs() > AUDIT_TOLERANCE {
        return Err(InvariantViolation::LateStart {
            start_hour: first.start_hour,
        });
    }
    for segment in segments {
        if segment.duration() <= 0.0 {
            return Err(InvariantViolation::NonPositiveDuration {
                at_hour: segment.start_hour,
                hours: segment.duration(),
            });
        }
    }
    for pair in segments.windows(2) {
        if !within(pair[0].end_hour, pair[1].start_hour, AUDIT_TOLERANCE) {
            return Err(InvariantViolation::NotContiguous {
                at_hour: pair[0].end_hour,
                next_start: pair[1].start_hour,
            });
        }
    }
    Ok(())
}

fn check_miles(segments: &[DutySegment], input: &TripInput) -> Result<(), InvariantViolation> {
    let actual: f64 = segments.iter().map(|segment| segment.miles).sum();
    if within(actual, input.distance_mi, miles_tolerance(input)) {
        Ok(())
    } else {
        Err(InvariantViolation::MilesNotConserved {
            expected: input.distance_mi,
            actual,
        })
    }
}

/// On-duty extent of one shift.
#[derive(Debug, Default)]
struct ShiftSpan {
    first_start: Option<f64>,
    last_end: f64,
    driving_hrs: f64,
}

impl ShiftSpan {
    fn record(&mut self, segment: &DutySegment) {
        self.first_start.get_or_insert(segment.start_hour);
        self.last_end = segment.end_hour;
        if segment.status == DutyStatus::Driving {
            self.driving_hrs += segment.duration();
        }
    }

    fn check(&self, shift: u32, rules: &HosRules) -> Result<(), InvariantViolation> {
        let Some(first_start) = self.first_start else {
            return Ok(());
        };
        if self.driving_hrs > rules.max_driving_hrs + AUDIT_TOLERANCE {
            return Err(InvariantViolation::ShiftDrivingExceeded {
                shift,
                hours: self.driving_hrs,
                limit: rules.max_driving_hrs,
            });
        }
        let span = self.last_end - first_start;
        if span > rules.duty_window_hrs + AUDIT_TOLERANCE {
            return Err(InvariantViolation::DutyWindowExceeded {
                shift,
                span,
                limit: rules.duty_window_hrs,
            });
        }
        Ok(())
    }
}

/// Shifts are split by contiguous rest totalling at least the reset threshold.
fn check_shifts(segments: &[DutySegment], rules: &HosRules) -> Result<(), InvariantViolation> {
    let mut shift = ShiftSpan::default();
    let mut shift_number = 1;
    let mut rest_run = 0.0;
    for segment in segments {
        if segment.status.is_rest() {
            rest_run += segment.duration();
            continue;
        }
        if shift.first_start.is_some() && rest_run + AUDIT_TOLERANCE >= rules.min_off_duty_hrs {
            shift.check(shift_number, rules)?;
            shift = ShiftSpan::default();
            shift_number += 1;
        }
        rest_run = 0.0;
        shift.record(segment);
    }
    shift.check(shift_number, rules)
}

/// Any contiguous non-driving stretch of at least the break duration counts
/// as a qualifying break.
fn check_breaks(segments: &[DutySegment], rules: &HosRules) -> Result<(), InvariantViolation> {
    let mut driving_hrs = 0.0;
    let mut pause_hrs = 0.0;
    for segment in segments {
        if segment.status != DutyStatus::Driving {
            pause_hrs += segment.duration();
            continue;
        }
        if pause_hrs + AUDIT_TOLERANCE >= rules.break_duration_hrs {
            driving_hrs = 0.0;
        }
        pause_hrs = 0.0;
        driving_hrs += segment.duration();
        if driving_hrs > rules.break_after_hrs + AUDIT_TOLERANCE {
            return Err(InvariantViolation::BreakOverdue {
                at_hour: segment.end_hour,
                driving_hrs,
                limit: rules.break_after_hrs,
            });
        }
    }
    Ok(())
}

fn check_bookends(segments: &[DutySegment], input: &TripInput) -> Result<(), InvariantViolation> {
    let first_drive = segments
        .iter()
        .position(|segment| segment.status == DutyStatus::Driving)
        .ok_or(InvariantViolation::NoDriving)?;
    let first_work = segments
        .iter()
        .position(|segment| segment.status.is_on_duty())
        .ok_or(InvariantViolation::NoDriving)?;
    let pickup = &segments[first_work];
    if first_work + 1 != first_drive
        || pickup.status != DutyStatus::OnDuty
        || !pickup.note_is(NOTE_PICKUP)
    {
        return Err(InvariantViolation::MisplacedPickup {
            at_hour: pickup.start_hour,
        });
    }
    check_handling("pickup", pickup, input.pickup_hrs)?;

    let last_work = segments
        .iter()
        .rposition(|segment| segment.status.is_on_duty())
        .ok_or(InvariantViolation::NoDriving)?;
    let last_drive = segments
        .iter()
        .rposition(|segment| segment.status == DutyStatus::Driving)
        .ok_or(InvariantViolation::NoDriving)?;
    let dropoff = &segments[last_work];
    let rest_between = segments
        .get(last_drive + 1..last_work)
        .is_some_and(|between| between.iter().all(|segment| segment.status.is_rest()));
    if last_work <= last_drive
        || !rest_between
        || dropoff.status != DutyStatus::OnDuty
        || !dropoff.note_is(NOTE_DROPOFF)
    {
        return Err(InvariantViolation::MisplacedDropoff {
            at_hour: dropoff.start_hour,
        });
    }
    check_handling("dropoff", dropoff, input.dropoff_hrs)
}

fn check_handling(
    label: &'static str,
    segment: &DutySegment,
    expected: f64,
) -> Result<(), InvariantViolation> {
    if within(segment.duration(), expected, AUDIT_TOLERANCE) {
        Ok(())
    } else {
        Err(InvariantViolation::HandlingDuration {
            label,
            hours: segment.duration(),
            expected,
        })
    }
}

fn check_cycle(
    on_duty_hrs: f64,
    input: &TripInput,
    rules: &HosRules,
) -> Result<(), InvariantViolation> {
    let total = input.cycle_hours_used_start + on_duty_hrs;
    if total > rules.cycle_limit_hrs + AUDIT_TOLERANCE {
        return Err(InvariantViolation::CycleOverrun {
            total,
            limit: rules.cycle_limit_hrs,
        });
    }
    Ok(())
}

fn check_day(day: &DayLog, index: usize, is_last: bool) -> Result<(), InvariantViolation> {
    let expected = u32::try_from(index + 1).unwrap_or(u32::MAX);
    if day.day_num != expected {
        return Err(InvariantViolation::DayOutOfSequence {
            day_num: day.day_num,
            expected,
        });
    }

    let mut cursor = 0.0;
    for entry in &day.timeline {
        if !within(entry.start, cursor, AUDIT_TOLERANCE)
            || entry.end <= entry.start
            || entry.end > HOURS_PER_DAY + AUDIT_TOLERANCE
        {
            return Err(InvariantViolation::TimelineBroken {
                day_num: day.day_num,
                at_hour: entry.start,
            });
        }
        cursor = entry.end;
    }

    for status in DutyStatus::ALL {
        let from_timeline: f64 = day
            .timeline
            .iter()
            .filter(|entry| entry.status == status)
            .map(|entry| entry.end - entry.start)
            .sum();
        if !within(from_timeline, day.totals.get(status), AUDIT_TOLERANCE) {
            return Err(InvariantViolation::TotalsMismatch {
                day_num: day.day_num,
                status,
            });
        }
    }

    let hours = day.totals.sum();
    let full_day = within(hours, HOURS_PER_DAY, AUDIT_TOLERANCE);
    if (!is_last && !full_day) || hours > HOURS_PER_DAY + AUDIT_TOLERANCE {
        return Err(InvariantViolation::DayHoursMismatch {
            day_num: day.day_num,
            hours,
        });
    }
    Ok(())
}

fn check_stats(result: &ScheduleResult, input: &TripInput) -> Result<(), InvariantViolation> {
    let stats = &result.trip_stats;
    let driving: f64 = result.days.iter().map(|day| day.totals.driving).sum();
    let count_is = |count: u32, len: usize| u32::try_from(len).ok() == Some(count);
    let checks = [
        ("trip_days", count_is(stats.trip_days, result.days.len())),
        ("fuel_stops", count_is(stats.fuel_stops, result.fuel_stops.len())),
        ("rest_stops", count_is(stats.rest_stops, result.rest_stops.len())),
        (
            "total_driving_hrs",
            within(stats.total_driving_hrs, driving, AUDIT_TOLERANCE),
        ),
        (
            "total_miles",
            within(stats.total_miles, input.distance_mi, 0.0),
        ),
        (
            "cycle_used_start",
            within(stats.cycle_used_start, input.cycle_hours_used_start, 0.0),
        ),
    ];
    match checks.into_iter().find(|(_, ok)| !ok) {
        Some((field, _)) => Err(InvariantViolation::StatsMismatch { field }),
        None => Ok(()),
    }
}

fn check_stop_order(
    kind: StopKind,
    stops: impl Iterator<Item = (u32, f64, f64)>,
) -> Result<(), InvariantViolation> {
    let mut previous: Option<(u32, f64, f64)> = None;
    for (day, hour, miles) in stops {
        if let Some((prev_day, prev_hour, prev_miles)) = previous {
            let earlier = day < prev_day || (day == prev_day && hour + AUDIT_TOLERANCE < prev_hour);
            if earlier || miles + AUDIT_TOLERANCE < prev_miles {
                return Err(InvariantViolation::UnsortedStops { kind, day, hour });
            }
        }
        previous = Some((day, hour, miles));
    }
    Ok(())
}

/// Consecutive fuel stops (trip start and destination included) are at most
/// one interval apart, and no stop falls on or after the destination.
fn check_fuel_cadence(
    stops: impl Iterator<Item = f64>,
    input: &TripInput,
    rules: &HosRules,
) -> Result<(), InvariantViolation> {
    let tolerance = miles_tolerance(input);
    let limit = rules.fuel_interval_mi;
    let total = input.distance_mi;
    let mut previous = 0.0;
    for miles_in in stops {
        if miles_in >= total {
            return Err(InvariantViolation::FuelPastDestination { miles_in, total });
        }
        if miles_in - previous > limit + tolerance {
            return Err(InvariantViolation::FuelCadence {
                from_mi: previous,
                to_mi: miles_in,
                limit,
            });
        }
        previous = miles_in;
    }
    if total - previous > limit + tolerance {
        return Err(InvariantViolation::FuelCadence {
            from_mi: previous,
            to_mi: total,
            limit,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{NOTE_BREAK, NOTE_DRIVING, NOTE_PRE_SHIFT, NOTE_RESET};

    fn rest(start: f64, end: f64, note: &str) -> DutySegment {
        DutySegment::new(DutyStatus::OffDuty, start, end, note)
    }

    fn work(start: f64, end: f64, note: &str) -> DutySegment {
        DutySegment::new(DutyStatus::OnDuty, start, end, note)
    }

    fn drive(start: f64, end: f64) -> DutySegment {
        DutySegment::driving(start, end, (end - start) * 55.0, NOTE_DRIVING)
    }

    fn short_trip() -> (Vec<DutySegment>, TripInput) {
        let hours = 300.0 / 55.0;
        let segments = vec![
            rest(0.0, 6.0, NOTE_PRE_SHIFT),
            work(6.0, 7.0, NOTE_PICKUP),
            drive(7.0, 7.0 + hours),
            work(7.0 + hours, 8.0 + hours, NOTE_DROPOFF),
            rest(8.0 + hours, 24.0, "Off duty - trip complete"),
        ];
        (segments, TripInput::new(300.0, 0.0))
    }

    #[test]
    fn well_formed_short_trip_passes() {
        let (segments, input) = short_trip();
        assert_eq!(
            audit_segments(&segments, &input, &HosRules::default()),
            Ok(())
        );
    }

    #[test]
    fn gap_between_segments_is_reported() {
        let (mut segments, input) = short_trip();
        segments[1].start_hour = 6.5;
        assert!(matches!(
            audit_segments(&segments, &input, &HosRules::default()),
            Err(InvariantViolation::NotContiguous { .. })
        ));
    }

    #[test]
    fn missing_miles_are_reported() {
        let (mut segments, input) = short_trip();
        segments[2].miles -= 1.0;
        assert!(matches!(
            audit_segments(&segments, &input, &HosRules::default()),
            Err(InvariantViolation::MilesNotConserved { .. })
        ));
    }

    #[test]
    fn twelve_hours_of_driving_in_one_shift_fails() {
        let segments = vec![
            work(0.0, 1.0, NOTE_PICKUP),
            drive(1.0, 7.0),
            rest(7.0, 7.5, NOTE_BREAK),
            drive(7.5, 13.5),
            work(13.5, 14.5, NOTE_DROPOFF),
        ];
        let input = TripInput::new(12.0 * 55.0, 0.0).with_start_hour(0.0);
        assert!(matches!(
            audit_segments(&segments, &input, &HosRules::default()),
            Err(InvariantViolation::ShiftDrivingExceeded { shift: 1, .. })
        ));
    }

    #[test]
    fn reset_starts_a_new_shift() {
        let segments = vec![
            work(0.0, 1.0, NOTE_PICKUP),
            drive(1.0, 7.0),
            rest(7.0, 17.0, NOTE_RESET),
            drive(17.0, 23.0),
            work(23.0, 24.0, NOTE_DROPOFF),
        ];
        let input = TripInput::new(12.0 * 55.0, 0.0).with_start_hour(0.0);
        assert_eq!(
            audit_segments(&segments, &input, &HosRules::default()),
            Ok(())
        );
    }

    #[test]
    fn window_includes_short_rest() {
        let segments = vec![
            work(0.0, 1.0, NOTE_PICKUP),
            drive(1.0, 5.0),
            rest(5.0, 14.0, "Off duty"),
            drive(14.0, 15.0),
            work(15.0, 16.0, NOTE_DROPOFF),
        ];
        let input = TripInput::new(5.0 * 55.0, 0.0).with_start_hour(0.0);
        assert!(matches!(
            audit_segments(&segments, &input, &HosRules::default()),
            Err(InvariantViolation::DutyWindowExceeded { span, .. }) if (span - 16.0).abs() < 1e-9
        ));
    }

    #[test]
    fn nine_hours_without_break_fails() {
        let segments = vec![
            work(0.0, 1.0, NOTE_PICKUP),
            drive(1.0, 6.0),
            drive(6.0, 10.0),
            work(10.0, 11.0, NOTE_DROPOFF),
        ];
        let input = TripInput::new(9.0 * 55.0, 0.0).with_start_hour(0.0);
        assert!(matches!(
            audit_segments(&segments, &input, &HosRules::default()),
            Err(InvariantViolation::BreakOverdue { .. })
        ));
    }

    #[test]
    fn dropoff_after_reset_is_accepted_but_not_after_more_work() {
        let mut segments = vec![
            work(0.0, 1.0, NOTE_PICKUP),
            drive(1.0, 2.0),
            rest(2.0, 12.0, NOTE_RESET),
            work(12.0, 13.0, NOTE_DROPOFF),
        ];
        let input = TripInput::new(55.0, 0.0).with_start_hour(0.0);
        let rules = HosRules::default();
        assert_eq!(audit_segments(&segments, &input, &rules), Ok(()));

        segments[3].note = Some("Fuel".to_string());
        assert!(matches!(
            audit_segments(&segments, &input, &rules),
            Err(InvariantViolation::MisplacedDropoff { .. })
        ));
    }

    #[test]
    fn stream_ending_in_driving_reports_missing_dropoff() {
        let segments = vec![work(0.0, 1.0, NOTE_PICKUP), drive(1.0, 2.0)];
        let input = TripInput::new(55.0, 0.0).with_start_hour(0.0);
        assert_eq!(
            audit_segments(&segments, &input, &HosRules::default()),
            Err(InvariantViolation::MisplacedDropoff { at_hour: 1.0 })
        );
    }

    #[test]
    fn cycle_total_is_checked() {
        let (segments, _) = short_trip();
        let input = TripInput::new(300.0, 65.0);
        assert!(matches!(
            audit_segments(&segments, &input, &HosRules::default()),
            Err(InvariantViolation::CycleOverrun { .. })
        ));
    }

    #[test]
    fn fuel_cadence_rules() {
        let rules = HosRules::default();
        let input = TripInput::new(2_000.0, 0.0);
        assert_eq!(
            check_fuel_cadence([1_000.0].into_iter(), &input, &rules),
            Ok(())
        );
        assert!(matches!(
            check_fuel_cadence([1_200.0].into_iter(), &input, &rules),
            Err(InvariantViolation::FuelCadence { .. })
        ));
        assert!(matches!(
            check_fuel_cadence([1_000.0, 2_000.0].into_iter(), &input, &rules),
            Err(InvariantViolation::FuelPastDestination { .. })
        ));
        let short = TripInput::new(900.0, 0.0);
        assert_eq!(check_fuel_cadence(std::iter::empty(), &short, &rules), Ok(()));
    }

    #[test]
    fn stop_order_requires_non_decreasing_day_hour_and_miles() {
        let sorted = [(1, 15.0, 440.0), (2, 14.0, 880.0)];
        assert_eq!(check_stop_order(StopKind::Rest, sorted.into_iter()), Ok(()));
        let unsorted = [(2, 1.0, 900.0), (1, 23.0, 800.0)];
        assert!(matches!(
            check_stop_order(StopKind::Rest, unsorted.into_iter()),
            Err(InvariantViolation::UnsortedStops { day: 1, .. })
        ));
    }
}
