//! Folding absolute duty segments into calendar-day logs.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::audit::InvariantViolation;
use crate::constants::{HOURS_EPSILON, HOURS_PER_DAY};
use crate::duty::{DutySegment, DutyStatus, StatusTotals};
use crate::numbers::{floor_f64_to_u32, u32_to_f64, u32_to_usize};
use crate::rules::HosRules;
use crate::trip::TripInput;

/// One clipped segment on a day's log, in hours of that day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub status: DutyStatus,
    pub start: f64,
    /// May equal `24.0` when the entry runs to midnight.
    pub end: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl TimelineEntry {
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Hours-of-service recap at the end of a day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DayRecap {
    /// Driving plus on-duty hours logged this day.
    pub on_duty_today: f64,
    /// Cycle hours used as of the end of this day.
    pub cycle_used: f64,
    pub cycle_available: f64,
}

/// A single calendar day of the driver's log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayLog {
    pub day_num: u32,
    pub totals: StatusTotals,
    pub driven_miles: f64,
    pub timeline: SmallVec<[TimelineEntry; 8]>,
    pub driven_hrs: f64,
    pub cumulative_miles: f64,
    pub recap: DayRecap,
}

impl DayLog {
    fn empty(day_num: u32) -> Self {
        Self {
            day_num,
            totals: StatusTotals::default(),
            driven_miles: 0.0,
            timeline: SmallVec::new(),
            driven_hrs: 0.0,
            cumulative_miles: 0.0,
            recap: DayRecap::default(),
        }
    }

    fn push(&mut self, entry: TimelineEntry) {
        let hours = entry.duration();
        self.totals.add(entry.status, hours);
        if entry.status == DutyStatus::Driving {
            self.driven_hrs += hours;
        }
        self.timeline.push(entry);
    }

    /// Hours the log accounts for; 24 for every complete day.
    #[must_use]
    pub fn logged_hours(&self) -> f64 {
        self.totals.sum()
    }
}

/// Projects an absolute segment stream onto calendar days.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleBuilder<'a> {
    input: &'a TripInput,
    rules: &'a HosRules,
}

impl<'a> ScheduleBuilder<'a> {
    #[must_use]
    pub const fn new(input: &'a TripInput, rules: &'a HosRules) -> Self {
        Self { input, rules }
    }

    /// Split segments at every midnight, then total and apportion each day.
    ///
    /// Driven miles are apportioned by driving time, so the days sum to the
    /// trip distance.
    ///
    /// # Errors
    ///
    /// Returns [`InvariantViolation::NoDriving`] for a stream without driving
    /// time, or [`InvariantViolation::NotContiguous`] when a segment skips a
    /// whole day.
    pub fn build(&self, segments: &[DutySegment]) -> Result<Vec<DayLog>, InvariantViolation> {
        let total_driving: f64 = segments
            .iter()
            .filter(|segment| segment.status == DutyStatus::Driving)
            .map(DutySegment::duration)
            .sum();
        if total_driving <= 0.0 {
            return Err(InvariantViolation::NoDriving);
        }

        let mut days: Vec<DayLog> = Vec::new();
        for segment in segments {
            split_into_days(segment, &mut days)?;
        }
        self.apportion(&mut days, total_driving);
        Ok(days)
    }

    fn apportion(&self, days: &mut [DayLog], total_driving: f64) {
        let distance = self.input.distance_mi;
        let mut driven_so_far = 0.0;
        let mut cycle_used = self.input.cycle_hours_used_start;
        for day in days {
            driven_so_far += day.driven_hrs;
            day.driven_miles = distance * day.driven_hrs / total_driving;
            day.cumulative_miles = (distance * driven_so_far / total_driving).min(distance);

            let on_duty_today = day.totals.on_duty_total();
            cycle_used += on_duty_today;
            day.recap = DayRecap {
                on_duty_today,
                cycle_used,
                cycle_available: (self.rules.cycle_limit_hrs - cycle_used).max(0.0),
            };
        }
    }
}

/// Clip one segment into per-day entries. A start within epsilon of a
/// midnight is treated as that midnight so no sliver entries are produced.
fn split_into_days(
    segment: &DutySegment,
    days: &mut Vec<DayLog>,
) -> Result<(), InvariantViolation> {
    let mut start = segment.start_hour;
    while segment.end_hour - start > HOURS_EPSILON {
        let day_index = floor_f64_to_u32((start + HOURS_EPSILON) / HOURS_PER_DAY);
        let day_start = u32_to_f64(day_index) * HOURS_PER_DAY;
        let clip_end = segment.end_hour.min(day_start + HOURS_PER_DAY);

        let index = u32_to_usize(day_index);
        if index == days.len() {
            days.push(DayLog::empty(day_index + 1));
        } else if index > days.len() {
            return Err(InvariantViolation::NotContiguous {
                at_hour: day_start,
                next_start: start,
            });
        }
        days[index].push(TimelineEntry {
            status: segment.status,
            start: (start - day_start).max(0.0),
            end: clip_end - day_start,
            note: segment.note.clone(),
        });
        start = clip_end;
    }
    Ok(())
}
