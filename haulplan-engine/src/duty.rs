//! Duty statuses, absolute duty segments, and per-status hour totals.
use serde::{Deserialize, Serialize};

/// One of the four rows of a driver's daily log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DutyStatus {
    OffDuty,
    Sleeper,
    Driving,
    OnDuty,
}

impl DutyStatus {
    /// All statuses in log-sheet row order.
    pub const ALL: [Self; 4] = [Self::OffDuty, Self::Sleeper, Self::Driving, Self::OnDuty];

    /// Zero-based log-sheet row. Display convention only.
    #[must_use]
    pub const fn row(self) -> u8 {
        match self {
            Self::OffDuty => 0,
            Self::Sleeper => 1,
            Self::Driving => 2,
            Self::OnDuty => 3,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OffDuty => "off_duty",
            Self::Sleeper => "sleeper",
            Self::Driving => "driving",
            Self::OnDuty => "on_duty",
        }
    }

    /// Counts against the duty window and the 70-hour cycle.
    #[must_use]
    pub const fn is_on_duty(self) -> bool {
        match self {
            Self::Driving | Self::OnDuty => true,
            Self::OffDuty | Self::Sleeper => false,
        }
    }

    /// Off duty or sleeper berth; only these can form a qualifying reset.
    #[must_use]
    pub const fn is_rest(self) -> bool {
        !self.is_on_duty()
    }
}

impl std::fmt::Display for DutyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A contiguous period in a single duty status, in absolute trip-elapsed hours.
///
/// Hour `0.0` is midnight at the start of day 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DutySegment {
    pub status: DutyStatus,
    pub start_hour: f64,
    pub end_hour: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Distance covered during the segment; zero unless driving.
    #[serde(default)]
    pub miles: f64,
}

impl DutySegment {
    #[must_use]
    pub fn new(status: DutyStatus, start_hour: f64, end_hour: f64, note: &str) -> Self {
        Self {
            status,
            start_hour,
            end_hour,
            note: Some(note.to_string()),
            miles: 0.0,
        }
    }

    #[must_use]
    pub fn driving(start_hour: f64, end_hour: f64, miles: f64, note: &str) -> Self {
        Self {
            miles,
            ..Self::new(DutyStatus::Driving, start_hour, end_hour, note)
        }
    }

    #[must_use]
    pub fn duration(&self) -> f64 {
        self.end_hour - self.start_hour
    }

    #[must_use]
    pub fn note_is(&self, note: &str) -> bool {
        self.note.as_deref() == Some(note)
    }
}

/// Hours per duty status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusTotals {
    pub off_duty: f64,
    pub sleeper: f64,
    pub driving: f64,
    pub on_duty: f64,
}

impl StatusTotals {
    pub fn add(&mut self, status: DutyStatus, hours: f64) {
        match status {
            DutyStatus::OffDuty => self.off_duty += hours,
            DutyStatus::Sleeper => self.sleeper += hours,
            DutyStatus::Driving => self.driving += hours,
            DutyStatus::OnDuty => self.on_duty += hours,
        }
    }

    #[must_use]
    pub const fn get(&self, status: DutyStatus) -> f64 {
        match status {
            DutyStatus::OffDuty => self.off_duty,
            DutyStatus::Sleeper => self.sleeper,
            DutyStatus::Driving => self.driving,
            DutyStatus::OnDuty => self.on_duty,
        }
    }

    #[must_use]
    pub fn sum(&self) -> f64 {
        self.off_duty + self.sleeper + self.driving + self.on_duty
    }

    /// Driving plus on-duty (not driving): the hours charged to the cycle.
    #[must_use]
    pub fn on_duty_total(&self) -> f64 {
        self.driving + self.on_duty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_tags_match_log_rows() {
        let tags: Vec<_> = DutyStatus::ALL.iter().map(|s| s.as_str()).collect();
        assert_eq!(tags, ["off_duty", "sleeper", "driving", "on_duty"]);
        for (idx, status) in DutyStatus::ALL.iter().enumerate() {
            assert_eq!(usize::from(status.row()), idx);
        }
        let json = serde_json::to_string(&DutyStatus::OffDuty).unwrap();
        assert_eq!(json, "\"off_duty\"");
        let parsed: DutyStatus = serde_json::from_str("\"on_duty\"").unwrap();
        assert_eq!(parsed, DutyStatus::OnDuty);
    }

    #[test]
    fn rest_and_on_duty_partition_statuses() {
        assert!(DutyStatus::Driving.is_on_duty());
        assert!(DutyStatus::OnDuty.is_on_duty());
        assert!(DutyStatus::OffDuty.is_rest());
        assert!(DutyStatus::Sleeper.is_rest());
    }

    #[test]
    fn totals_accumulate_per_status() {
        let mut totals = StatusTotals::default();
        totals.add(DutyStatus::Driving, 5.5);
        totals.add(DutyStatus::OnDuty, 1.0);
        totals.add(DutyStatus::OffDuty, 17.5);
        totals.add(DutyStatus::Driving, 0.5);
        assert!((totals.get(DutyStatus::Driving) - 6.0).abs() < 1e-12);
        assert!((totals.sum() - 25.0).abs() < 1e-12);
        assert!((totals.on_duty_total() - 7.0).abs() < 1e-12);
    }

    #[test]
    fn segment_helpers() {
        let seg = DutySegment::driving(7.0, 15.0, 440.0, "Driving");
        assert!((seg.duration() - 8.0).abs() < 1e-12);
        assert!(seg.note_is("Driving"));
        assert_eq!(seg.status, DutyStatus::Driving);
    }
}
