//! Trip-level summary and the complete planning result.
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::day_accounting::DayLog;
use crate::rules::HosRules;
use crate::stops::{FuelStop, RestStop};
use crate::trip::TripInput;

/// Summary statistics derived from the emitted days and stops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripStats {
    pub total_miles: f64,
    pub total_driving_hrs: f64,
    pub trip_days: u32,
    pub fuel_stops: u32,
    pub cycle_used_start: f64,
    pub avg_speed_mph: f64,
    pub rest_stops: u32,
    /// Driving plus on-duty hours across the trip.
    pub total_on_duty_hrs: f64,
    /// Cycle hours still available when the trip ends.
    pub cycle_remaining: f64,
}

impl TripStats {
    /// Reduce the finished days and stops; nothing is recomputed from the engine.
    #[must_use]
    pub fn aggregate(
        input: &TripInput,
        rules: &HosRules,
        days: &[DayLog],
        fuel_stops: &[FuelStop],
        rest_stops: &[RestStop],
    ) -> Self {
        let total_driving_hrs: f64 = days.iter().map(|day| day.totals.driving).sum();
        let total_on_duty_hrs: f64 = days.iter().map(|day| day.totals.on_duty_total()).sum();
        let cycle_end = input.cycle_hours_used_start + total_on_duty_hrs;
        Self {
            total_miles: input.distance_mi,
            total_driving_hrs,
            trip_days: count(days.len()),
            fuel_stops: count(fuel_stops.len()),
            cycle_used_start: input.cycle_hours_used_start,
            avg_speed_mph: input.avg_speed_mph,
            rest_stops: count(rest_stops.len()),
            total_on_duty_hrs,
            cycle_remaining: (rules.cycle_limit_hrs - cycle_end).max(0.0),
        }
    }
}

fn count(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

/// Everything a renderer needs; owned by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleResult {
    pub days: Vec<DayLog>,
    pub fuel_stops: Vec<FuelStop>,
    pub rest_stops: Vec<RestStop>,
    pub trip_stats: TripStats,
}

impl ScheduleResult {
    /// SHA-256 over the canonical JSON encoding, as lowercase hex.
    ///
    /// Two results with equal fingerprints serialize identically.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if the result cannot be encoded.
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        let bytes = serde_json::to_vec(self)?;
        let digest = Sha256::digest(&bytes);
        Ok(digest.iter().map(|byte| format!("{byte:02x}")).collect())
    }

    /// Last day of the trip.
    #[must_use]
    pub fn final_day(&self) -> Option<&DayLog> {
        self.days.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan;

    #[test]
    fn stats_reduce_from_days() {
        let input = TripInput::new(855.0, 14.0);
        let result = plan(&input).unwrap();
        let stats = &result.trip_stats;
        assert_eq!(stats.trip_days, 2);
        assert_eq!(stats.fuel_stops, 0);
        assert_eq!(stats.rest_stops, 1);
        assert!((stats.total_driving_hrs - 855.0 / 55.0).abs() < 1e-9);
        assert!((stats.total_on_duty_hrs - (2.0 + 855.0 / 55.0)).abs() < 1e-9);
        assert!((stats.cycle_remaining - (70.0 - 14.0 - 2.0 - 855.0 / 55.0)).abs() < 1e-9);
        assert!((stats.cycle_used_start - 14.0).abs() < f64::EPSILON);
        assert!((stats.avg_speed_mph - 55.0).abs() < f64::EPSILON);
    }

    #[test]
    fn fingerprint_is_stable_hex() {
        let input = TripInput::new(1_200.0, 0.0);
        let first = plan(&input).unwrap().fingerprint().unwrap();
        let second = plan(&input).unwrap().fingerprint().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));

        let other = plan(&TripInput::new(1_201.0, 0.0))
            .unwrap()
            .fingerprint()
            .unwrap();
        assert_ne!(first, other);
    }

    #[test]
    fn result_serializes_contract_keys() {
        let result = plan(&TripInput::new(300.0, 0.0)).unwrap();
        let value = serde_json::to_value(&result).unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 4);
        for key in ["days", "fuel_stops", "rest_stops", "trip_stats"] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(result.final_day().map(|day| day.day_num), Some(1));
    }
}
