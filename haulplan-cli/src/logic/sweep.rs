use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use haulplan_engine::{Planner, PlanningError, TripInput, audit_schedule};

#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub seeds: Vec<u64>,
    /// Trips generated per seed.
    pub iterations: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedSummary {
    pub seed: u64,
    pub trips: usize,
    pub planned: usize,
    pub cycle_exceeded: usize,
    pub failures: usize,
    pub digest: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepSummary {
    pub seeds: Vec<SeedSummary>,
    pub failures: Vec<String>,
    /// SHA-256 over every seed digest in order.
    pub digest: String,
}

impl SweepSummary {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    #[must_use]
    pub fn total_trips(&self) -> usize {
        self.seeds.iter().map(|seed| seed.trips).sum()
    }
}

/// Trip drawn from the ranges the planner accepts.
pub fn random_trip(rng: &mut ChaCha20Rng) -> TripInput {
    let miles = rng.gen_range(1.0..4_200.0);
    let cycle = rng.gen_range(0.0..70.0);
    let speed = rng.gen_range(45.0..65.0);
    let start_hour = f64::from(rng.gen_range(0_u8..20));
    TripInput::new(miles, cycle)
        .with_avg_speed(speed)
        .with_start_hour(start_hour)
}

/// Plan every generated trip twice, audit each schedule and fold the
/// fingerprints into per-seed and overall digests.
pub fn run_sweep(planner: &Planner, config: &SweepConfig) -> SweepSummary {
    let mut summary = SweepSummary::default();
    let mut overall = Sha256::new();

    for &seed in &config.seeds {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let mut hasher = Sha256::new();
        let mut seed_summary = SeedSummary {
            seed,
            ..SeedSummary::default()
        };

        for trip_index in 0..config.iterations {
            let input = random_trip(&mut rng);
            seed_summary.trips += 1;
            let label = format!("seed {seed} trip {trip_index} ({:.1} mi)", input.distance_mi);

            match check_trip(planner, &input) {
                Ok(TripOutcome::Planned(fingerprint)) => {
                    seed_summary.planned += 1;
                    hasher.update(fingerprint.as_bytes());
                }
                Ok(TripOutcome::CycleExceeded(marker)) => {
                    seed_summary.cycle_exceeded += 1;
                    hasher.update(marker.as_bytes());
                }
                Err(message) => {
                    seed_summary.failures += 1;
                    log::warn!("{label}: {message}");
                    summary.failures.push(format!("{label}: {message}"));
                }
            }
        }

        seed_summary.digest = hex(&hasher.finalize());
        overall.update(seed_summary.digest.as_bytes());
        log::debug!(
            "seed {seed}: {} planned, {} cycle-exhausted",
            seed_summary.planned,
            seed_summary.cycle_exceeded
        );
        summary.seeds.push(seed_summary);
    }

    summary.digest = hex(&overall.finalize());
    summary
}

enum TripOutcome {
    Planned(String),
    CycleExceeded(String),
}

fn check_trip(planner: &Planner, input: &TripInput) -> Result<TripOutcome, String> {
    let first = planner.plan(input);
    let second = planner.plan(input);
    match (first, second) {
        (Ok(first), Ok(second)) => {
            audit_schedule(&first, input, planner.rules()).map_err(|err| err.to_string())?;
            let fingerprint = first.fingerprint().map_err(|err| err.to_string())?;
            let repeat = second.fingerprint().map_err(|err| err.to_string())?;
            if fingerprint != repeat {
                return Err("repeated plan produced a different schedule".to_string());
            }
            Ok(TripOutcome::Planned(fingerprint))
        }
        (Err(first @ PlanningError::CycleExceeded { .. }), Err(second)) => {
            if first != second {
                return Err("repeated plan reported a different cycle exhaustion".to_string());
            }
            let needed = input.pickup_hrs + input.dropoff_hrs + input.driving_hours();
            let limit = planner.rules().cycle_limit_hrs;
            if input.cycle_hours_used_start + needed <= limit {
                return Err(format!(
                    "cycle exhaustion reported for a trip needing {needed:.2} h"
                ));
            }
            Ok(TripOutcome::CycleExceeded(first.to_string()))
        }
        (Err(err), _) | (_, Err(err)) => Err(err.to_string()),
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}
