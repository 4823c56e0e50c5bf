use anyhow::{Result, anyhow, bail, ensure};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use haulplan_engine::{
    DutyStatus, HosRules, Planner, PlanningError, ScheduleResult, TimelineEntry, TripInput,
};

pub type PlanOutcome = Result<ScheduleResult, PlanningError>;
pub type Expectation = fn(&PlanOutcome) -> Result<()>;

/// A named trip with the rules it runs under and what it must produce.
#[derive(Debug, Clone)]
pub struct PlanningScenario {
    pub name: &'static str,
    pub input: TripInput,
    pub rules: HosRules,
    expectations: Vec<Expectation>,
}

impl PlanningScenario {
    #[must_use]
    pub fn new(name: &'static str, input: TripInput) -> Self {
        Self {
            name,
            input,
            rules: HosRules::default(),
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_rules(mut self, rules: HosRules) -> Self {
        self.rules = rules;
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: Expectation) -> Self {
        self.expectations.push(expectation);
        self
    }

    fn evaluate(&self, outcome: &PlanOutcome) -> Option<String> {
        self.expectations
            .iter()
            .find_map(|expectation| expectation(outcome).err())
            .map(|err| format!("{err:#}"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
}

pub struct ScenarioRunner {
    verbose: bool,
}

impl ScenarioRunner {
    #[must_use]
    pub const fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Plan the scenario `iterations` times, checking every expectation and
    /// that each run reproduces the first one's fingerprint.
    pub fn run_scenario(&self, scenario: &PlanningScenario, iterations: usize) -> ScenarioResult {
        if self.verbose {
            println!(
                "🧪 Testing scenario: {} ({:.0} mi, {:.1} h used)",
                scenario.name.bright_white(),
                scenario.input.distance_mi,
                scenario.input.cycle_hours_used_start
            );
        }

        let iterations = iterations.max(1);
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut performance_data = Vec::with_capacity(iterations);
        let mut baseline: Option<String> = None;

        let planner = match Planner::new(scenario.rules.clone()) {
            Ok(planner) => planner,
            Err(err) => {
                return ScenarioResult {
                    scenario_name: scenario.name.to_string(),
                    passed: false,
                    iterations_run: 0,
                    successful_iterations: 0,
                    failures: vec![format!("rules rejected: {err}")],
                    average_duration: Duration::ZERO,
                };
            }
        };

        for i in 0..iterations {
            let start_time = Instant::now();
            let outcome = planner.plan(&scenario.input);
            performance_data.push(start_time.elapsed());

            let mut failure = scenario.evaluate(&outcome);
            if failure.is_none() {
                let fingerprint = outcome_fingerprint(&outcome);
                match &baseline {
                    Some(first) if *first != fingerprint => {
                        failure = Some(format!("iteration {i} diverged from the first plan"));
                    }
                    Some(_) => {}
                    None => baseline = Some(fingerprint),
                }
            }

            match failure {
                Some(message) => {
                    log::warn!("{} iteration {i}: {message}", scenario.name);
                    failures.push(format!("iteration {i}: {message}"));
                }
                None => successes += 1,
            }
        }

        let average_duration = performance_data.iter().sum::<Duration>()
            / u32::try_from(performance_data.len()).unwrap_or(1);

        ScenarioResult {
            scenario_name: scenario.name.to_string(),
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            average_duration,
        }
    }
}

fn outcome_fingerprint(outcome: &PlanOutcome) -> String {
    match outcome {
        Ok(result) => result
            .fingerprint()
            .unwrap_or_else(|err| format!("unencodable: {err}")),
        Err(err) => format!("error: {err}"),
    }
}

pub fn catalog_scenarios() -> Vec<PlanningScenario> {
    vec![
        PlanningScenario::new("Short Haul", TripInput::new(300.0, 0.0))
            .with_expectation(single_day_expectation),
        PlanningScenario::new("Two-Shift Delivery", TripInput::new(855.0, 14.0))
            .with_expectation(two_shift_expectation),
        PlanningScenario::new("Long Haul Refuel", TripInput::new(1_200.0, 0.0))
            .with_expectation(refuel_expectation),
        PlanningScenario::new("Cycle Exhaustion", TripInput::new(2_000.0, 68.0))
            .with_expectation(cycle_exhaustion_expectation),
        PlanningScenario::new("Fuel Boundary", TripInput::new(2_000.0, 0.0))
            .with_expectation(fuel_boundary_expectation),
        PlanningScenario::new("Sleeper Berth Reset", TripInput::new(1_200.0, 0.0))
            .with_rules(HosRules {
                reset_status: DutyStatus::Sleeper,
                ..HosRules::default()
            })
            .with_expectation(sleeper_reset_expectation),
        PlanningScenario::new("Dropoff Overflow", TripInput::new(605.0, 0.0))
            .with_rules(HosRules {
                duty_window_hrs: 12.6,
                ..HosRules::default()
            })
            .with_expectation(dropoff_overflow_expectation),
        PlanningScenario::new("Cross-Country", TripInput::new(2_800.0, 0.0))
            .with_expectation(full_days_expectation)
            .with_expectation(cross_country_expectation),
        PlanningScenario::new(
            "Midnight Start",
            TripInput::new(500.0, 0.0)
                .with_start_hour(0.0)
                .with_avg_speed(50.0),
        )
        .with_expectation(midnight_start_expectation),
    ]
}

pub fn find_scenario(name: &str) -> Option<PlanningScenario> {
    catalog_scenarios()
        .into_iter()
        .find(|scenario| scenario.name.eq_ignore_ascii_case(name))
}

fn planned(outcome: &PlanOutcome) -> Result<&ScheduleResult> {
    outcome
        .as_ref()
        .map_err(|err| anyhow!("expected a schedule, planning failed: {err}"))
}

fn near(actual: f64, expected: f64, tolerance: f64) -> bool {
    (actual - expected).abs() <= tolerance
}

fn on_duty_entries(result: &ScheduleResult) -> Vec<(u32, &TimelineEntry)> {
    result
        .days
        .iter()
        .flat_map(|day| {
            day.timeline
                .iter()
                .filter(|entry| entry.status == DutyStatus::OnDuty)
                .map(move |entry| (day.day_num, entry))
        })
        .collect()
}

fn single_day_expectation(outcome: &PlanOutcome) -> Result<()> {
    let result = planned(outcome)?;
    ensure!(result.trip_stats.trip_days == 1, "short haul must finish in one day");
    ensure!(result.fuel_stops.is_empty(), "no fuel stop under 1,000 mi");
    ensure!(result.rest_stops.is_empty(), "no break under 8 h driving");
    let driving = result.days[0].totals.driving;
    ensure!(near(driving, 300.0 / 55.0, 1e-6), "driving {driving:.3} h");
    Ok(())
}

fn two_shift_expectation(outcome: &PlanOutcome) -> Result<()> {
    let result = planned(outcome)?;
    ensure!(result.trip_stats.trip_days == 2, "expected two days");
    ensure!(result.fuel_stops.is_empty(), "no fuel stop expected");
    let [rest] = result.rest_stops.as_slice() else {
        bail!("expected exactly one break, got {}", result.rest_stops.len());
    };
    ensure!(
        rest.day == 1 && rest.time_str == "3:00 PM",
        "break at day {} {}",
        rest.day,
        rest.time_str
    );
    let first = &result.days[0];
    ensure!(near(first.totals.driving, 11.0, 1e-9), "day 1 drives the full 11 h");
    ensure!(near(first.driven_miles, 605.0, 1e-6), "day 1 covers 605 mi");
    Ok(())
}

fn refuel_expectation(outcome: &PlanOutcome) -> Result<()> {
    let result = planned(outcome)?;
    let [fuel] = result.fuel_stops.as_slice() else {
        bail!("expected one fuel stop, got {}", result.fuel_stops.len());
    };
    ensure!(near(fuel.miles_in, 1_000.0, 1e-6), "fuel at {:.1} mi", fuel.miles_in);
    ensure!(fuel.day == 2, "fuel stop falls on day {}", fuel.day);
    ensure!(result.rest_stops.len() == 2, "one break per long shift");
    Ok(())
}

fn cycle_exhaustion_expectation(outcome: &PlanOutcome) -> Result<()> {
    match outcome {
        Err(PlanningError::CycleExceeded {
            day,
            cycle_hours,
            limit,
            ..
        }) => {
            ensure!(*day == 1, "cycle should run out on day 1, not {day}");
            ensure!(cycle_hours > limit, "reported hours must exceed the limit");
            Ok(())
        }
        Err(other) => bail!("expected cycle exhaustion, got {other}"),
        Ok(result) => bail!(
            "expected cycle exhaustion, got a {}-day schedule",
            result.trip_stats.trip_days
        ),
    }
}

fn fuel_boundary_expectation(outcome: &PlanOutcome) -> Result<()> {
    let result = planned(outcome)?;
    ensure!(
        result.fuel_stops.len() == 1,
        "arriving at 2,000 mi needs one stop, got {}",
        result.fuel_stops.len()
    );
    Ok(())
}

fn sleeper_reset_expectation(outcome: &PlanOutcome) -> Result<()> {
    let result = planned(outcome)?;
    let sleeper: f64 = result.days.iter().map(|day| day.totals.sleeper).sum();
    ensure!(near(sleeper, 10.0, 1e-9), "sleeper total {sleeper:.2} h");
    Ok(())
}

fn dropoff_overflow_expectation(outcome: &PlanOutcome) -> Result<()> {
    let result = planned(outcome)?;
    let (day, dropoff) = on_duty_entries(result)
        .last()
        .copied()
        .ok_or_else(|| anyhow!("no on-duty entries"))?;
    ensure!(day == 2, "dropoff should wait for day 2, landed on {day}");
    ensure!(near(dropoff.start, 4.5, 1e-9), "dropoff starts at {:.2}", dropoff.start);
    Ok(())
}

fn full_days_expectation(outcome: &PlanOutcome) -> Result<()> {
    let result = planned(outcome)?;
    for day in &result.days {
        ensure!(
            near(day.logged_hours(), 24.0, 1e-6),
            "day {} logs {:.3} h",
            day.day_num,
            day.logged_hours()
        );
    }
    Ok(())
}

fn cross_country_expectation(outcome: &PlanOutcome) -> Result<()> {
    let result = planned(outcome)?;
    let miles: Vec<f64> = result.fuel_stops.iter().map(|stop| stop.miles_in).collect();
    ensure!(
        miles.len() == 2 && near(miles[0], 1_000.0, 1e-6) && near(miles[1], 2_000.0, 1e-6),
        "fuel stops at {miles:?}"
    );
    let last = result
        .final_day()
        .ok_or_else(|| anyhow!("schedule has no days"))?;
    ensure!(last.recap.cycle_used <= 70.0 + 1e-9, "cycle overrun");
    Ok(())
}

fn midnight_start_expectation(outcome: &PlanOutcome) -> Result<()> {
    let result = planned(outcome)?;
    let first = result.days[0]
        .timeline
        .first()
        .ok_or_else(|| anyhow!("empty first day"))?;
    ensure!(first.status == DutyStatus::OnDuty, "pickup starts at midnight");
    ensure!(result.rest_stops.len() == 1, "10 h of driving needs one break");
    Ok(())
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_micros().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let micros = u128::deserialize(deserializer)?;
        Ok(Duration::from_micros(u64::try_from(micros).unwrap_or(0)))
    }
}
