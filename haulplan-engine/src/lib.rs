//! Haulplan Schedule Engine
//!
//! Pure, deterministic hours-of-service planning for a single
//! property-carrying driver on the 70-hour/8-day cycle. This crate performs
//! no I/O; routing, rendering and transport live with the callers.

pub mod audit;
pub mod clock;
pub mod constants;
pub mod day_accounting;
pub mod duty;
pub mod engine;
pub mod error;
pub mod numbers;
pub mod result;
pub mod rules;
pub mod stops;
pub mod trip;

// Re-export commonly used types
pub use audit::{InvariantViolation, audit_schedule, audit_segments};
pub use clock::DutyClock;
pub use day_accounting::{DayLog, DayRecap, ScheduleBuilder, TimelineEntry};
pub use duty::{DutySegment, DutyStatus, StatusTotals};
pub use engine::{EnginePhase, EngineStep, RuleEngine, ShiftEndReason, Trigger};
pub use error::PlanningError;
pub use result::{ScheduleResult, TripStats};
pub use rules::{HosRules, RulesError};
pub use stops::{FuelStop, RestStop, StopKind, StopPlanner, format_clock_time, locate_hour};
pub use trip::{DriverMeta, InputError, TripInput};

/// Plan a trip under the default property-carrier rules.
///
/// # Errors
///
/// See [`plan_with_rules`].
pub fn plan(input: &TripInput) -> Result<ScheduleResult, PlanningError> {
    plan_with_rules(input, &HosRules::default())
}

/// Plan a trip under `rules`.
///
/// # Errors
///
/// Returns [`PlanningError::InvalidInput`] or [`PlanningError::InvalidRules`]
/// before simulating, [`PlanningError::CycleExceeded`] when the cycle runs
/// out before delivery, and [`PlanningError::InternalInvariantViolation`]
/// when the finished schedule fails its audit.
pub fn plan_with_rules(
    input: &TripInput,
    rules: &HosRules,
) -> Result<ScheduleResult, PlanningError> {
    let engine = RuleEngine::new(input, rules)?;
    let mut stops = StopPlanner::new();
    let mut segments = Vec::new();
    for step in engine {
        let step = step?;
        stops.observe(&step)?;
        if let Some(segment) = step.segment {
            segments.push(segment);
        }
    }
    audit_segments(&segments, input, rules)?;

    let days = ScheduleBuilder::new(input, rules).build(&segments)?;
    let (fuel_stops, rest_stops) = stops.finish();
    let trip_stats = TripStats::aggregate(input, rules, &days, &fuel_stops, &rest_stops);
    let result = ScheduleResult {
        days,
        fuel_stops,
        rest_stops,
        trip_stats,
    };
    audit_schedule(&result, input, rules)?;

    log::debug!(
        "planned {:.1} mi over {} day(s): {} fuel stop(s), {} break(s)",
        input.distance_mi,
        result.trip_stats.trip_days,
        result.trip_stats.fuel_stops,
        result.trip_stats.rest_stops
    );
    Ok(result)
}

/// Source of rule configuration. Platform-specific callers provide this.
pub trait RulesSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the rules to plan with.
    ///
    /// # Errors
    ///
    /// Returns an error if the rules cannot be loaded or parsed.
    fn load_rules(&self) -> Result<HosRules, Self::Error>;
}

impl RulesSource for HosRules {
    type Error = std::convert::Infallible;

    fn load_rules(&self) -> Result<HosRules, Self::Error> {
        Ok(self.clone())
    }
}

/// Rules given as a JSON overlay on the defaults.
#[derive(Debug, Clone, Copy)]
pub struct JsonRules<'a>(pub &'a str);

impl RulesSource for JsonRules<'_> {
    type Error = RulesError;

    fn load_rules(&self) -> Result<HosRules, Self::Error> {
        HosRules::from_json(self.0)
    }
}

/// Planner bound to one validated rule set, reusable across trips.
#[derive(Debug, Clone, PartialEq)]
pub struct Planner {
    rules: HosRules,
}

impl Planner {
    /// # Errors
    ///
    /// Returns the first rule validation failure.
    pub fn new(rules: HosRules) -> Result<Self, RulesError> {
        rules.validate()?;
        Ok(Self { rules })
    }

    /// Build a planner from any rules source.
    ///
    /// # Errors
    ///
    /// Returns an error if the source fails or yields invalid rules.
    pub fn from_source<S>(source: &S) -> Result<Self, anyhow::Error>
    where
        S: RulesSource + ?Sized,
        S::Error: Into<anyhow::Error>,
    {
        let rules = source.load_rules().map_err(Into::into)?;
        Ok(Self::new(rules)?)
    }

    #[must_use]
    pub const fn rules(&self) -> &HosRules {
        &self.rules
    }

    /// Raw step stream for a trip, for callers that want to observe triggers.
    ///
    /// # Errors
    ///
    /// Returns [`PlanningError::InvalidInput`] for an unschedulable trip.
    pub fn steps<'a>(&'a self, input: &'a TripInput) -> Result<RuleEngine<'a>, PlanningError> {
        RuleEngine::new(input, &self.rules)
    }

    /// # Errors
    ///
    /// See [`plan_with_rules`].
    pub fn plan(&self, input: &TripInput) -> Result<ScheduleResult, PlanningError> {
        plan_with_rules(input, &self.rules)
    }
}

impl Default for Planner {
    fn default() -> Self {
        Self {
            rules: HosRules::default(),
        }
    }
}
