pub mod reports;
pub mod rules_file;
pub mod scenarios;
pub mod seeds;
pub mod sweep;
pub mod trip_report;

pub use rules_file::RulesFile;
pub use scenarios::{PlanningScenario, ScenarioRunner, catalog_scenarios, find_scenario};
pub use seeds::resolve_seed_inputs;
pub use sweep::{SweepConfig, run_sweep};
pub use trip_report::TripReport;
