mod logic;
mod util;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::time::Instant;

use haulplan_engine::{HosRules, Planner, PlanningError, TripInput};
use logic::trip_report::{self, cycle_rule_label};
use logic::{
    RulesFile, ScenarioRunner, SweepConfig, TripReport, catalog_scenarios, find_scenario,
    reports, resolve_seed_inputs,
};
use util::split_csv;

const EXIT_FAILURE: i32 = 1;
const EXIT_CYCLE_EXCEEDED: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Colored log sheets and summaries
    Console,
    /// Machine-readable JSON
    Json,
    /// Markdown tables
    Markdown,
    /// Comma-separated rows
    Csv,
}

#[derive(Debug, Parser)]
#[command(name = "haulplan", version)]
#[command(
    about = "Hours-of-service trip planner - daily logs, fuel stops and breaks for property-carrying drivers"
)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console, global = true)]
    report: ReportFormat,

    /// Verbose output (engine debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output file (default: stdout)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Plan one trip and write its daily logs
    Plan(PlanArgs),
    /// Run the built-in scenario catalog and check every expectation
    Scenarios(ScenarioArgs),
    /// Plan seeded random trips twice, audit them and digest the results
    Sweep(SweepArgs),
}

#[derive(Debug, clap::Args)]
struct PlanArgs {
    /// Route distance in miles
    #[arg(long, required_unless_present = "trip")]
    miles: Option<f64>,

    /// Hours already used in the current cycle
    #[arg(long, required_unless_present = "trip")]
    cycle_used: Option<f64>,

    /// Average driving speed in mph
    #[arg(long)]
    speed: Option<f64>,

    /// Hour of day the shift starts (0-24)
    #[arg(long)]
    start_hour: Option<f64>,

    /// On-duty hours at pickup
    #[arg(long)]
    pickup_hrs: Option<f64>,

    /// On-duty hours at dropoff
    #[arg(long)]
    dropoff_hrs: Option<f64>,

    /// Route duration in seconds from the routing service (informational)
    #[arg(long)]
    duration_s: Option<f64>,

    /// Driver name printed on the logs
    #[arg(long)]
    driver: Option<String>,

    /// Carrier name printed on the logs
    #[arg(long)]
    carrier: Option<String>,

    /// Trip request JSON; flags override its fields
    #[arg(long)]
    trip: Option<PathBuf>,

    /// Calendar date of day 1 (YYYY-MM-DD or "today")
    #[arg(long, value_parser = parse_start_date)]
    start_date: Option<NaiveDate>,

    /// JSON rules overlay applied on top of the defaults
    #[arg(long)]
    rules: Option<PathBuf>,
}

#[derive(Debug, clap::Args)]
struct ScenarioArgs {
    /// List all available scenarios and exit
    #[arg(long)]
    list: bool,

    /// Scenarios to run (comma-separated, or "all")
    #[arg(long, default_value = "all")]
    names: String,

    /// Planning runs per scenario
    #[arg(long, default_value_t = 3)]
    iterations: usize,
}

#[derive(Debug, clap::Args)]
struct SweepArgs {
    /// Seeds to sweep (comma-separated integers, 0x-hex, or "standard")
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Random trips per seed
    #[arg(long, default_value_t = 200)]
    iterations: usize,

    /// JSON rules overlay applied on top of the defaults
    #[arg(long)]
    rules: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let outcome = match &args.command {
        Command::Plan(plan_args) => run_plan(&args, plan_args),
        Command::Scenarios(scenario_args) => run_scenarios(&args, scenario_args),
        Command::Sweep(sweep_args) => run_sweep(&args, sweep_args),
    };

    match outcome {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{} {err:#}", "❌".red());
            std::process::exit(EXIT_FAILURE);
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "haulplan_engine=debug,haulplan=debug"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn parse_start_date(value: &str) -> Result<NaiveDate, String> {
    if value.eq_ignore_ascii_case("today") {
        return Ok(chrono::Local::now().date_naive());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|err| format!("expected YYYY-MM-DD, got {value:?}: {err}"))
}

fn announce_banner(rules: &HosRules) {
    println!("{}", "🚚 Haulplan HOS Planner".bright_cyan().bold());
    println!("{}", "=======================".cyan());
    println!("Cycle: {}", cycle_rule_label(rules));
}

fn load_planner(rules: Option<&Path>) -> Result<Planner> {
    match rules {
        Some(path) => Planner::from_source(&RulesFile::new(path))
            .with_context(|| format!("failed to load rules from {}", path.display())),
        None => Ok(Planner::default()),
    }
}

fn build_trip(args: &PlanArgs) -> Result<TripInput> {
    let mut input = match &args.trip {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str::<TripInput>(&json)
                .with_context(|| format!("failed to parse trip request {}", path.display()))?
        }
        None => TripInput::new(
            args.miles.unwrap_or_default(),
            args.cycle_used.unwrap_or_default(),
        ),
    };

    if let Some(miles) = args.miles {
        input.distance_mi = miles;
    }
    if let Some(cycle_used) = args.cycle_used {
        input.cycle_hours_used_start = cycle_used;
    }
    if let Some(speed) = args.speed {
        input.avg_speed_mph = speed;
    }
    if let Some(start_hour) = args.start_hour {
        input.start_hour_of_day = start_hour;
    }
    if let Some(pickup_hrs) = args.pickup_hrs {
        input.pickup_hrs = pickup_hrs;
    }
    if let Some(dropoff_hrs) = args.dropoff_hrs {
        input.dropoff_hrs = dropoff_hrs;
    }
    if let Some(duration_s) = args.duration_s {
        input.duration_s = Some(duration_s);
    }
    if let Some(driver) = &args.driver {
        input.driver.driver_name.clone_from(driver);
    }
    if let Some(carrier) = &args.carrier {
        input.driver.carrier_name.clone_from(carrier);
    }
    Ok(input)
}

fn run_plan(args: &Args, plan_args: &PlanArgs) -> Result<i32> {
    let planner = load_planner(plan_args.rules.as_deref())?;
    let input = build_trip(plan_args)?;
    if args.report == ReportFormat::Console {
        announce_banner(planner.rules());
    }

    let mut output_target = OutputTarget::new(args.output.clone())?;
    let code = match planner.plan(&input) {
        Ok(result) => {
            let report = TripReport {
                input: &input,
                rules: planner.rules(),
                result: &result,
                start_date: plan_args.start_date,
            };
            match args.report {
                ReportFormat::Console => {
                    trip_report::generate_console_report(&mut output_target, &report)?;
                }
                ReportFormat::Json => {
                    trip_report::generate_json_report(&mut output_target, &report)?;
                }
                ReportFormat::Markdown => {
                    trip_report::generate_markdown_report(&mut output_target, &report)?;
                }
                ReportFormat::Csv => {
                    trip_report::generate_csv_report(&mut output_target, &report)?;
                }
            }
            0
        }
        Err(err) => report_planning_error(&mut output_target, args.report, &err)?,
    };
    output_target.flush_inner()?;
    Ok(code)
}

fn report_planning_error(
    output_target: &mut OutputTarget,
    format: ReportFormat,
    err: &PlanningError,
) -> Result<i32> {
    if format == ReportFormat::Json {
        trip_report::generate_json_error(output_target, err)?;
    }

    if err.is_cycle_exceeded() {
        if format != ReportFormat::Json {
            writeln!(
                output_target,
                "{} {}",
                "⚠️  Compliance warning:".yellow().bold(),
                err
            )?;
            writeln!(
                output_target,
                "The driver needs a cycle restart before this trip can be delivered."
            )?;
        }
        return Ok(EXIT_CYCLE_EXCEEDED);
    }

    let hint = if err.is_user_correctable() {
        "check the trip and rule values"
    } else {
        "the planner produced an inconsistent schedule"
    };
    eprintln!("{} {err} ({hint})", "❌".red());
    Ok(EXIT_FAILURE)
}

fn run_scenarios(args: &Args, scenario_args: &ScenarioArgs) -> Result<i32> {
    if scenario_args.list {
        let mut output_target = OutputTarget::new(args.output.clone())?;
        writeln!(output_target.writer(), "Available scenarios:")?;
        for scenario in catalog_scenarios() {
            writeln!(
                output_target.writer(),
                "  {:25} - {:.0} mi, {:.1} h cycle used",
                scenario.name,
                scenario.input.distance_mi,
                scenario.input.cycle_hours_used_start
            )?;
        }
        output_target.flush_inner()?;
        return Ok(0);
    }

    let scenarios = expand_scenarios(&scenario_args.names)?;
    if args.report == ReportFormat::Console {
        announce_banner(&HosRules::default());
    }

    let start_time = Instant::now();
    let runner = ScenarioRunner::new(args.verbose);
    let results: Vec<_> = scenarios
        .iter()
        .map(|scenario| runner.run_scenario(scenario, scenario_args.iterations))
        .collect();

    let mut output_target = OutputTarget::new(args.output.clone())?;
    match args.report {
        ReportFormat::Console => {
            reports::generate_console_report(&mut output_target, &results, start_time.elapsed())?;
            writeln!(&mut output_target)?;
            writeln!(
                &mut output_target,
                "🏁 Total time: {:?}",
                start_time.elapsed()
            )?;
        }
        ReportFormat::Json => reports::generate_json_report(&mut output_target, &results)?,
        ReportFormat::Markdown => reports::generate_markdown_report(&mut output_target, &results)?,
        ReportFormat::Csv => reports::generate_csv_report(&mut output_target, &results)?,
    }
    output_target.flush_inner()?;

    Ok(if results.iter().all(|r| r.passed) {
        0
    } else {
        EXIT_FAILURE
    })
}

fn expand_scenarios(names: &str) -> Result<Vec<logic::PlanningScenario>> {
    let requested = split_csv(names);
    if requested.is_empty() || requested.iter().any(|name| name.eq_ignore_ascii_case("all")) {
        return Ok(catalog_scenarios());
    }
    requested
        .iter()
        .map(|name| find_scenario(name).with_context(|| format!("Unknown scenario: {name}")))
        .collect()
}

fn run_sweep(args: &Args, sweep_args: &SweepArgs) -> Result<i32> {
    let seeds = resolve_seed_inputs(&split_csv(&sweep_args.seeds))?;
    if sweep_args.iterations == 0 {
        bail!("--iterations must be at least 1");
    }
    let planner = load_planner(sweep_args.rules.as_deref())?;
    if args.report == ReportFormat::Console {
        announce_banner(planner.rules());
    }

    let start_time = Instant::now();
    let config = SweepConfig {
        seeds,
        iterations: sweep_args.iterations,
    };
    let summary = logic::run_sweep(&planner, &config);

    let mut output_target = OutputTarget::new(args.output.clone())?;
    match args.report {
        ReportFormat::Console => reports::generate_sweep_console_report(
            &mut output_target,
            &summary,
            start_time.elapsed(),
        )?,
        ReportFormat::Json => reports::generate_sweep_json_report(&mut output_target, &summary)?,
        ReportFormat::Markdown => {
            reports::generate_sweep_markdown_report(&mut output_target, &summary)?;
        }
        ReportFormat::Csv => reports::generate_sweep_csv_report(&mut output_target, &summary)?,
    }
    output_target.flush_inner()?;

    Ok(if summary.passed() { 0 } else { EXIT_FAILURE })
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "haulplan-main-{label}-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("haulplan").chain(argv.iter().copied())).unwrap()
    }

    fn plan_args(args: &Args) -> &PlanArgs {
        match &args.command {
            Command::Plan(plan_args) => plan_args,
            other => panic!("expected plan command, got {other:?}"),
        }
    }

    #[test]
    fn plan_flags_build_a_trip() {
        let args = parse(&[
            "plan",
            "--miles",
            "855",
            "--cycle-used",
            "14",
            "--speed",
            "50",
            "--driver",
            "R. Diaz",
            "--report",
            "json",
        ]);
        assert_eq!(args.report, ReportFormat::Json);
        let input = build_trip(plan_args(&args)).unwrap();
        assert!((input.distance_mi - 855.0).abs() < f64::EPSILON);
        assert!((input.cycle_hours_used_start - 14.0).abs() < f64::EPSILON);
        assert!((input.avg_speed_mph - 50.0).abs() < f64::EPSILON);
        assert_eq!(input.driver.driver_name, "R. Diaz");
        assert!((input.start_hour_of_day - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn plan_requires_miles_without_a_trip_file() {
        let err = Args::try_parse_from(["haulplan", "plan", "--cycle-used", "3"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn trip_file_fields_are_overridden_by_flags() {
        let path = temp_path("trip");
        std::fs::write(
            &path,
            r#"{"distance_mi": 640, "cycle_hours_used": 12, "driver": {"driver_name": "Sam"}}"#,
        )
        .unwrap();
        let path_arg = path.display().to_string();
        let args = parse(&["plan", "--trip", &path_arg, "--cycle-used", "20"]);
        let input = build_trip(plan_args(&args)).unwrap();
        assert!((input.distance_mi - 640.0).abs() < f64::EPSILON);
        assert!((input.cycle_hours_used_start - 20.0).abs() < f64::EPSILON);
        assert_eq!(input.driver.driver_name, "Sam");
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn start_date_accepts_iso_and_today() {
        assert_eq!(
            parse_start_date("2026-10-19").unwrap(),
            NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
        );
        assert!(parse_start_date("today").is_ok());
        assert!(parse_start_date("19/10/2026").is_err());
    }

    #[test]
    fn cycle_exhaustion_exits_with_distinct_code() {
        let output = temp_path("cycle");
        let output_arg = output.display().to_string();
        let args = parse(&[
            "plan",
            "--miles",
            "2000",
            "--cycle-used",
            "68",
            "--report",
            "json",
            "--output",
            &output_arg,
        ]);
        let code = run_plan(&args, plan_args(&args)).unwrap();
        assert_eq!(code, EXIT_CYCLE_EXCEEDED);
        let content = std::fs::read_to_string(&output).unwrap();
        assert!(content.contains("cycle_exceeded"));
        let _ = std::fs::remove_file(output);
    }

    #[test]
    fn invalid_trip_exits_with_failure() {
        let output = temp_path("invalid");
        let output_arg = output.display().to_string();
        let args = parse(&[
            "plan",
            "--miles",
            "500",
            "--cycle-used",
            "71",
            "--report",
            "csv",
            "--output",
            &output_arg,
        ]);
        assert_eq!(run_plan(&args, plan_args(&args)).unwrap(), EXIT_FAILURE);
        let _ = std::fs::remove_file(output);
    }

    #[test]
    fn scenario_names_expand() {
        assert_eq!(expand_scenarios("all").unwrap().len(), catalog_scenarios().len());
        let picked = expand_scenarios("short haul, Fuel Boundary").unwrap();
        assert_eq!(picked.len(), 2);
        assert!(expand_scenarios("moon run").is_err());
    }

    #[test]
    fn missing_rules_file_is_reported() {
        let err = load_planner(Some(&temp_path("no-rules"))).unwrap_err();
        assert!(format!("{err:#}").contains("failed to load rules"));
    }
}
