//! Renderers for a single planned trip: console log sheet, JSON response,
//! Markdown and one CSV row per timeline entry.
use anyhow::Result;
use chrono::{Days, NaiveDate};
use colored::Colorize;
use serde::Serialize;
use std::io::Write;

use haulplan_engine::{
    DayLog, DutyStatus, HosRules, PlanningError, ScheduleResult, TripInput, format_clock_time,
};

use crate::util::csv_field;

/// Everything a trip renderer needs.
#[derive(Debug, Clone, Copy)]
pub struct TripReport<'a> {
    pub input: &'a TripInput,
    pub rules: &'a HosRules,
    pub result: &'a ScheduleResult,
    pub start_date: Option<NaiveDate>,
}

impl TripReport<'_> {
    fn day_date(&self, day: &DayLog) -> Option<NaiveDate> {
        calendar_date(self.start_date, day.day_num)
    }

    fn day_heading(&self, day: &DayLog) -> String {
        match self.day_date(day) {
            Some(date) => format!("Day {} ({})", day.day_num, date.format("%a %Y-%m-%d")),
            None => format!("Day {}", day.day_num),
        }
    }
}

/// Calendar date of `day_num` (1-based) when the trip starts on `start`.
#[must_use]
pub fn calendar_date(start: Option<NaiveDate>, day_num: u32) -> Option<NaiveDate> {
    start?.checked_add_days(Days::new(u64::from(day_num.saturating_sub(1))))
}

#[must_use]
pub fn cycle_rule_label(rules: &HosRules) -> String {
    format!("{:.0}-hour/{}-day", rules.cycle_limit_hrs, rules.cycle_days)
}

const fn status_code(status: DutyStatus) -> &'static str {
    match status {
        DutyStatus::OffDuty => "OFF",
        DutyStatus::Sleeper => "SB",
        DutyStatus::Driving => "D",
        DutyStatus::OnDuty => "ON",
    }
}

#[derive(Serialize)]
struct JsonMeta<'a> {
    driver_name: &'a str,
    carrier_name: &'a str,
    cycle_rule: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_date: Option<String>,
}

#[derive(Serialize)]
struct JsonRoute {
    distance_mi: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_s: Option<f64>,
}

#[derive(Serialize)]
struct JsonTrip<'a> {
    meta: JsonMeta<'a>,
    route: JsonRoute,
    #[serde(flatten)]
    schedule: &'a ScheduleResult,
}

pub fn generate_json_report<W: Write>(writer: &mut W, report: &TripReport<'_>) -> Result<()> {
    let body = JsonTrip {
        meta: JsonMeta {
            driver_name: &report.input.driver.driver_name,
            carrier_name: &report.input.driver.carrier_name,
            cycle_rule: cycle_rule_label(report.rules),
            start_date: report.start_date.map(|date| date.to_string()),
        },
        route: JsonRoute {
            distance_mi: report.input.distance_mi,
            duration_s: report.input.duration_s,
        },
        schedule: report.result,
    };
    serde_json::to_writer_pretty(&mut *writer, &body)?;
    writeln!(writer)?;
    Ok(())
}

pub fn generate_console_report<W: Write>(writer: &mut W, report: &TripReport<'_>) -> Result<()> {
    let stats = &report.result.trip_stats;
    writeln!(writer)?;
    writeln!(writer, "{}", "📋 Driver Daily Logs".bright_cyan().bold())?;
    writeln!(writer, "{}", "====================".cyan())?;
    let driver = &report.input.driver;
    if !driver.driver_name.is_empty() || !driver.carrier_name.is_empty() {
        writeln!(
            writer,
            "Driver: {}  Carrier: {}",
            driver.driver_name, driver.carrier_name
        )?;
    }

    for day in &report.result.days {
        writeln!(writer)?;
        writeln!(
            writer,
            "{}  {:.1} mi  driving {:.2} h  on duty {:.2} h  off {:.2} h  sleeper {:.2} h",
            report.day_heading(day).bold(),
            day.driven_miles,
            day.totals.driving,
            day.totals.on_duty,
            day.totals.off_duty,
            day.totals.sleeper
        )?;
        for entry in &day.timeline {
            let code = match entry.status {
                DutyStatus::Driving => status_code(entry.status).green(),
                DutyStatus::OnDuty => status_code(entry.status).yellow(),
                DutyStatus::OffDuty | DutyStatus::Sleeper => status_code(entry.status).blue(),
            };
            writeln!(
                writer,
                "   {:>8} - {:>8}  {:<3}  {:>5.2} h  {}",
                format_clock_time(entry.start),
                format_clock_time(entry.end),
                code,
                entry.duration(),
                entry.note.as_deref().unwrap_or_default()
            )?;
        }
        writeln!(
            writer,
            "   Recap: {:.2} h on duty today, {:.2} h used, {:.2} h available",
            day.recap.on_duty_today, day.recap.cycle_used, day.recap.cycle_available
        )?;
    }

    writeln!(writer)?;
    writeln!(writer, "{}", "⛽ Stops".bright_yellow().bold())?;
    writeln!(writer, "{}", "========".yellow())?;
    if report.result.fuel_stops.is_empty() && report.result.rest_stops.is_empty() {
        writeln!(writer, "No fuel stops or breaks needed.")?;
    }
    for stop in &report.result.fuel_stops {
        writeln!(
            writer,
            "Fuel   day {} at {} ({:.1} mi in)",
            stop.day, stop.time_str, stop.miles_in
        )?;
    }
    for stop in &report.result.rest_stops {
        writeln!(
            writer,
            "Break  day {} at {} ({:.1} mi in)",
            stop.day, stop.time_str, stop.miles_in
        )?;
    }

    writeln!(writer)?;
    writeln!(writer, "{}", "📊 Trip Summary".bright_cyan().bold())?;
    writeln!(writer, "{}", "===============".cyan())?;
    writeln!(writer, "Total miles: {:.1}", stats.total_miles)?;
    writeln!(writer, "Driving hours: {:.2}", stats.total_driving_hrs)?;
    writeln!(writer, "On-duty hours: {:.2}", stats.total_on_duty_hrs)?;
    writeln!(writer, "Trip days: {}", stats.trip_days)?;
    writeln!(writer, "Fuel stops: {}", stats.fuel_stops)?;
    writeln!(writer, "Breaks: {}", stats.rest_stops)?;
    writeln!(writer, "Average speed: {:.1} mph", stats.avg_speed_mph)?;
    writeln!(
        writer,
        "Cycle ({}): {:.2} h at start, {} h remaining",
        cycle_rule_label(report.rules),
        stats.cycle_used_start,
        format!("{:.2}", stats.cycle_remaining).green()
    )?;
    Ok(())
}

pub fn generate_markdown_report<W: Write>(writer: &mut W, report: &TripReport<'_>) -> Result<()> {
    let stats = &report.result.trip_stats;
    writeln!(writer, "# Trip Plan\n")?;
    writeln!(writer, "## Summary\n")?;
    writeln!(writer, "- **Distance**: {:.1} mi", stats.total_miles)?;
    writeln!(writer, "- **Driving**: {:.2} h", stats.total_driving_hrs)?;
    writeln!(writer, "- **Days**: {}", stats.trip_days)?;
    writeln!(writer, "- **Fuel stops**: {}", stats.fuel_stops)?;
    writeln!(writer, "- **Breaks**: {}", stats.rest_stops)?;
    writeln!(
        writer,
        "- **Cycle**: {} ({:.2} h used at start, {:.2} h remaining)\n",
        cycle_rule_label(report.rules),
        stats.cycle_used_start,
        stats.cycle_remaining
    )?;

    writeln!(writer, "## Daily Logs\n")?;
    for day in &report.result.days {
        writeln!(writer, "### {}\n", report.day_heading(day))?;
        writeln!(writer, "| Start | End | Status | Hours | Note |")?;
        writeln!(writer, "|-------|-----|--------|-------|------|")?;
        for entry in &day.timeline {
            writeln!(
                writer,
                "| {} | {} | {} | {:.2} | {} |",
                format_clock_time(entry.start),
                format_clock_time(entry.end),
                entry.status,
                entry.duration(),
                entry.note.as_deref().unwrap_or_default()
            )?;
        }
        writeln!(
            writer,
            "\n- **Miles**: {:.1}\n- **Cycle used**: {:.2} h\n",
            day.driven_miles, day.recap.cycle_used
        )?;
    }

    if !report.result.fuel_stops.is_empty() || !report.result.rest_stops.is_empty() {
        writeln!(writer, "## Stops\n")?;
        for stop in &report.result.fuel_stops {
            writeln!(
                writer,
                "- ⛽ Fuel, day {} at {} ({:.1} mi)",
                stop.day, stop.time_str, stop.miles_in
            )?;
        }
        for stop in &report.result.rest_stops {
            writeln!(
                writer,
                "- ☕ Break, day {} at {} ({:.1} mi)",
                stop.day, stop.time_str, stop.miles_in
            )?;
        }
    }
    Ok(())
}

pub fn generate_csv_report<W: Write>(writer: &mut W, report: &TripReport<'_>) -> Result<()> {
    writeln!(writer, "day,date,status,start,end,hours,note")?;
    for day in &report.result.days {
        let date = report
            .day_date(day)
            .map(|date| date.to_string())
            .unwrap_or_default();
        for entry in &day.timeline {
            writeln!(
                writer,
                "{},{},{},{:.4},{:.4},{:.4},{}",
                day.day_num,
                date,
                entry.status,
                entry.start,
                entry.end,
                entry.duration(),
                csv_field(entry.note.as_deref().unwrap_or_default())
            )?;
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct JsonPlanningError {
    kind: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    day: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    at_hour: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    miles_completed: Option<f64>,
}

#[derive(Serialize)]
struct JsonErrorBody {
    error: JsonPlanningError,
}

const fn error_kind(err: &PlanningError) -> &'static str {
    match err {
        PlanningError::InvalidInput(_) => "invalid_input",
        PlanningError::InvalidRules(_) => "invalid_rules",
        PlanningError::CycleExceeded { .. } => "cycle_exceeded",
        PlanningError::InternalInvariantViolation(_) => "internal",
    }
}

/// Emit a planning failure as a JSON error object.
pub fn generate_json_error<W: Write>(writer: &mut W, err: &PlanningError) -> Result<()> {
    let (day, at_hour, miles_completed) = match err {
        PlanningError::CycleExceeded {
            day,
            at_hour,
            miles_completed,
            ..
        } => (Some(*day), Some(*at_hour), Some(*miles_completed)),
        _ => (None, None, None),
    };
    let body = JsonErrorBody {
        error: JsonPlanningError {
            kind: error_kind(err),
            message: err.to_string(),
            day,
            at_hour,
            miles_completed,
        },
    };
    serde_json::to_writer_pretty(&mut *writer, &body)?;
    writeln!(writer)?;
    Ok(())
}
