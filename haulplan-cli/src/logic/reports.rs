use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

use super::scenarios::ScenarioResult;
use super::sweep::SweepSummary;
use crate::util::csv_field;

#[allow(clippy::cast_precision_loss)]
fn success_rate(passed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (passed as f64 / total as f64) * 100.0
}

pub fn generate_console_report<W: Write>(
    writer: &mut W,
    results: &[ScenarioResult],
    total_duration: Duration,
) -> Result<()> {
    writeln!(writer)?;
    writeln!(writer, "{}", "📊 Scenario Results Summary".bright_cyan().bold())?;
    writeln!(writer, "{}", "===========================".cyan())?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();
    let failed_tests = total_tests - passed_tests;

    writeln!(writer, "Total scenarios: {total_tests}")?;
    writeln!(writer, "Passed: {}", passed_tests.to_string().green())?;
    writeln!(writer, "Failed: {}", failed_tests.to_string().red())?;
    writeln!(
        writer,
        "Success rate: {:.1}%",
        success_rate(passed_tests, total_tests)
    )?;
    writeln!(writer, "Total time: {total_duration:?}")?;
    writeln!(writer)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };

        writeln!(writer, "{} {}", status, result.scenario_name.bold())?;
        writeln!(
            writer,
            "   Iterations: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(writer, "   Average time: {:?}", result.average_duration)?;

        if !result.failures.is_empty() {
            writeln!(writer, "   Failures:")?;
            for failure in &result.failures {
                writeln!(writer, "     • {}", failure.red())?;
            }
        }
        writeln!(writer)?;
    }

    let fastest = results.iter().min_by_key(|r| r.average_duration);
    let slowest = results.iter().max_by_key(|r| r.average_duration);
    if let (Some(fastest), Some(slowest)) = (fastest, slowest) {
        writeln!(writer, "{}", "⚡ Performance Summary".bright_yellow().bold())?;
        writeln!(writer, "{}", "=====================".yellow())?;
        writeln!(
            writer,
            "Fastest: {} ({:?})",
            fastest.scenario_name.green(),
            fastest.average_duration
        )?;
        writeln!(
            writer,
            "Slowest: {} ({:?})",
            slowest.scenario_name.yellow(),
            slowest.average_duration
        )?;
    }
    Ok(())
}

pub fn generate_json_report<W: Write>(writer: &mut W, results: &[ScenarioResult]) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, results)?;
    writeln!(writer)?;
    Ok(())
}

pub fn generate_markdown_report<W: Write>(
    writer: &mut W,
    results: &[ScenarioResult],
) -> Result<()> {
    writeln!(writer, "# Haulplan Scenario Results\n")?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();
    let failed_tests = total_tests - passed_tests;

    writeln!(writer, "## Summary\n")?;
    writeln!(writer, "- **Total scenarios**: {total_tests}")?;
    writeln!(writer, "- **Passed**: {passed_tests}")?;
    writeln!(writer, "- **Failed**: {failed_tests}")?;
    writeln!(
        writer,
        "- **Success rate**: {:.1}%\n",
        success_rate(passed_tests, total_tests)
    )?;

    writeln!(writer, "## Detailed Results\n")?;

    for result in results {
        let status = if result.passed { "✅" } else { "❌" };

        writeln!(writer, "### {} {}\n", status, result.scenario_name)?;
        writeln!(
            writer,
            "- **Iterations**: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(writer, "- **Average time**: {:?}", result.average_duration)?;

        if !result.failures.is_empty() {
            writeln!(writer, "- **Failures**:")?;
            for failure in &result.failures {
                writeln!(writer, "  - {failure}")?;
            }
        }
        writeln!(writer)?;
    }
    Ok(())
}

pub fn generate_csv_report<W: Write>(writer: &mut W, results: &[ScenarioResult]) -> Result<()> {
    writeln!(
        writer,
        "scenario,passed,iterations,successful,average_us,first_failure"
    )?;
    for result in results {
        writeln!(
            writer,
            "{},{},{},{},{},{}",
            csv_field(&result.scenario_name),
            result.passed,
            result.iterations_run,
            result.successful_iterations,
            result.average_duration.as_micros(),
            csv_field(result.failures.first().map_or("", String::as_str))
        )?;
    }
    Ok(())
}

pub fn generate_sweep_console_report<W: Write>(
    writer: &mut W,
    summary: &SweepSummary,
    total_duration: Duration,
) -> Result<()> {
    writeln!(writer)?;
    writeln!(writer, "{}", "🎲 Compliance Sweep".bright_cyan().bold())?;
    writeln!(writer, "{}", "===================".cyan())?;
    for seed in &summary.seeds {
        writeln!(
            writer,
            "Seed {:>20}: {} trips, {} planned, {} cycle-exhausted, {} failed",
            seed.seed,
            seed.trips,
            seed.planned.to_string().green(),
            seed.cycle_exceeded.to_string().yellow(),
            seed.failures.to_string().red()
        )?;
    }
    writeln!(writer, "Trips: {}", summary.total_trips())?;
    writeln!(writer, "Digest: {}", summary.digest.bright_white())?;
    writeln!(writer, "Total time: {total_duration:?}")?;
    if summary.passed() {
        writeln!(writer, "{}", "✅ Every schedule passed its audit".green())?;
    } else {
        writeln!(writer, "{}", "❌ Failures:".red())?;
        for failure in &summary.failures {
            writeln!(writer, "   • {}", failure.red())?;
        }
    }
    Ok(())
}

pub fn generate_sweep_json_report<W: Write>(writer: &mut W, summary: &SweepSummary) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, summary)?;
    writeln!(writer)?;
    Ok(())
}

pub fn generate_sweep_markdown_report<W: Write>(
    writer: &mut W,
    summary: &SweepSummary,
) -> Result<()> {
    writeln!(writer, "# Haulplan Compliance Sweep\n")?;
    writeln!(writer, "| Seed | Trips | Planned | Cycle exhausted | Failed | Digest |")?;
    writeln!(writer, "|------|-------|---------|-----------------|--------|--------|")?;
    for seed in &summary.seeds {
        writeln!(
            writer,
            "| {} | {} | {} | {} | {} | `{}` |",
            seed.seed, seed.trips, seed.planned, seed.cycle_exceeded, seed.failures, seed.digest
        )?;
    }
    writeln!(writer, "\n**Digest**: `{}`", summary.digest)?;
    for failure in &summary.failures {
        writeln!(writer, "- {failure}")?;
    }
    Ok(())
}

pub fn generate_sweep_csv_report<W: Write>(writer: &mut W, summary: &SweepSummary) -> Result<()> {
    writeln!(writer, "seed,trips,planned,cycle_exceeded,failures,digest")?;
    for seed in &summary.seeds {
        writeln!(
            writer,
            "{},{},{},{},{},{}",
            seed.seed, seed.trips, seed.planned, seed.cycle_exceeded, seed.failures, seed.digest
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::sweep::SeedSummary;

    fn sample_results() -> Vec<ScenarioResult> {
        vec![
            ScenarioResult {
                scenario_name: "Short Haul".to_string(),
                passed: true,
                iterations_run: 2,
                successful_iterations: 2,
                failures: Vec::new(),
                average_duration: Duration::from_micros(120),
            },
            ScenarioResult {
                scenario_name: "Broken, On Purpose".to_string(),
                passed: false,
                iterations_run: 1,
                successful_iterations: 0,
                failures: vec!["iteration 0: expected two days".to_string()],
                average_duration: Duration::from_micros(340),
            },
        ]
    }

    fn sample_sweep() -> SweepSummary {
        SweepSummary {
            seeds: vec![SeedSummary {
                seed: 1337,
                trips: 4,
                planned: 3,
                cycle_exceeded: 1,
                failures: 0,
                digest: "ab".repeat(32),
            }],
            failures: Vec::new(),
            digest: "cd".repeat(32),
        }
    }

    fn to_string<F>(write: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> Result<()>,
    {
        let mut buffer = Vec::new();
        write(&mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn console_report_summarizes_pass_and_fail() {
        colored::control::set_override(false);
        let results = sample_results();
        let text = to_string(|w| generate_console_report(w, &results, Duration::from_millis(5)));
        assert!(text.contains("Total scenarios: 2"));
        assert!(text.contains("Success rate: 50.0%"));
        assert!(text.contains("❌ FAIL Broken, On Purpose"));
        assert!(text.contains("Fastest: Short Haul"));
    }

    #[test]
    fn markdown_and_csv_reports() {
        let results = sample_results();
        let markdown = to_string(|w| generate_markdown_report(w, &results));
        assert!(markdown.starts_with("# Haulplan Scenario Results"));
        assert!(markdown.contains("### ✅ Short Haul"));
        assert!(markdown.contains("  - iteration 0: expected two days"));

        let csv = to_string(|w| generate_csv_report(w, &results));
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[2].starts_with("\"Broken, On Purpose\",false,1,0,340,"));
    }

    #[test]
    fn empty_results_do_not_divide_by_zero() {
        let text = to_string(|w| generate_console_report(w, &[], Duration::ZERO));
        assert!(text.contains("Success rate: 0.0%"));
        assert!(!text.contains("Fastest"));
    }

    #[test]
    fn sweep_reports_carry_digest() {
        let summary = sample_sweep();
        let json = to_string(|w| generate_sweep_json_report(w, &summary));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["seeds"][0]["seed"], 1337);
        assert_eq!(value["digest"], "cd".repeat(32));

        let csv = to_string(|w| generate_sweep_csv_report(w, &summary));
        assert!(csv.lines().nth(1).unwrap().starts_with("1337,4,3,1,0,"));

        let markdown = to_string(|w| generate_sweep_markdown_report(w, &summary));
        assert!(markdown.contains(&format!("**Digest**: `{}`", "cd".repeat(32))));

        colored::control::set_override(false);
        let console =
            to_string(|w| generate_sweep_console_report(w, &summary, Duration::from_millis(1)));
        assert!(console.contains("Every schedule passed"));
    }
}
