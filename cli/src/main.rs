//! statebench automation driver
//!
//! Iterates the adapter x scenario matrix against a deterministic dataset,
//! writes one JSON artifact per cell into a dated results directory, and
//! exits non-zero when any cell errored. Validation runs as a pre-flight
//! gate before any comparative numbers are produced.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use statebench_adapters::default_registry;
use statebench_harness::config::Config;
use statebench_harness::dataset::RootState;
use statebench_harness::{
    run_and_report, validate_all, AdapterRegistry, BenchmarkSession, RunnerConfig, ScenarioKind,
    StandardizedReport, StoreAdapter,
};

#[derive(Parser)]
#[command(name = "statebench")]
#[command(about = "Cross-library state-store benchmark driver")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "statebench.toml")]
    config: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full adapter x scenario matrix
    Run {
        /// Restrict to one adapter
        #[arg(short, long)]
        adapter: Option<String>,

        /// Restrict to one scenario
        #[arg(short, long)]
        scenario: Option<String>,

        /// Counted runs per cell
        #[arg(short, long)]
        runs: Option<usize>,

        /// Output directory (overrides config)
        #[arg(short, long)]
        output: Option<String>,

        /// Run the matrix even when validation fails
        #[arg(long)]
        force: bool,
    },
    /// Run a single (adapter, scenario) cell and print the report
    Single {
        adapter: String,
        scenario: String,

        /// Counted runs
        #[arg(short, long)]
        runs: Option<usize>,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        file: Option<String>,
    },
    /// List registered adapters and the scenario catalogue
    List,
    /// Validate every registered adapter and report pass/fail
    Validate,
    /// Generate a sample configuration file
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    let config = load_config(&cli.config)?;
    config.validate().context("invalid configuration")?;

    match cli.command {
        Commands::Run {
            adapter,
            scenario,
            runs,
            output,
            force,
        } => {
            run_matrix_command(&config, adapter, scenario, runs, output, force).await?;
        }
        Commands::Single {
            adapter,
            scenario,
            runs,
            file,
        } => {
            run_single_command(&config, &adapter, &scenario, runs, file.as_deref()).await?;
        }
        Commands::List => {
            list_command();
        }
        Commands::Validate => {
            validate_command()?;
        }
        Commands::Config => {
            let path = "statebench.toml";
            Config::default().save_to_file(path)?;
            info!("generated sample configuration: {path}");
        }
    }

    Ok(())
}

fn load_config(path: &str) -> Result<Config> {
    if Path::new(path).exists() {
        Config::load_from_file(path).with_context(|| format!("loading {path}"))
    } else {
        Config::load_from_env().context("reading environment overrides")
    }
}

fn runner_config(config: &Config, runs: Option<usize>) -> RunnerConfig {
    let mut runner = config.runner_config();
    if let Some(runs) = runs {
        runner.runs = runs;
    }
    runner
}

async fn run_matrix_command(
    config: &Config,
    adapter_filter: Option<String>,
    scenario_filter: Option<String>,
    runs: Option<usize>,
    output: Option<String>,
    force: bool,
) -> Result<()> {
    let registry = default_registry();

    let adapters: Vec<String> = match adapter_filter {
        Some(name) => vec![registry.get(&name)?.name().to_string()],
        None => registry.names(),
    };
    let scenarios: Vec<ScenarioKind> = match scenario_filter {
        Some(name) => vec![name.parse()?],
        None => ScenarioKind::ALL.to_vec(),
    };

    preflight(&registry, force)?;

    let out_dir = PathBuf::from(output.unwrap_or_else(|| config.output.directory.clone()))
        .join(Utc::now().format("%Y-%m-%d").to_string());
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating results directory {}", out_dir.display()))?;

    let initial = Arc::new(config.dataset.generate());
    let runner = runner_config(config, runs);
    let mut session = BenchmarkSession::new();

    let bar = ProgressBar::new((adapters.len() * scenarios.len()) as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
            .context("invalid progress template")?,
    );

    let mut reports = Vec::new();
    let mut failures = Vec::new();
    for adapter in &adapters {
        for scenario in &scenarios {
            bar.set_message(format!("{adapter} / {scenario}"));
            match run_cell(
                &mut session,
                &registry,
                adapter,
                *scenario,
                &initial,
                &runner,
                &out_dir,
            )
            .await
            {
                Ok(report) => reports.push(report),
                Err(e) => {
                    warn!(adapter = %adapter, scenario = %scenario, "cell failed: {e:#}");
                    failures.push(format!("{adapter}/{scenario}: {e:#}"));
                }
            }
            bar.inc(1);
        }
    }
    bar.finish_with_message("done");

    if config.output.write_csv_summary && !reports.is_empty() {
        let csv_path = out_dir.join("summary.csv");
        fs::write(&csv_path, reports_to_csv(&reports))
            .with_context(|| format!("writing {}", csv_path.display()))?;
        info!("summary written to {}", csv_path.display());
    }

    info!(
        "matrix finished: {} succeeded, {} failed",
        reports.len(),
        failures.len()
    );
    if !failures.is_empty() {
        bail!("{} matrix cell(s) failed:\n{}", failures.len(), failures.join("\n"));
    }
    Ok(())
}

async fn run_cell(
    session: &mut BenchmarkSession,
    registry: &AdapterRegistry,
    adapter: &str,
    scenario: ScenarioKind,
    initial: &Arc<RootState>,
    runner: &RunnerConfig,
    out_dir: &Path,
) -> Result<StandardizedReport> {
    let report = run_and_report(
        session,
        registry,
        Some(adapter),
        Some(&scenario.to_string()),
        initial.clone(),
        runner,
    )
    .await?;

    let file = out_dir.join(format!("{adapter}__{scenario}.json"));
    fs::write(&file, report.to_json()?).with_context(|| format!("writing {}", file.display()))?;
    info!(
        "{adapter} / {scenario}: {:.2} ms, {:.1} renders, p95 {:.3} ms",
        report.result.average.execution_time,
        report.result.average.render_count,
        report.result.average.latency.p95
    );
    Ok(report)
}

async fn run_single_command(
    config: &Config,
    adapter: &str,
    scenario: &str,
    runs: Option<usize>,
    file: Option<&str>,
) -> Result<()> {
    let registry = default_registry();
    let initial = Arc::new(config.dataset.generate());
    let runner = runner_config(config, runs);
    let mut session = BenchmarkSession::new();

    let report = run_and_report(
        &mut session,
        &registry,
        Some(adapter),
        Some(scenario),
        initial,
        &runner,
    )
    .await?;

    let json = report.to_json()?;
    match file {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("writing {path}"))?;
            info!("report written to {path}");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn list_command() {
    println!("adapters:");
    for adapter in default_registry().iter() {
        if adapter.wraps_components() {
            println!("  - {} (wraps components)", adapter.name());
        } else {
            println!("  - {}", adapter.name());
        }
    }
    println!("\nscenarios:");
    for scenario in ScenarioKind::ALL {
        println!("  - {scenario}");
    }
}

fn validate_command() -> Result<()> {
    let results = validate_all(&default_registry());
    let mut failed = 0;
    for result in &results {
        let status = if result.passed { "PASS" } else { "FAIL" };
        println!("[{status}] {}", result.adapter_name);
        for error in &result.errors {
            println!("         {error}");
        }
        if !result.passed {
            failed += 1;
        }
    }
    if failed > 0 {
        bail!("{failed} adapter(s) failed validation");
    }
    Ok(())
}

fn preflight(registry: &AdapterRegistry, force: bool) -> Result<()> {
    let results = validate_all(registry);
    let failed: Vec<&str> = results
        .iter()
        .filter(|r| !r.passed)
        .map(|r| r.adapter_name.as_str())
        .collect();
    if failed.is_empty() {
        info!("all {} adapters passed validation", results.len());
        return Ok(());
    }
    if force {
        warn!("continuing despite failed validation: {}", failed.join(", "));
        return Ok(());
    }
    bail!(
        "validation failed for {} (run `statebench validate` for details, or pass --force)",
        failed.join(", ")
    );
}

fn reports_to_csv(reports: &[StandardizedReport]) -> String {
    let mut csv = String::from(
        "adapter,scenario,executionTimeMs,renderCount,memoryMb,fps,latencyP50Ms,latencyP95Ms,latencyP99Ms\n",
    );
    for report in reports {
        let average = &report.result.average;
        csv.push_str(&format!(
            "{},{},{:.4},{:.2},{:.4},{:.2},{:.4},{:.4},{:.4}\n",
            report.result.adapter,
            report.result.scenario,
            average.execution_time,
            average.render_count,
            average.memory_usage,
            average.fps,
            average.latency.p50,
            average.latency.p95,
            average.latency.p99,
        ));
    }
    csv
}
