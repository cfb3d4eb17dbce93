//! CLI definition and dispatch.

use clap::{Args, Parser, Subcommand};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::file_data_adapter::FileDataAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::adapters::simulation_engine::SimulationEngineAdapter;
use crate::adapters::statistical_engine::StatisticalEngineAdapter;
use crate::domain::analysis::AnalysisResult;
use crate::domain::config::{build_pipeline_config, validate_pipeline_config, PipelineConfig};
use crate::domain::error::FusetraderError;
use crate::domain::features::engineer_features;
use crate::domain::pipeline::Pipeline;
use crate::domain::report::CombinedReport;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(
    name = "fusetrader",
    about = "Moving-average backtest combined with external statistical and simulation engines"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every subcommand. Flags override the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct PipelineArgs {
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub data_file: Option<PathBuf>,
    #[arg(long)]
    pub file_type: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the full pipeline and print the results
    Run {
        #[command(flatten)]
        pipeline: PipelineArgs,
        /// Write the combined report as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Deadline for each external engine
        #[arg(long)]
        timeout_secs: Option<i64>,
    },
    /// Validate config and dataset without invoking the engines
    Check {
        #[command(flatten)]
        pipeline: PipelineArgs,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run {
            pipeline,
            output,
            timeout_secs,
        } => run_pipeline(&pipeline, output, timeout_secs),
        Command::Check { pipeline } => run_check(&pipeline),
    }
}

pub fn load_config(path: Option<&Path>) -> Result<FileConfigAdapter, FusetraderError> {
    match path {
        None => Ok(FileConfigAdapter::empty()),
        Some(path) => {
            FileConfigAdapter::from_file(path).map_err(|e| FusetraderError::ConfigParse {
                file: path.display().to_string(),
                reason: e.to_string(),
            })
        }
    }
}

/// Reads the config file, applies flag overrides and validates the result.
pub fn resolve_config(
    args: &PipelineArgs,
    output: Option<PathBuf>,
    timeout_secs: Option<i64>,
) -> Result<PipelineConfig, FusetraderError> {
    if let Some(path) = &args.config {
        eprintln!("Loading config from {}", path.display());
    }
    let adapter = load_config(args.config.as_deref())?;
    let mut config = build_pipeline_config(&adapter)?;

    if let Some(data_file) = &args.data_file {
        config.data_file = data_file.clone();
    }
    if let Some(file_type) = &args.file_type {
        config.file_type = file_type.clone();
    }
    if output.is_some() {
        config.output = output;
    }
    if let Some(secs) = timeout_secs {
        config.timeout_secs = secs;
    }

    validate_pipeline_config(&config)?;
    Ok(config)
}

fn fail(err: &FusetraderError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

pub fn run_pipeline(
    args: &PipelineArgs,
    output: Option<PathBuf>,
    timeout_secs: Option<i64>,
) -> ExitCode {
    // Stage 1: Resolve config
    let config = match resolve_config(args, output, timeout_secs) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };

    // Stage 2: Wire adapters
    let data_port = FileDataAdapter;
    let statistical = StatisticalEngineAdapter::rscript(
        &config.statistical_program,
        &config.statistical_script_path,
        &config.statistical_entry_point,
    );
    let simulation =
        SimulationEngineAdapter::for_program(&config.simulation_program, &config.simulation_script_path);
    let pipeline = Pipeline {
        data_port: &data_port,
        statistical: &statistical,
        simulation: &simulation,
        engine_timeout: config.engine_timeout(),
    };

    // Stage 3: Run
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => return fail(&FusetraderError::Io(e)),
    };
    eprintln!(
        "Running pipeline on {} ({})",
        config.data_file.display(),
        config.file_type
    );
    let run = match runtime.block_on(pipeline.run(&config.data_file, &config.file_type)) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    // Stage 4: Report
    print!("{}", format_summary(&run.report));

    if let Some(path) = &config.output {
        if let Err(e) = JsonReportAdapter.write(&run.report, path) {
            return fail(&e);
        }
        eprintln!("Report written to {}", path.display());
    }

    eprintln!("Finished in {:.2}s", run.elapsed.as_secs_f64());
    ExitCode::SUCCESS
}

pub fn run_check(args: &PipelineArgs) -> ExitCode {
    let config = match resolve_config(args, None, None) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    eprintln!("Config validated successfully");

    let dataset = match FileDataAdapter
        .load(&config.data_file, &config.file_type)
        .map_err(FusetraderError::from)
        .and_then(|ds| engineer_features(ds).map_err(FusetraderError::from))
    {
        Ok(ds) => ds,
        Err(e) => return fail(&e),
    };

    println!("Dataset: {}", config.data_file.display());
    println!("  rows:    {}", dataset.row_count());
    println!(
        "  columns: {}",
        dataset.column_names().collect::<Vec<_>>().join(", ")
    );
    println!(
        "Statistical script: {} ({})",
        config.statistical_script_path.display(),
        presence(&config.statistical_script_path)
    );
    println!(
        "Simulation script:  {} ({})",
        config.simulation_script_path.display(),
        presence(&config.simulation_script_path)
    );

    ExitCode::SUCCESS
}

fn presence(path: &Path) -> &'static str {
    if path.is_file() { "found" } else { "missing" }
}

/// Console rendering of a report: backtest metrics first, then both
/// external results as JSON.
pub fn format_summary(report: &CombinedReport) -> String {
    let metrics = report.backtest_results();
    let mut out = String::new();

    let _ = writeln!(out, "--- Backtesting Results ---");
    let _ = writeln!(out, "Total Return: {:.4}", metrics.total_return);
    let _ = writeln!(out, "Annualized Return: {:.4}", metrics.annualized_return);
    let _ = writeln!(out, "Annualized Volatility: {:.4}", metrics.annualized_volatility);
    let _ = writeln!(out, "Sharpe Ratio: {:.4}", metrics.sharpe_ratio);

    let _ = writeln!(out, "\n--- Statistical Analysis Results ---");
    let _ = writeln!(out, "{}", render_result(report.statistical_results()));
    let _ = writeln!(out, "\n--- Simulation Results ---");
    let _ = writeln!(out, "{}", render_result(report.simulation_results()));

    out
}

fn render_result(result: &AnalysisResult) -> String {
    serde_json::to_string_pretty(result).unwrap_or_else(|_| "{}".to_string())
}
