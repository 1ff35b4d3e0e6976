//! CLI entry point for codebench-etl

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;

use chrono::TimeDelta;
use clap::{ArgAction, Args, CommandFactory, FromArgMatches, Parser, Subcommand, ValueEnum};
use codebench_etl::extractors::split_bundle;
use codebench_etl::{
    CsvOutput, DatasetExtractor, ErrorScopeMode, ExtractorConfig, ProfileScanMode, RunReport,
    SolutionMetricsExtractor, print_report, print_report_json, write_report,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Color output mode
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum ColorMode {
    /// Auto-detect based on terminal and environment
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Determine whether to use color output based on mode and environment.
fn should_use_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => {
            // https://no-color.org/
            if std::env::var_os("NO_COLOR").is_some() {
                return false;
            }
            if std::env::var_os("FORCE_COLOR").is_some() {
                return true;
            }
            if std::env::var("TERM").map(|t| t == "dumb").unwrap_or(false) {
                return false;
            }
            std::io::stdout().is_terminal()
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "codebench-etl")]
#[command(about = "Extract a Codebench dataset into CSV tables")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG applies otherwise
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Walk a dataset and write the CSV tables and run report
    Extract(ExtractArgs),

    /// Split an instructor solution bundle into <exercise_id>.code files
    SplitSolutions {
        /// Bundle file with `<id> == SOLUCAO DO PROFESSOR ==>` headers
        bundle: PathBuf,

        /// Directory to write the solution files into
        dir: PathBuf,
    },
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// Dataset root (one subdirectory per period)
    dataset: PathBuf,

    /// Output directory for the CSV files
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    /// Folder of reference solutions (<exercise_id>.code) to compute metrics for
    #[arg(long, value_name = "DIR")]
    solutions: Option<PathBuf>,

    /// Inactivity threshold for implementation time
    /// Duration format: 30s, 5m, 1h
    #[arg(long, value_name = "DURATION", default_value = "5m")]
    inactivity: String,

    /// Tally error types per execution instead of globally
    #[arg(long = "scoped-errors")]
    scoped_errors: bool,

    /// Fall back to prefix-only matching for profiles with a shifted layout
    #[arg(long = "profile-fallback")]
    profile_fallback: bool,

    /// Skip code metrics
    #[arg(long = "no-metrics")]
    no_metrics: bool,

    /// Print the run report as JSON
    #[arg(long)]
    json: bool,

    /// Control color output: auto, always, never
    #[arg(long = "color", value_name = "WHEN", default_value = "auto")]
    color: ColorMode,
}

/// Parse a duration string like "90s", "5m" or "1h 30m".
fn parse_duration_string(s: &str) -> Result<TimeDelta, String> {
    let duration = humantime::parse_duration(s.trim()).map_err(|e| e.to_string())?;
    TimeDelta::from_std(duration).map_err(|e| e.to_string())
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| {
        eprintln!("codebench-etl: argument parsing error: {}", e);
        process::exit(1);
    });

    init_logging(cli.verbose);

    match cli.command {
        Command::Extract(args) => extract(args),
        Command::SplitSolutions { bundle, dir } => match split_bundle(&bundle, &dir) {
            Ok(written) => {
                info!(count = written.len(), dir = %dir.display(), "split solutions");
                println!("{} solutions written to {}", written.len(), dir.display());
            }
            Err(e) => {
                eprintln!("codebench-etl: cannot split '{}': {}", bundle.display(), e);
                process::exit(1);
            }
        },
    }
}

fn extract(args: ExtractArgs) {
    let inactivity_threshold = parse_duration_string(&args.inactivity).unwrap_or_else(|e| {
        eprintln!(
            "codebench-etl: invalid --inactivity duration '{}': {}",
            args.inactivity, e
        );
        process::exit(1);
    });

    let config = ExtractorConfig {
        inactivity_threshold,
        profile_scan_mode: if args.profile_fallback {
            ProfileScanMode::PrefixFallback
        } else {
            ProfileScanMode::Strict
        },
        error_scope: if args.scoped_errors {
            ErrorScopeMode::PerExecution
        } else {
            ErrorScopeMode::Global
        },
        compute_metrics: !args.no_metrics,
    };
    let error_scope = config.error_scope;

    let dataset = DatasetExtractor::new(config)
        .extract(&args.dataset)
        .unwrap_or_else(|e| {
            eprintln!(
                "codebench-etl: cannot access '{}': {}",
                args.dataset.display(),
                e
            );
            process::exit(1);
        });

    let mut report = RunReport::from_dataset(&dataset);

    let result = CsvOutput::create(&args.output).and_then(|out| {
        out.write_dataset(&dataset, error_scope)?;

        if let Some(dir) = &args.solutions {
            let solutions = SolutionMetricsExtractor::new()
                .extract_dir(dir)
                .unwrap_or_else(|e| {
                    eprintln!("codebench-etl: cannot access '{}': {}", dir.display(), e);
                    process::exit(1);
                });
            out.write_solutions(&solutions.value)?;
            report = std::mem::take(&mut report)
                .with_solutions(solutions.value.len(), &solutions.diagnostics);
        }

        write_report(out.dir(), &report)?;
        Ok(())
    });

    if let Err(e) = result {
        eprintln!(
            "codebench-etl: cannot write '{}': {}",
            args.output.display(),
            e
        );
        process::exit(1);
    }

    let printed = if args.json {
        print_report_json(&report)
    } else {
        print_report(&report, should_use_color(args.color))
    };
    if let Err(e) = printed {
        eprintln!("codebench-etl: error writing output: {}", e);
        process::exit(1);
    }
}
