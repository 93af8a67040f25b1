use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};

use crate::benchmark::{
    detect_dialect, AbortPolicy, Benchmark, BenchmarkOptions, SchemaRegistry,
};
use crate::config::Config;
use crate::parser::analysis::ScriptAnalysis;
use crate::remote::CommandExecutor;
use crate::types::DebugOptions;

#[derive(Parser)]
#[command(name = "govbench")]
#[command(
    about = "Benchmark script snippets remotely and harvest governor-limit usage",
    long_about = None
)]
pub struct Cli {
    /// Path to config file (overrides default search)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Transport command (overrides config file and env vars)
    #[arg(long, global = true)]
    pub transport: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Inspect scripts offline: dialect, shape validation, external calls
    Check {
        /// Script files to inspect
        files: Vec<String>,
    },

    /// Prepare and execute benchmarks against the remote executor
    Run {
        /// Script files to benchmark
        files: Vec<String>,

        /// Action labels, one per measured section
        #[arg(short = 'a', long = "action")]
        actions: Vec<String>,

        /// Display name (defaults to the file stem)
        #[arg(long)]
        name: Option<String>,

        /// Script file to run as a control-only setup step
        #[arg(long)]
        setup: Option<String>,

        /// Stop at the first failed transaction
        #[arg(long)]
        fail_fast: bool,
    },
}

pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::builder()
        .config_path(cli.config.clone())
        .command(cli.transport.clone())
        .build()?;

    match cli.command {
        Commands::Check { files } => check_scripts(&files),
        Commands::Run {
            files,
            actions,
            name,
            setup,
            fail_fast,
        } => run_benchmarks(&config, files, actions, name, setup, fail_fast).await,
    }
}

/* ===================== Check ===================== */

fn check_scripts(files: &[String]) -> Result<()> {
    for file in files {
        let source = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read script '{}'", file))?;

        println!("{}", file);
        println!("   Dialect: {:?}", detect_dialect(&source));

        match ScriptAnalysis::parse(&source) {
            Ok(analysis) => {
                let calls = analysis.method_calls();
                println!("   External calls: {}", calls.external.len());
                for call in &calls.external {
                    println!(
                        "      {}{} (line {})",
                        call.target
                            .as_deref()
                            .map(|t| format!("{}.", t))
                            .unwrap_or_default(),
                        call.name,
                        call.location.line
                    );
                }
            }
            Err(e) => println!("   Parse failed: {}", e),
        }

        match Benchmark::from_source(&source, BenchmarkOptions::default()) {
            Ok(_) => println!("   Shape: ok"),
            Err(e) => println!("   Shape: {}", e),
        }
        println!();
    }
    Ok(())
}

/* ===================== Run ===================== */

async fn run_benchmarks(
    config: &Config,
    files: Vec<String>,
    actions: Vec<String>,
    name: Option<String>,
    setup: Option<String>,
    fail_fast: bool,
) -> Result<()> {
    let executor = CommandExecutor::from_config(&config.remote)?;
    let registry = Arc::new(SchemaRegistry::new());

    let setup_code = match &setup {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read setup script '{}'", path))?,
        ),
        None => None,
    };

    let abort_policy = if fail_fast || !config.benchmark.continue_on_error {
        Some(AbortPolicy::StopOnFirstError)
    } else {
        None
    };

    println!("Starting benchmark run at {}", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"));
    let started = Instant::now();
    let mut total_results = 0;
    let mut total_errors = 0;

    for file in &files {
        let source = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read script '{}'", file))?;

        let display_name = name.clone().unwrap_or_else(|| file_stem(file));
        let options = BenchmarkOptions {
            name: Some(display_name.clone()),
            actions: actions.clone(),
            setup: setup_code.clone(),
            abort_policy,
            debug: DebugOptions {
                log_level: None,
                capture_log: config.benchmark.capture_log,
            },
        };

        let mut benchmark = match Benchmark::with_registry(&source, options, registry.clone()) {
            Ok(benchmark) => benchmark,
            Err(e) => {
                println!("\n{} is not a valid benchmark script: {}", display_name, e);
                total_errors += 1;
                continue;
            }
        };

        let transaction_count = benchmark.prepare().len();
        println!(
            "\n{} ({:?} dialect, {} transactions)",
            display_name,
            benchmark.dialect(),
            transaction_count
        );

        benchmark.run(&executor).await;
        display_report(&benchmark);

        total_results += benchmark.results().len();
        total_errors += benchmark.errors().len();
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(
        "Done: {} results, {} errors in {:.2}s",
        total_results,
        total_errors,
        started.elapsed().as_secs_f64()
    );

    Ok(())
}

fn display_report(benchmark: &Benchmark) {
    for result in benchmark.results() {
        let limits = &result.limits;
        println!("   ✓ {}", result.action);
        println!(
            "      duration {}ms, cpu {}ms, heap {} bytes",
            limits.duration, limits.cpu_time, limits.heap_size
        );
        println!(
            "      queries {} ({} rows), db statements {} ({} rows), async jobs {}",
            limits.queries,
            limits.query_rows,
            limits.db_statements,
            limits.db_rows,
            limits.async_jobs
        );
    }
    for error in benchmark.errors() {
        println!("   ✗ {}: {}", error.action, error.error);
    }
}

fn file_stem(file: &str) -> String {
    Path::new(file)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.to_string())
}
