/// govbench CLI
///
/// Prepares benchmark scripts, executes them against the configured remote
/// transport, and reports harvested governor-limit usage.

use govbench_core::cli;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    if let Err(e) = cli::run_cli().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
