//! netblocks - Provider Netblock Resolver
//!
//! Prints the ranges found by walking SPF-style TXT records, one per line,
//! ready to pipe into `fw-updater allow`.

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use fw_updater::cli::ResolverCli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = ResolverCli::parse();

    // Setup logging based on verbosity. Diagnostics go to stderr; stdout
    // carries only the resolved ranges.
    let log_level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    fw_updater::commands::resolve::run(cli).await
}
