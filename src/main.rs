//! Loan Approval - Main Entry Point

use clap::Parser;
use colored::Colorize;
use loan_approval::cli::{run, Cli};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "loan_approval=info".into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!();
        eprintln!("  {} {:#}", "error".red().bold(), e);
        eprintln!();
        std::process::exit(1);
    }
}
