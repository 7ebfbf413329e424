//! RBAC management CLI
//!
//! Manages the assignment storage and inspects the access hierarchy.
//!
//! ```bash
//! export RBAC_DATA_FILE=rbac.yaml
//! rbac init
//! rbac assign admin 42
//! rbac check 42 edit
//! ```
//!
//! Set `RUST_LOG=debug` for verbose logging on stderr.

mod args;
mod commands;

use clap::Parser;
use std::process::ExitCode;

use args::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match commands::run(cli, &mut std::io::stdout()).await {
        Ok(outcome) => outcome.into(),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
