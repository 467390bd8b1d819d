// Password Vault - Application Entry Point
//
// Parses CLI arguments, initializes structured logging on stderr (stdout is
// reserved for command output), and dispatches to the command handler.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use password_vault::cli::{execute, Cli};

#[tokio::main]
async fn main() {
    // RUST_LOG=password_vault=debug for verbose output. Payloads are never logged.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("password_vault=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = execute(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
