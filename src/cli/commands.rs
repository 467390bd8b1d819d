// Password Vault - CLI Command Handlers
//
// Each function handles one CLI subcommand. They resolve configuration,
// open the SQLite-backed store and hand it to the vault service. The
// `serve` command starts the UDS gateway.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::VaultConfig;
use crate::error::PasswordVaultError;
use crate::gateway::{default_socket_path, malformed_request, UdsServer};
use crate::store::{Database, SqliteEntryStore};
use crate::vault::{VaultRequest, VaultResponse, VaultService};

use super::{Cli, Commands};

/// Execute the parsed CLI command.
pub async fn execute(cli: Cli) -> Result<(), PasswordVaultError> {
    let config = VaultConfig::new(&cli.table_name, cli.database)?;

    match cli.command {
        Commands::Init => cmd_init(&config),
        Commands::Invoke { event } => cmd_invoke(&config, event),
        Commands::Serve { socket } => cmd_serve(&config, socket).await,
    }
}

// ─── Init ────────────────────────────────────────────────────────────────────

fn cmd_init(config: &VaultConfig) -> Result<(), PasswordVaultError> {
    let _store = open_store(config)?;

    println!("✓ Password vault initialized");
    println!("  Database: {}", config.database_path.display());
    println!("  Table:    {}", config.table_name);

    Ok(())
}

// ─── Invoke ──────────────────────────────────────────────────────────────────

fn cmd_invoke(config: &VaultConfig, event: Option<PathBuf>) -> Result<(), PasswordVaultError> {
    let raw = match event {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let service = VaultService::new(open_store(config)?);
    let response = invoke_raw(&service, &raw);

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

/// Parse one request and run it. An unparseable event gets the same 400
/// the gateway sends for a malformed line.
fn invoke_raw(service: &VaultService<SqliteEntryStore>, raw: &str) -> VaultResponse {
    match serde_json::from_str::<VaultRequest>(raw) {
        Ok(request) => service.handle(request),
        Err(e) => {
            tracing::warn!(error = %e, "Rejected malformed event");
            malformed_request()
        }
    }
}

// ─── Serve ───────────────────────────────────────────────────────────────────

async fn cmd_serve(config: &VaultConfig, socket: Option<PathBuf>) -> Result<(), PasswordVaultError> {
    let service = Arc::new(VaultService::new(open_store(config)?));
    let socket_path = socket.unwrap_or_else(default_socket_path);

    println!("Starting password vault gateway at {}...", socket_path.display());
    println!("  Table: {}", config.table_name);

    UdsServer::new(service, socket_path).run().await
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Open the database named by the config, creating its directory and table.
fn open_store(config: &VaultConfig) -> Result<SqliteEntryStore, PasswordVaultError> {
    ensure_parent_dir(&config.database_path)?;

    let db = Database::open(&config.database_path, config.table_name.clone())?;
    tracing::debug!(
        database = %config.database_path.display(),
        table = %config.table_name,
        "Store opened"
    );

    Ok(SqliteEntryStore::new(db))
}

fn ensure_parent_dir(path: &Path) -> Result<(), PasswordVaultError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent)?;
            Ok(())
        }
        _ => Ok(()),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
