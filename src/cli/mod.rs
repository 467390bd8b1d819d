// Password Vault - CLI Module
//
// Command-line interface using clap derive macros.
// Subcommands: init, invoke, serve.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{DATABASE_ENV, DEFAULT_TABLE_NAME, TABLE_NAME_ENV};

pub use commands::execute;

/// Password Vault - storage backend for client-side encrypted password entries.
#[derive(Parser, Debug)]
#[command(name = "password-vault")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Name of the backing table.
    #[arg(long, global = true, env = TABLE_NAME_ENV, default_value = DEFAULT_TABLE_NAME)]
    pub table_name: String,

    /// Path to the SQLite database file (default: platform data dir).
    #[arg(long, global = true, env = DATABASE_ENV)]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the database file and vault table if they do not exist.
    Init,

    /// Run a single request and print the response as JSON.
    ///
    /// The request is a JSON object with `authenticatedCallerId`, `action`
    /// and `payload`, as delivered by an upstream gateway.
    Invoke {
        /// File containing the request. Reads stdin when omitted.
        #[arg(long)]
        event: Option<PathBuf>,
    },

    /// Serve the vault over a Unix Domain Socket.
    Serve {
        /// Socket path (default: $XDG_RUNTIME_DIR/password-vault/vault.sock).
        #[arg(long)]
        socket: Option<PathBuf>,
    },
}

// ─── Tests ───────────────────────────────────────────────────────────────────
