// CLI - Command Line Interface for the KratOs executor
// Principle: Simple, clear, composable commands

pub mod config;
pub mod runner;

pub use runner::RunnerError;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// KratOs executor - Deterministic transaction execution
#[derive(Parser, Debug)]
#[command(name = "kratos-exec")]
#[command(author = "KratOs Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Execute KratOs transactions against a genesis state")]
#[command(long_about = r#"
Runs transactions through the KratOs transaction executor.

Execute every block of a scenario and print receipts:
  kratos-exec run --scenario scenario.json

Simulate a read-only call against the scenario genesis:
  kratos-exec call --scenario scenario.json --from 0x... --to 0x... --data 0x...
"#)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true, default_value = "false")]
    pub verbose: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info", env = "KRATOS_LOG")]
    pub log_level: String,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute the blocks of a scenario
    Run(RunCmd),

    /// Local call against the scenario genesis state
    Call(CallCmd),

    /// Key management
    Key(KeyCmd),
}

/// Execute a scenario
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Scenario file (JSON)
    #[arg(short, long)]
    pub scenario: PathBuf,

    /// Chain configuration file, overrides the scenario's
    #[arg(long, env = "KRATOS_CHAIN")]
    pub chain: Option<PathBuf>,

    /// Include execution traces in the report
    #[arg(long)]
    pub traces: bool,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Simulate a call
#[derive(Parser, Debug)]
pub struct CallCmd {
    /// Scenario file (JSON) providing chain and genesis
    #[arg(short, long)]
    pub scenario: PathBuf,

    /// Caller address
    #[arg(long)]
    pub from: String,

    /// Callee address (contract creation if not specified)
    #[arg(long)]
    pub to: Option<String>,

    /// Value transferred
    #[arg(long, default_value = "0")]
    pub value: u128,

    /// Gas price
    #[arg(long, default_value = "0")]
    pub gas_price: u128,

    /// Gas limit
    #[arg(long, default_value = "6800000")]
    pub gas_limit: u64,

    /// Call data (hex)
    #[arg(long, default_value = "")]
    pub data: String,
}

/// Key management commands
#[derive(Parser, Debug)]
pub struct KeyCmd {
    #[command(subcommand)]
    pub subcommand: KeySubcommand,
}

#[derive(Subcommand, Debug)]
pub enum KeySubcommand {
    /// Generate a new Ed25519 keypair
    Generate {
        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (hex, json)
        #[arg(long, default_value = "json")]
        format: String,
    },

    /// Show the public key and address of a secret key
    Inspect {
        /// Secret key (hex) or key file
        key: String,
    },
}
