// KratOs Executor - Entry point

use clap::Parser;
use kratos_executor::cli::config::Scenario;
use kratos_executor::cli::runner::{call_scenario, generate_key, inspect_key, run_scenario, write_output};
use kratos_executor::cli::{Cli, Commands, KeySubcommand};
use kratos_executor::genesis::ChainConfig;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_filter = if cli.verbose { "debug" } else { &cli.log_level };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_filter)))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run(cmd) => {
            let mut scenario = Scenario::from_file(&cmd.scenario)?;
            if let Some(path) = &cmd.chain {
                scenario.chain = ChainConfig::from_file(path).map_err(|e| {
                    error!("Configuration error: {}", e);
                    anyhow::anyhow!("Configuration error: {}", e)
                })?;
            }
            info!("Running scenario {}", cmd.scenario.display());

            let report = run_scenario(&scenario, cmd.traces)?;
            write_output(cmd.output.as_deref(), &serde_json::to_string_pretty(&report)?)?;
        }

        Commands::Call(cmd) => {
            let scenario = Scenario::from_file(&cmd.scenario)?;
            let request = cmd.to_request()?;
            let report = call_scenario(&scenario, &request)?;
            write_output(None, &serde_json::to_string_pretty(&report)?)?;
        }

        Commands::Key(cmd) => match cmd.subcommand {
            KeySubcommand::Generate { output, format } => {
                info!("Generating ed25519 keypair");
                write_output(output.as_deref(), &generate_key(&format)?)?;
            }
            KeySubcommand::Inspect { key } => {
                write_output(None, &inspect_key(&key)?)?;
            }
        },
    }

    Ok(())
}
