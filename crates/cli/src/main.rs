use crate::{
    error::CliError,
    shutdown::{ExitCode, ShutdownCoordinator},
};
use clap::Parser;
use commands::Commands;
use connectors::adapter::Adapter;
use engine_config::{document::ConvergeConfig, validated::ValidatedConfig};
use engine_runtime::execution::{executor, plan};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod conn;
mod error;
mod output;
mod shutdown;

#[derive(Parser)]
#[command(
    name = "schemaflow",
    version = "0.1.0",
    about = "Dependency-ordered schema convergence"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let shutdown = ShutdownCoordinator::new(CancellationToken::new());
    shutdown.register_handlers();

    let code = match run(cli.command, &shutdown).await {
        Ok(()) => ExitCode::Success,
        Err(CliError::TablesFailed(count)) => {
            error!("{count} table(s) failed to converge");
            ExitCode::Incomplete
        }
        Err(err) if shutdown.is_shutdown_requested() => {
            warn!("Stopped after shutdown request: {err}");
            ExitCode::ShutdownRequested
        }
        Err(err) => {
            error!("{err}");
            ExitCode::GeneralError
        }
    };

    std::process::exit(code.as_i32());
}

async fn run(command: Commands, shutdown: &ShutdownCoordinator) -> Result<(), CliError> {
    match command {
        Commands::Converge {
            config,
            conn_str,
            output,
        } => {
            let config = load_config(&config)?;
            let url = config.connection_url(conn_str.as_deref())?;
            let adapter = Adapter::connect(&url).await?;
            let settings = config.settings().clone();

            let report = executor::run(
                config.into_definitions(),
                adapter.schema(),
                settings,
                shutdown.cancel_token(),
            )
            .await?;

            println!("{report}");
            if let Some(path) = output {
                output::write_json(&report, &path).await?;
            }

            if shutdown.is_shutdown_requested() {
                return Err(CliError::ShutdownRequested);
            }
            let failed = report.failed().count();
            if failed > 0 {
                return Err(CliError::TablesFailed(failed));
            }
        }
        Commands::Check { config } => {
            let config = load_config(&config)?;
            for finding in config.findings() {
                println!("{finding}");
            }
            println!(
                "Configuration is valid: {} table(s)",
                config.definitions().len()
            );
        }
        Commands::Plan { config, output } => {
            let config = load_config(&config)?;
            let plan = plan::plan(config.definitions().to_vec(), config.settings()).await?;

            match output {
                Some(path) => output::write_json(&plan, &path).await?,
                None => {
                    for statement in &plan.statements {
                        println!("{statement}");
                    }
                    if !plan.report.is_success() {
                        println!("-- incomplete plan:\n{}", plan.report);
                    }
                }
            }
        }
        Commands::TestConn { conn_str } => {
            conn::ping(&conn_str).await?;
        }
    }

    Ok(())
}

fn load_config(path: &str) -> Result<ValidatedConfig, CliError> {
    info!("Loading convergence config: {path}");
    Ok(ConvergeConfig::from_file(path)?.validate()?)
}
