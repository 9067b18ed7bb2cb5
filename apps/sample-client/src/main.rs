mod contracts;
mod modules;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use channel_hub::{ChannelHub, ChannelSpec, config::layered_figment};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

use crate::contracts::{CompositeType, Service1Client};
use crate::modules::ServiceModule;

/// Sample client - resolves `sample.Service1` channels from configuration
#[derive(Parser)]
#[command(name = "sample-client")]
#[command(about = "Calls sample.Service1 through channels resolved by the channel hub")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/sample.yaml")]
    config: PathBuf,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Call the service
    Run {
        /// Value passed to `GetData`
        #[arg(long, default_value_t = 10)]
        value: i32,
    },
    /// Validate configuration, print the effective endpoint and exit
    Check,
}

fn init_logging(verbose: u8) {
    let default_directive = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    fmt().with_env_filter(env_filter).with_target(true).init();
}

fn build_hub(config: &Path) -> Result<ChannelHub> {
    if !config.is_file() {
        anyhow::bail!("config file does not exist: {}", config.display());
    }
    let hub = ChannelHub::from_figment(&layered_figment(config))
        .with_context(|| format!("loading {}", config.display()))?;
    hub.load(&ServiceModule)?;
    tracing::info!(
        endpoints = hub.catalog().len(),
        bindings = hub.binding_count(),
        "channel hub ready"
    );
    Ok(hub)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let hub = build_hub(&cli.config)?;

    match cli.command.unwrap_or(Commands::Run { value: 10 }) {
        Commands::Run { value } => run(&hub, value).await,
        Commands::Check => check(&hub),
    }
}

fn check(hub: &ChannelHub) -> Result<()> {
    println!("Configured endpoints:");
    for endpoint in hub.catalog().endpoints() {
        println!(
            "  {} -> {} ({}, binding: {})",
            endpoint.name,
            endpoint.address,
            endpoint.contract,
            endpoint.binding_configuration.as_deref().unwrap_or("default")
        );
    }

    let factory = hub.factory_for::<Service1Client>(&ChannelSpec::Default.identity())?;
    let endpoint = factory.endpoint();
    println!(
        "Service1 resolves to {} (open timeout {}s, send timeout {}s)",
        endpoint.address,
        endpoint.binding.open_timeout.as_secs(),
        endpoint.binding.send_timeout.as_secs()
    );
    println!("Configuration is valid");
    Ok(())
}

async fn run(hub: &ChannelHub, value: i32) -> Result<()> {
    let mut service1: Service1Client = hub.resolve()?;

    println!("{}", service1.get_data(value).await?);
    let composite = service1
        .get_data_using_data_contract(CompositeType {
            bool_value: true,
            string_value: "Hello world!".to_owned(),
        })
        .await?;
    println!("{}", composite.string_value);

    // Channels are short-lived; release this one as soon as the calls are done.
    drop(service1);
    Ok(())
}
