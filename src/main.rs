//! hnmon - batched, cached view of Hypernative monitoring coverage

use clap::Parser;

mod cache;
mod cli;
mod client;
mod config;
mod dataset;
mod error;
mod models;
mod naming;
mod orchestrator;
mod output;
mod task;

use cli::args::GlobalOptions;
use cli::{CacheCommands, Cli, CommandContext, Commands, MonitorCommands};
use error::Result;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.debug { "warn,hnmon=debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .init();
    log::debug!("Debug logging enabled");

    let opts = GlobalOptions::from_cli(&cli);

    match cli.command {
        Commands::Init => cli::init::run(&opts).await,
        Commands::Status => cli::status::run(&opts).await,
        Commands::Version => {
            println!("hnmon version {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Monitors(MonitorCommands::List {
            refresh,
            client,
            limit,
            limit_suits,
        }) => {
            let ctx = CommandContext::new(&opts)?;
            cli::monitors::list(&ctx, refresh, client.as_deref(), limit, limit_suits).await
        }
        Commands::Cache(cache_cmd) => {
            let ctx = CommandContext::new(&opts)?;
            match cache_cmd {
                CacheCommands::Status => cli::cache::status(&ctx).await,
                CacheCommands::Clear => cli::cache::clear(&ctx).await,
                CacheCommands::Path => cli::cache::path(&ctx),
            }
        }
    }
}
