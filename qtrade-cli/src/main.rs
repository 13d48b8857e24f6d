mod cli;
mod commands;
mod config;
mod error;

use crate::{
    cli::{Args, Commands},
    commands::CommandExecutor,
    config::AppConfig,
    error::Result,
};
use clap::Parser;
use std::process;
use tracing::{Level, debug, error};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    if let Err(e) = run(args).await {
        error!("Application error: {}", e);
        println!("{}", e.to_json());
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let mut config = AppConfig::load(args.config.as_deref())?;
    if args.log_requests {
        config.client.log_requests = true;
    }
    debug!(?config, "Configuration loaded");

    if let Commands::Config { show, reset } = args.command {
        if reset {
            AppConfig::reset(args.config.as_deref())?;
            println!("Configuration reset to defaults");
        } else if show {
            println!("{}", config.show()?);
        } else {
            println!("Use --show to display current configuration or --reset to reset to defaults");
        }
        return Ok(());
    }

    let executor = CommandExecutor::new(config, args.refresh_token, args.compact)?;

    let result = match args.command {
        Commands::Time => executor.time().await,
        Commands::Accounts => executor.accounts().await,
        Commands::Positions { account } => executor.positions(&account).await,
        Commands::Balances { account } => executor.balances(&account).await,
        Commands::Executions { account, day } => executor.executions(&account, day).await,
        Commands::Orders {
            account,
            day,
            state,
            order_id,
        } => executor.orders(&account, day, state, order_id).await,
        Commands::Activities { account, day } => executor.activities(&account, day).await,
        Commands::Search { prefix, offset } => executor.search(&prefix, offset).await,
        Commands::Resolve { symbols } => executor.resolve(symbols).await,
        Commands::Order {
            account,
            symbol,
            quantity,
            price,
        } => {
            executor
                .place_order(&account, &symbol, quantity, price)
                .await
        }
        Commands::Token => executor.token().await,
        Commands::Config { .. } => Ok(()),
    };

    executor.save_symbol_cache();
    result
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    // stdout is reserved for command output.
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(verbose),
        )
        .init();
}
