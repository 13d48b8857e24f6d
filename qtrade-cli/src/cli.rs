use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use questrade_api::account::OrderStateFilter;

#[derive(Parser, Debug)]
#[command(name = "qtrade")]
#[command(about = "Query accounts and place orders through the Questrade REST API")]
#[command(version)]
pub struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "QTRADE_CONFIG")]
    pub config: Option<PathBuf>,

    /// One-time refresh token generated in the Questrade API hub
    #[arg(long, global = true, env = "QTRADE_REFRESH_TOKEN", hide_env_values = true)]
    pub refresh_token: Option<String>,

    /// Log every request and response
    #[arg(long, global = true)]
    pub log_requests: bool,

    /// Print JSON on a single line
    #[arg(long, global = true)]
    pub compact: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the server time
    Time,

    /// List accounts
    Accounts,

    /// List positions of an account
    Positions { account: String },

    /// Show balances of an account
    Balances { account: String },

    /// List executions of an account
    Executions {
        account: String,
        #[command(flatten)]
        day: DayArg,
    },

    /// List orders of an account
    Orders {
        account: String,
        #[command(flatten)]
        day: DayArg,

        /// Order state filter (All, Open, Closed)
        #[arg(long, default_value_t = OrderStateFilter::All)]
        state: OrderStateFilter,

        /// Only this order
        #[arg(long)]
        order_id: Option<i64>,
    },

    /// List activities of an account
    Activities {
        account: String,
        #[command(flatten)]
        day: DayArg,
    },

    /// Search symbols by prefix
    Search {
        prefix: String,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },

    /// Resolve tickers (or ids) to symbol ids; -1 means not found
    Resolve {
        #[arg(required = true)]
        symbols: Vec<String>,
    },

    /// Place an order using the configured order defaults
    Order {
        account: String,
        /// Ticker or symbol id
        symbol: String,
        quantity: u64,
        /// Limit price
        #[arg(long)]
        price: Option<f64>,
    },

    /// Show the state of the stored credential
    Token,

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Reset configuration to defaults
        #[arg(long)]
        reset: bool,
    },
}

#[derive(clap::Args, Debug, Clone, Copy)]
pub struct DayArg {
    /// Local day to query (YYYY-MM-DD), today by default
    #[arg(long)]
    pub date: Option<NaiveDate>,
}
