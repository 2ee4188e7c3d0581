//! CLI argument definitions for FerroFX.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `rate` | Fetch rates of one or more quote currencies |
//! | `convert` | Convert an amount at a fetched rate |
//! | `latest` | Show the latest CBR publication time |
//! | `providers` | List registered provider adapters |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--config` | none | TOML configuration file |
//! | `--provider` | from config | Provider key override |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--no-cache` | `false` | Bypass the rate cache |
//! | `--verbose` | `false` | Debug logging on stderr |
//!
//! # Examples
//!
//! ```bash
//! ferrofx rate RUB USD
//! ferrofx rate RUB USD EUR --date 2024-01-10 --pretty
//! ferrofx --provider exchange_rate_host convert 100 USD EUR
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// FerroFX - foreign-exchange rates from central-bank and REST providers.
#[derive(Debug, Parser)]
#[command(
    name = "ferrofx",
    author,
    version,
    about = "Foreign-exchange rates from central-bank and REST providers",
    long_about = "FerroFX fetches exchange rates from the Central Bank of Russia SOAP service, \
CurrencyFreaks and exchangerate.host behind one normalized interface.\n\
\n\
Settings come from an optional TOML file and FERROFX_* environment variables.\n\
\n\
Use 'ferrofx <command> --help' for command-specific help."
)]
pub struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Provider key, overriding configuration (cbr, currency_freaks, exchange_rate_host).
    #[arg(long, global = true)]
    pub provider: Option<String>,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Always fetch from the provider.
    #[arg(long, global = true, default_value_t = false)]
    pub no_cache: bool,

    /// Enable debug logging.
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch rates of one or more quote currencies against a base.
    ///
    /// A single quote prints one rate; several print a list in request
    /// order, leaving out quotes the provider did not publish.
    ///
    /// # Examples
    ///
    ///   ferrofx rate RUB USD
    ///   ferrofx rate RUB USD EUR CNY --date 2024-01-10
    Rate(RateArgs),

    /// Convert AMOUNT of QUOTE into BASE.
    ///
    /// # Examples
    ///
    ///   ferrofx convert 2.5 RUB USD
    ///   ferrofx --provider currency_freaks convert 100 USD EUR
    Convert(ConvertArgs),

    /// Show when the Central Bank of Russia last published rates.
    Latest,

    /// List registered provider adapters.
    Providers,
}

/// Arguments for the `rate` command.
#[derive(Debug, Args)]
pub struct RateArgs {
    /// Base currency code.
    pub base: String,

    /// Quote currency codes; crypto as SYMBOL@network.
    #[arg(required = true, num_args = 1..)]
    pub quotes: Vec<String>,

    /// Rate date as YYYY-MM-DD; defaults to today (UTC).
    #[arg(long)]
    pub date: Option<String>,
}

/// Arguments for the `convert` command.
#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Amount of the quote currency.
    pub amount: String,

    /// Base currency code.
    pub base: String,

    /// Quote currency code.
    pub quote: String,

    /// Rate date as YYYY-MM-DD; defaults to today (UTC).
    #[arg(long)]
    pub date: Option<String>,
}
