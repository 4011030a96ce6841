//! # courier-check
//!
//! Evaluates one cart snapshot against the courier limits for a city and
//! prints the decision as JSON.
//!
//! ```text
//! courier-check --cart cart.json --city Tallinn [--config courier.toml] [--suggest]
//! ```
//!
//! ## Log Levels
//! - `RUST_LOG=debug` - Show debug messages
//! - `RUST_LOG=courier_core=trace` - Show trace for the engine only
//! - Default: INFO, DEBUG for the courier crates
//!
//! Logs go to stderr so stdout stays machine readable.

mod report;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use courier_config::CourierConfig;
use courier_core::validation::validate_cart;
use courier_core::EligibilityChecker;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::report::{read_cart, Report};

/// Courier eligibility check for a cart snapshot
#[derive(Debug, Parser)]
#[command(name = "courier-check")]
#[command(about = "Decide whether a cart can go by courier", long_about = None)]
#[command(version)]
struct Cli {
    /// Cart snapshot (JSON array of lines, or an object with a `lines` array)
    #[arg(long)]
    cart: PathBuf,

    /// Destination city
    #[arg(long)]
    city: String,

    /// Config file path (defaults to the platform config directory)
    #[arg(short, long, env = "COURIER_CONFIG")]
    config: Option<PathBuf>,

    /// Also propose one edit that would fix the cart
    #[arg(long)]
    suggest: bool,

    /// Reject carts with blank ids, zero quantities or negative measurements
    #[arg(long)]
    strict: bool,

    /// Pretty-print the JSON report
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = CourierConfig::load(cli.config.clone()).context("Failed to load courier config")?;
    let limits = config.limits_for_city(&cli.city);
    info!(
        city = %cli.city,
        max_weight_kg = limits.max_weight_kg,
        max_items = limits.max_items,
        over_capacity = ?config.over_capacity(),
        "Limits resolved"
    );

    let lines = read_cart(&cli.cart)?;
    if let Err(e) = validate_cart(&lines) {
        if cli.strict {
            return Err(e).context("Cart snapshot rejected");
        }
        warn!("Cart snapshot is malformed, evaluating anyway: {}", e);
    }

    let checker = EligibilityChecker::new().over_capacity(config.over_capacity());
    let report = Report::build(&checker, &lines, &cli.city, &limits, cli.suggest);

    let json = if cli.pretty {
        serde_json::to_string_pretty(&report)
    } else {
        serde_json::to_string(&report)
    }
    .context("Failed to render report")?;
    println!("{}", json);

    Ok(())
}

/// Initializes the tracing subscriber on stderr.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,courier_core=debug,courier_config=debug,courier_check=debug")
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
