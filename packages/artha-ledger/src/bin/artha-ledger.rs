//! ArthaDhan ledger CLI - drive a paper-trading session from the shell.
//!
//! Every run starts from a fresh in-memory ledger; output is JSON wrapped in
//! `ApiResponse`, matching what the dashboard API returns.

use anyhow::{bail, Context};
use artha_ledger::{
    ApiResponse, DashboardView, LedgerConfig, LedgerEngine, RandomNoise, SystemClock,
    TradeRequest,
};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "artha-ledger")]
#[command(about = "ArthaDhan paper-trading ledger")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ARTHA_LEDGER_CONFIG or the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Start from the demo book instead of an empty account
    #[arg(long, global = true)]
    demo: bool,

    /// Seed the price drift for a reproducible run
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Render dashboard display strings instead of raw numbers
    #[arg(long, global = true)]
    view: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the account state
    State,
    /// Execute trades in order, then print each fill and the final state
    Session {
        /// ACTION:TICKER:QTY:PRICE[:TYPE], e.g. BUY:RELIANCE:10:2450:LIMIT
        #[arg(short, long = "trade", required = true)]
        trades: Vec<String>,
    },
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let output = match run(cli) {
        Ok(value) => serde_json::to_string_pretty(&ApiResponse::ok(value)),
        Err(e) => {
            tracing::error!("{:#}", e);
            serde_json::to_string_pretty(&ApiResponse::<()>::err(format!("{:#}", e)))
        }
    };

    match output {
        Ok(text) => println!("{}", text),
        Err(e) => {
            eprintln!("failed to encode output: {}", e);
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<serde_json::Value> {
    let mut config = match &cli.config {
        Some(path) => LedgerConfig::load_from_path(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => LedgerConfig::load().context("loading ledger config")?,
    };
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }

    let noise = match config.seed {
        Some(seed) => RandomNoise::seeded(seed),
        None => RandomNoise::from_entropy(),
    };
    let mut ledger = if cli.demo {
        LedgerEngine::demo(config, noise, SystemClock)
    } else {
        LedgerEngine::with_sources(config, noise, SystemClock)
    };
    tracing::info!("Ledger ready with {} open positions", ledger.positions().len());

    match cli.command {
        Commands::State => render_state(&mut ledger, cli.view),
        Commands::Session { trades } => {
            let mut fills = Vec::with_capacity(trades.len());
            for raw in &trades {
                let request = parse_trade(raw)?;
                let response = ledger
                    .execute_request(&request)
                    .with_context(|| format!("trade {raw:?} rejected"))?;
                fills.push(response);
            }
            Ok(json!({
                "fills": fills,
                "state": render_state(&mut ledger, cli.view)?,
            }))
        }
    }
}

fn render_state(ledger: &mut LedgerEngine, view: bool) -> anyhow::Result<serde_json::Value> {
    let state = ledger.state();
    let value = if view {
        serde_json::to_value(DashboardView::from_state(&state))?
    } else {
        serde_json::to_value(state)?
    };
    Ok(value)
}

fn parse_trade(raw: &str) -> anyhow::Result<TradeRequest> {
    let parts: Vec<&str> = raw.split(':').map(str::trim).collect();
    let (action, ticker, qty, price, order_type) = match parts.as_slice() {
        [action, ticker, qty, price] => (*action, *ticker, *qty, *price, "MARKET"),
        [action, ticker, qty, price, order_type] => (*action, *ticker, *qty, *price, *order_type),
        _ => bail!("expected ACTION:TICKER:QTY:PRICE[:TYPE], got {raw:?}"),
    };

    Ok(TradeRequest {
        ticker: ticker.to_string(),
        action: action.to_string(),
        qty: qty
            .parse()
            .with_context(|| format!("bad quantity {qty:?}"))?,
        price: price
            .parse()
            .with_context(|| format!("bad price {price:?}"))?,
        order_type: order_type.to_string(),
    })
}
