use std::path::PathBuf;

use anyhow::Context;
use candlebot::api::{
    BinanceClient, BinanceOrderSink, CandleSource, MarketScenario, OrderSink, PaperOrderSink,
    SyntheticCandleSource,
};
use candlebot::indicators;
use candlebot::{Bot, BotConfig, BotController, KlineInterval};
use clap::Parser;

/// Candle-driven trading bot: indicators, signals and a FLAT/LONG position
#[derive(Debug, Parser)]
#[command(name = "candlebot", version, about)]
struct Args {
    /// Config file (defaults to ./candlebot.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Trading pair, e.g. BTCUSDT
    #[arg(short, long)]
    symbol: Option<String>,

    /// Kline interval, e.g. 1m, 15m, 1h
    #[arg(short, long)]
    interval: Option<KlineInterval>,

    /// Seconds between ticks
    #[arg(long)]
    tick_interval_secs: Option<u64>,

    /// Use the seeded synthetic feed instead of Binance
    #[arg(long)]
    synthetic: bool,

    /// Seed for the synthetic feed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Synthetic market shape: uptrend, downtrend, sideways, volatile
    #[arg(long, default_value = "sideways")]
    scenario: MarketScenario,

    /// Print the latest indicator snapshots as JSON and exit
    #[arg(long)]
    snapshot: bool,

    /// Send real signed orders instead of paper fills (testnet unless `testnet = false`)
    #[arg(long)]
    live: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    let mut args = Args::parse();
    let mut config = BotConfig::load(args.config.as_deref())?;
    if let Some(symbol) = args.symbol.take() {
        config.symbol = symbol;
    }
    if let Some(interval) = args.interval {
        config.interval = interval;
    }
    if let Some(secs) = args.tick_interval_secs {
        config.tick_interval_secs = secs;
    }
    config.validate()?;

    if args.synthetic {
        let source = SyntheticCandleSource::new(args.seed, args.scenario)
            .with_history(config.candle_limit, config.interval);
        with_sink(config, source, &args).await
    } else {
        let source = BinanceClient::new(config.api_base_url.clone(), config.request_timeout())
            .context("Failed to build market data client")?;
        with_sink(config, source, &args).await
    }
}

fn setup_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "candlebot=info,candlebot::strategy=debug".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn with_sink<S: CandleSource>(config: BotConfig, source: S, args: &Args) -> anyhow::Result<()> {
    if args.snapshot {
        return print_snapshots(&config, &source).await;
    }

    if args.live {
        let (key, secret) = config.credentials()?;
        tracing::warn!("⚠️  LIVE trading: orders go to {}", config.order_base_url());
        let sink =
            BinanceOrderSink::new(config.order_base_url(), key, secret, config.request_timeout())?;
        run(config, source, sink).await
    } else {
        tracing::info!("📝 Paper trading (pass --live to send real orders)");
        run(config, source, PaperOrderSink::new()).await
    }
}

async fn run<S: CandleSource, O: OrderSink>(
    config: BotConfig,
    source: S,
    sink: O,
) -> anyhow::Result<()> {
    tracing::info!("🚀 CandleBot starting");
    tracing::info!("\n📊 Configuration:");
    tracing::info!("  Symbol: {} ({})", config.symbol, config.interval);
    tracing::info!("  Quantity: {}", config.trade_quantity);
    tracing::info!("  Tick every: {}s", config.tick_interval_secs);
    tracing::info!(
        "  RSI bounds: {}/{}",
        config.signals.rsi_oversold,
        config.signals.rsi_overbought
    );

    let controller = BotController::new(Bot::new(config, source, sink));
    controller.start().await?;

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;
    tracing::info!("\n⚠️  Received Ctrl+C, shutting down...");

    let status = controller.status().await;
    controller.stop().await?;

    tracing::info!(
        "✅ Shutdown complete: {} ticks, final position {}",
        status.ticks,
        status
            .position
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    Ok(())
}

/// Market-data view: the most recent snapshots, oldest first
async fn print_snapshots<S: CandleSource>(config: &BotConfig, source: &S) -> anyhow::Result<()> {
    const SHOWN: usize = 5;

    let candles = source
        .fetch(&config.symbol, config.interval, config.candle_limit)
        .await
        .with_context(|| format!("Failed to fetch candles for {}", config.symbol))?;
    let snapshots = indicators::compute(&candles, &config.indicators);
    let start = snapshots.len().saturating_sub(SHOWN);

    println!("{}", serde_json::to_string_pretty(&snapshots[start..])?);
    Ok(())
}
