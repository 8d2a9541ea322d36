/// TennisArb — Arb Observer
///
/// Co dělá:
///   1. Každých N sekund stáhne live tennis feed (turnaje + zápasy)
///   2. Pro každý zápas stáhne odds ze všech geo variant (paralelně)
///   3. Sloučí je, najde nejlepší home/away cenu přes bookmakery → arb check
///   4. JSONL log + Telegram alert, simulovaný balance roste o profit cyklu
///
/// Co NEDĚLÁ: žádné sázky (observe only)
///
/// Spuštění:
///   cargo run --bin arb-observer -- <capital> <wait_time> <min_profit_percentage>

mod config;
mod cycle;

use anyhow::Result;
use config::Config;
use cycle::Observer;
use dotenv::dotenv;
use std::env;
use std::fs::File;
use tokio::time::{sleep, Duration};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cfg = Config::from_env_and_args()?;

    info!("=== TennisArb Observer — {} ===", cfg.sport);
    info!("Mode: OBSERVE ONLY (no bets)");
    info!(
        "Capital: {:.2} | Min profit: {}% | Interval: {}s",
        cfg.capital, cfg.min_profit_pct, cfg.poll_interval_secs
    );
    info!("Logs: {}", cfg.log_dir.display());
    if cfg.telegram.is_none() {
        warn!("TELEGRAM_BOT_TOKEN / TELEGRAM_CHANNEL_ID not set, alerts disabled");
    }

    // Single instance lock
    let lock_file_path = env::temp_dir().join("tennis_arb_observer.lock");
    let lock_file = match File::create(&lock_file_path) {
        Ok(f) => f,
        Err(e) => {
            warn!("Failed to create lock file at {:?}: {}", lock_file_path, e);
            return Ok(());
        }
    };

    let mut lock = fd_lock::RwLock::new(lock_file);
    let _write_guard = match lock.try_write() {
        Ok(guard) => {
            info!("Acquired single-instance lock.");
            guard
        }
        Err(_) => {
            warn!("Another instance of arb-observer is already running! Exiting.");
            return Ok(());
        }
    };

    let mut observer = Observer::new(&cfg);

    loop {
        info!("--- {} arb cycle ---", cfg.sport);

        match observer.run_cycle().await {
            Ok(report) => {
                for opp in &report.opportunities {
                    info!(
                        "  {} | {} vs {} | {:.2}%",
                        opp.tournament_name, opp.home_player, opp.away_player, opp.result.profit_percentage
                    );
                }
            }
            Err(e) => warn!("Cycle failed: {e:#}"),
        }
        info!("Balance: {:.2} | Sleeping for {}s", observer.balance(), cfg.poll_interval_secs);

        sleep(Duration::from_secs(cfg.poll_interval_secs)).await;
    }
}
