use anyhow::Result;
use dotenv::dotenv;
use log::{error, info, warn};

use l2m_ingest_rust::config::Config;
use l2m_ingest_rust::pipeline::{process_game, GameOutcome, PgCallStore};
use tracker_rust_core::cache::{list_cached_game_ids, load_report};
use tracker_rust_core::clients::nba_stats::NbaStatsClient;
use tracker_rust_core::clients::openai::OpenAiClient;
use tracker_rust_core::db::{create_pool, DbPoolConfig};
use tracker_rust_core::quota::QuotaBreaker;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env()?;

    let pool_config = DbPoolConfig::from_env_with_defaults(DbPoolConfig::default());
    let pool = create_pool(&config.database_url, &pool_config).await?;

    let classifier = OpenAiClient::new(config.openai_api_key.clone())?;
    let officials = NbaStatsClient::new()?;
    let store = PgCallStore::new(pool);
    let breaker = QuotaBreaker::new();

    let mut game_ids = list_cached_game_ids(&config.reports_dir)?;
    if game_ids.is_empty() {
        info!(
            "No cached reports found in {}. Nothing to do.",
            config.reports_dir.display()
        );
        return Ok(());
    }
    info!(
        "Found {} cached L2M reports in {}",
        game_ids.len(),
        config.reports_dir.display()
    );
    if config.ingest_limit > 0 && config.ingest_limit < game_ids.len() {
        info!("Processing only the first {} reports", config.ingest_limit);
        game_ids.truncate(config.ingest_limit);
    }

    let total = game_ids.len();
    let mut attempted = 0usize;
    let mut total_rows_inserted = 0u64;

    for game_id in &game_ids {
        if breaker.is_tripped() {
            warn!("Quota exhausted earlier in the run. Halting further processing.");
            break;
        }

        info!("--- Processing game_id {} ---", game_id);
        let report = match load_report(&config.reports_dir, game_id) {
            Ok(report) => report,
            Err(e) => {
                error!("Could not load report for game_id {}: {:#}. Skipping.", game_id, e);
                attempted += 1;
                continue;
            }
        };

        let outcome =
            process_game(game_id, &report, &classifier, &officials, &store, &breaker).await;
        if outcome == GameOutcome::SkippedMalformed {
            warn!("Report for game_id {} is malformed. Skipped.", game_id);
        }
        total_rows_inserted += outcome.rows_written();
        attempted += 1;
    }

    info!("--- Ingestion complete ---");
    if let Some(reason) = breaker.trip_reason() {
        warn!(
            "OpenAI quota was exhausted during the run ({}); remaining games were not processed.",
            reason
        );
    }
    info!("Attempted {}/{} reports.", attempted, total);
    info!("Total calls inserted across all games: {}.", total_rows_inserted);

    Ok(())
}
