//! Per-game ingestion pipeline: normalize -> classify -> officials -> replace.
//!
//! One game is processed fully before the next begins. No failure in here
//! escapes to abort the run; each stage degrades according to its policy and
//! the outcome is reported so the outer loop can keep a tally.

use anyhow::Result;
use async_trait::async_trait;
use log::{error, info, warn};
use sqlx::PgPool;
use tracker_rust_core::clients::nba_stats::NbaStatsClient;
use tracker_rust_core::clients::openai::{ClassifyError, OpenAiClient};
use tracker_rust_core::db::calls;
use tracker_rust_core::models::{CandidateRecord, OfficialsInfo, RawL2mReport, StoredCallRecord};
use tracker_rust_core::quota::QuotaBreaker;
use tracker_rust_core::report::normalize_report;

/// Team attribution boundary. The real implementation talks to OpenAI;
/// tests substitute fakes.
#[async_trait]
pub trait CallClassifier: Send + Sync {
    async fn classify_plays(
        &self,
        game_id: &str,
        plays: &[CandidateRecord],
    ) -> Result<Vec<CandidateRecord>, ClassifyError>;
}

#[async_trait]
impl CallClassifier for OpenAiClient {
    async fn classify_plays(
        &self,
        game_id: &str,
        plays: &[CandidateRecord],
    ) -> Result<Vec<CandidateRecord>, ClassifyError> {
        OpenAiClient::classify_plays(self, game_id, plays).await
    }
}

/// Officials lookup boundary. Never fails; lookup problems surface as empty
/// slots.
#[async_trait]
pub trait OfficialsSource: Send + Sync {
    async fn game_officials(&self, game_id: &str) -> OfficialsInfo;
}

#[async_trait]
impl OfficialsSource for NbaStatsClient {
    async fn game_officials(&self, game_id: &str) -> OfficialsInfo {
        self.fetch_game_officials(game_id).await
    }
}

/// Persistent store boundary for the `calls` table.
#[async_trait]
pub trait CallStore: Send + Sync {
    async fn delete_game(&self, game_id: &str) -> Result<u64>;
    async fn insert_calls(&self, records: &[StoredCallRecord]) -> Result<u64>;
}

pub struct PgCallStore {
    pool: PgPool,
}

impl PgCallStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CallStore for PgCallStore {
    async fn delete_game(&self, game_id: &str) -> Result<u64> {
        calls::delete_game_calls(&self.pool, game_id).await
    }

    async fn insert_calls(&self, records: &[StoredCallRecord]) -> Result<u64> {
        calls::insert_game_calls(&self.pool, records).await
    }
}

/// How one game's ingestion ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    /// Report had no `l2m` play list; nothing written.
    SkippedMalformed,
    /// Report parsed but contained no plays; store untouched.
    NoPlays,
    /// Existing rows could not be cleared; insert skipped for this game.
    DeleteFailed,
    /// Game fully processed; number of rows written (0 on insert failure).
    Inserted(u64),
}

impl GameOutcome {
    pub fn rows_written(&self) -> u64 {
        match self {
            GameOutcome::Inserted(n) => *n,
            _ => 0,
        }
    }
}

/// Run the full pipeline for one game. Delete-then-insert keeps re-runs
/// idempotent; the delete must succeed before any insert is attempted.
pub async fn process_game(
    game_id: &str,
    report: &RawL2mReport,
    classifier: &dyn CallClassifier,
    officials: &dyn OfficialsSource,
    store: &dyn CallStore,
    breaker: &QuotaBreaker,
) -> GameOutcome {
    let candidates = match normalize_report(report) {
        Ok(candidates) => candidates,
        Err(e) => {
            warn!("Skipping game_id {}: {}", game_id, e);
            return GameOutcome::SkippedMalformed;
        }
    };

    if candidates.is_empty() {
        info!("No plays to process for game_id {}", game_id);
        return GameOutcome::NoPlays;
    }

    let augmented = if breaker.is_tripped() {
        warn!(
            "Skipping AI classification for game_id {} (quota breaker tripped)",
            game_id
        );
        candidates
    } else {
        match classifier.classify_plays(game_id, &candidates).await {
            Ok(augmented) => augmented,
            Err(ClassifyError::QuotaExhausted(msg)) => {
                error!(
                    "Quota exhausted while classifying game_id {}: {}",
                    game_id, msg
                );
                breaker.trip(&msg);
                candidates
            }
            Err(e) => {
                error!(
                    "AI classification failed for game_id {}: {}. Using unaugmented plays.",
                    game_id, e
                );
                candidates
            }
        }
    };

    let officials_info = officials.game_officials(game_id).await;

    if let Err(e) = store.delete_game(game_id).await {
        error!(
            "Failed to delete existing calls for game_id {}: {:#}. Skipping insert.",
            game_id, e
        );
        return GameOutcome::DeleteFailed;
    }

    let records = calls::build_records(game_id, &augmented, &officials_info);
    if records.is_empty() {
        info!("No insertable calls for game_id {}", game_id);
        return GameOutcome::Inserted(0);
    }

    match store.insert_calls(&records).await {
        Ok(written) => {
            info!("Inserted {} calls for game_id {}", written, game_id);
            GameOutcome::Inserted(written)
        }
        Err(e) => {
            error!(
                "Insert failed for game_id {}: {:#}. Counting 0 rows for this game.",
                game_id, e
            );
            GameOutcome::Inserted(0)
        }
    }
}
