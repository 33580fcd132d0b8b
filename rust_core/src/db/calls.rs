//! `calls` table operations: per-game delete and batch insert.
//!
//! Expected schema:
//!
//! ```sql
//! CREATE TABLE calls (
//!     game_id             TEXT NOT NULL,
//!     period              INTEGER NOT NULL,
//!     time                TEXT NOT NULL,
//!     call_type           TEXT NOT NULL,
//!     decision            TEXT NOT NULL,
//!     is_correct_decision BOOLEAN NOT NULL,
//!     description         TEXT NOT NULL,
//!     team_favored        TEXT,
//!     team_penalized      TEXT,
//!     ref_1               TEXT,
//!     ref_2               TEXT,
//!     ref_3               TEXT
//! );
//! ```
//!
//! A game's record set is always fully replaced: the ingest pipeline deletes
//! by game_id first and only then inserts, which makes re-ingestion of the
//! same report idempotent. The two steps are not wrapped in a transaction;
//! a delete failure must block the insert (the caller enforces that).

use crate::models::{CandidateRecord, OfficialsInfo, StoredCallRecord};
use anyhow::{Context, Result};
use sqlx::{PgPool, QueryBuilder};
use tracing::{info, warn};

/// Delete all stored calls for a game. Failure here is fatal for the game:
/// inserting over stale rows would duplicate records.
pub async fn delete_game_calls(pool: &PgPool, game_id: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM calls WHERE game_id = $1")
        .bind(game_id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to delete existing calls for game_id {}", game_id))?;

    info!(
        "Deleted {} existing calls for game_id {}",
        result.rows_affected(),
        game_id
    );
    Ok(result.rows_affected())
}

/// Merge candidates with the officials slots into insertable rows. Any
/// candidate missing one of the required fields is dropped with a warning;
/// it cannot be represented in the table.
pub fn build_records(
    game_id: &str,
    candidates: &[CandidateRecord],
    officials: &OfficialsInfo,
) -> Vec<StoredCallRecord> {
    let mut records = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let (time, call_type, decision, is_correct, description) = match (
            &candidate.time,
            &candidate.call_type,
            candidate.decision,
            candidate.is_correct_decision,
            &candidate.description,
        ) {
            (Some(t), Some(ct), Some(d), Some(ic), Some(desc)) => (t, ct, d, ic, desc),
            _ => {
                warn!(
                    "Skipping play for game_id {} due to missing critical fields: {:?}",
                    game_id, candidate
                );
                continue;
            }
        };

        records.push(StoredCallRecord {
            game_id: game_id.to_string(),
            period: candidate.period,
            time: time.clone(),
            call_type: call_type.clone(),
            decision: decision.as_str().to_string(),
            is_correct_decision: is_correct,
            description: description.clone(),
            team_favored: candidate.team_favored.clone(),
            team_penalized: candidate.team_penalized.clone(),
            ref_1: officials.ref_1.clone(),
            ref_2: officials.ref_2.clone(),
            ref_3: officials.ref_3.clone(),
        });
    }
    records
}

/// Insert one game's records as a single multi-row statement. Returns the
/// number of rows written.
pub async fn insert_game_calls(pool: &PgPool, records: &[StoredCallRecord]) -> Result<u64> {
    if records.is_empty() {
        return Ok(0);
    }

    let mut qb: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(
        "INSERT INTO calls (game_id, period, time, call_type, decision, is_correct_decision, \
         description, team_favored, team_penalized, ref_1, ref_2, ref_3) ",
    );
    qb.push_values(records, |mut b, r| {
        b.push_bind(r.game_id.clone())
            .push_bind(r.period)
            .push_bind(r.time.clone())
            .push_bind(r.call_type.clone())
            .push_bind(r.decision.clone())
            .push_bind(r.is_correct_decision)
            .push_bind(r.description.clone())
            .push_bind(r.team_favored.clone())
            .push_bind(r.team_penalized.clone())
            .push_bind(r.ref_1.clone())
            .push_bind(r.ref_2.clone())
            .push_bind(r.ref_3.clone());
    });

    let result = qb
        .build()
        .execute(pool)
        .await
        .context("Batch insert into calls failed")?;

    info!("Inserted {} calls", result.rows_affected());
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DecisionCode;

    fn full_candidate() -> CandidateRecord {
        CandidateRecord {
            period: 4,
            time: Some("0:46.2".to_string()),
            call_type: Some("Foul: Shooting".to_string()),
            decision: Some(DecisionCode::IC),
            is_correct_decision: Some(false),
            description: Some("contact on the shot".to_string()),
            source_cp: Some("Holiday, Jrue (BOS)".to_string()),
            source_dp: Some("Nembhard, Andrew (IND)".to_string()),
            source_pos_team_id: None,
            team_favored: Some("IND".to_string()),
            team_penalized: Some("BOS".to_string()),
        }
    }

    fn officials() -> OfficialsInfo {
        OfficialsInfo {
            ref_1: Some("Scott Foster".to_string()),
            ref_2: Some("Tony Brothers".to_string()),
            ref_3: None,
        }
    }

    #[test]
    fn builds_rows_and_merges_officials() {
        let records = build_records("0042300101", &[full_candidate()], &officials());
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.game_id, "0042300101");
        assert_eq!(r.decision, "IC");
        assert!(!r.is_correct_decision);
        assert_eq!(r.team_penalized.as_deref(), Some("BOS"));
        assert_eq!(r.ref_1.as_deref(), Some("Scott Foster"));
        assert!(r.ref_3.is_none());
    }

    #[test]
    fn drops_candidates_missing_required_fields() {
        let mut no_time = full_candidate();
        no_time.time = None;
        let mut no_decision = full_candidate();
        no_decision.decision = None;
        no_decision.is_correct_decision = None;
        let mut no_description = full_candidate();
        no_description.description = None;

        let records = build_records(
            "0042300101",
            &[no_time, full_candidate(), no_decision, no_description],
            &officials(),
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].time, "0:46.2");
    }

    #[test]
    fn player_context_fields_are_not_persisted() {
        let records = build_records("0042300101", &[full_candidate()], &officials());
        let json = serde_json::to_value(&records[0]).unwrap();
        assert!(json.get("source_CP").is_none());
        assert!(json.get("source_DP").is_none());
        assert!(json.get("source_posTeamId").is_none());
    }
}
