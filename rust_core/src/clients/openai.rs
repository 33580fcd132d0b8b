//! OpenAI chat-completions client used to attribute favored/penalized teams
//! to incorrect calls.
//!
//! The model only ever adds `team_favored`/`team_penalized`; all other fields
//! of each play are derived locally and kept authoritative. Any failure here
//! is recoverable: the caller falls back to the unaugmented records, so a
//! classifier outage never blocks ingestion.

use crate::models::CandidateRecord;
use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::Value;
use std::env;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

const SYSTEM_PROMPT: &str = "You are an expert NBA Last Two Minute (L2M) report analyst.\n\
You will be given a JSON object containing 'game_id_context' and 'plays_to_augment'.\n\
'plays_to_augment' is an array of play objects that already include 'period', 'time', \
'call_type', 'decision', 'is_correct_decision', 'description' and the original context \
fields 'source_CP' (committing player) and 'source_DP' (disadvantaged player).\n\
Your task is to ANALYZE EACH play object and ADD two new keys: 'team_favored' and 'team_penalized'.\n\
Return one JSON object with a single key \"augmented_plays\" whose value is the array of \
play objects, each now including 'team_favored' and 'team_penalized'.\n\
Rules:\n\
1. If 'is_correct_decision' is true (decision 'CC' or 'CNC'), both new keys MUST be null.\n\
2. If 'is_correct_decision' is false (decision 'IC' or 'INC'):\n\
   - 'source_CP' and 'source_DP' are strings like 'Player Name (TEAM_ABBREVIATION)'; \
extract the TEAM_ABBREVIATION.\n\
   - For 'IC' (incorrect call): 'team_penalized' is the team of the player in 'source_CP' \
(incorrectly called), 'team_favored' is the team of the player in 'source_DP'.\n\
   - For 'INC' (incorrect non-call): 'team_penalized' is the team of the player in 'source_DP' \
(disadvantaged by the missed call), 'team_favored' is the team of the player in 'source_CP'.\n\
   - If a team cannot be clearly determined from the provided context, set that key to null. \
Never guess.\n\
3. Preserve ALL original keys of every play and keep the array in its original order and length.";

/// Classification failure taxonomy. `QuotaExhausted` is the only variant the
/// pipeline treats specially (it trips the run's quota breaker); everything
/// else degrades to the unaugmented records.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("OpenAI quota exhausted: {0}")]
    QuotaExhausted(String),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("could not decode model output: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("unexpected response shape: {0}")]
    BadResponse(String),
}

#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl OpenAiClient {
    pub fn new(api_key: String) -> Result<Self> {
        let base_url =
            env::var("OPENAI_BASE_URL").unwrap_or_else(|_| OPENAI_API_BASE.to_string());
        let model = env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client for OpenAI")?;

        Ok(Self {
            client,
            base_url,
            api_key,
            model,
        })
    }

    /// Ask the model to attribute favored/penalized teams for one game's
    /// plays. Output always has the same length and order as the input; any
    /// deviation from the expected response shape is an error and the caller
    /// keeps its original records.
    pub async fn classify_plays(
        &self,
        game_id: &str,
        plays: &[CandidateRecord],
    ) -> Result<Vec<CandidateRecord>, ClassifyError> {
        if plays.is_empty() {
            return Ok(Vec::new());
        }

        let context = serde_json::json!({
            "game_id_context": game_id,
            "plays_to_augment": plays,
        });
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": serde_json::to_string(&context)? },
            ],
            "temperature": 0.0,
            "response_format": { "type": "json_object" },
        });

        info!(
            "Sending {} plays for game_id {} to OpenAI for augmentation",
            plays.len(),
            game_id
        );

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            if status.as_u16() == 429 && is_insufficient_quota(&text) {
                return Err(ClassifyError::QuotaExhausted(format!(
                    "HTTP 429 insufficient_quota for game_id {}",
                    game_id
                )));
            }
            return Err(ClassifyError::BadResponse(format!(
                "HTTP {} from OpenAI: {}",
                status,
                truncate(&text, 300)
            )));
        }

        let envelope: Value = resp.json().await?;
        let content = envelope["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                ClassifyError::BadResponse("completion has no message content".to_string())
            })?;
        let parsed: Value = serde_json::from_str(content)?;

        let augmented = apply_augmentation(plays, &parsed)?;
        debug!(
            "Augmented {} plays for game_id {}",
            augmented.len(),
            game_id
        );
        Ok(augmented)
    }
}

/// Graft the model's `team_favored`/`team_penalized` onto the caller's own
/// records. Everything else stays untouched, so cardinality and identity
/// order are preserved structurally; a response of the wrong shape or length
/// is rejected instead of repaired.
pub fn apply_augmentation(
    original: &[CandidateRecord],
    response: &Value,
) -> Result<Vec<CandidateRecord>, ClassifyError> {
    let plays = response
        .get("augmented_plays")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            ClassifyError::BadResponse("response missing 'augmented_plays' array".to_string())
        })?;

    if plays.len() != original.len() {
        return Err(ClassifyError::BadResponse(format!(
            "response has {} plays, expected {}",
            plays.len(),
            original.len()
        )));
    }

    let augmented = original
        .iter()
        .zip(plays)
        .map(|(record, play)| {
            let mut record = record.clone();
            // Team attribution only applies to known-incorrect decisions;
            // correct and undetermined plays keep null teams no matter what
            // the model returned.
            if record.is_correct_decision == Some(false) {
                record.team_favored = string_field(play, "team_favored");
                record.team_penalized = string_field(play, "team_penalized");
            } else {
                record.team_favored = None;
                record.team_penalized = None;
            }
            record
        })
        .collect();

    Ok(augmented)
}

fn string_field(play: &Value, key: &str) -> Option<String> {
    play.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// OpenAI reports hard quota exhaustion as a 429 whose error body carries
/// `"type": "insufficient_quota"`. Plain rate limiting shares the status
/// code but recovers on its own and must not latch the breaker.
pub fn is_insufficient_quota(body: &str) -> bool {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("type"))
                .and_then(Value::as_str)
                .map(|t| t == "insufficient_quota")
        })
        .unwrap_or(false)
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
