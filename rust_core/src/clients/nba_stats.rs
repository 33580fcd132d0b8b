//! NBA stats API client for officials lookup.
//!
//! Uses the `boxscoresummaryv2` endpoint to resolve the three officials who
//! worked a game. stats.nba.com rejects non-browser traffic, so the client
//! sends browser-mimicking headers. Lookup failures never escape this
//! module: the caller always gets an `OfficialsInfo`, possibly all-empty.

use crate::models::OfficialsInfo;
use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info};

const STATS_API_BASE: &str = "https://stats.nba.com/stats";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Clone)]
pub struct NbaStatsClient {
    client: Client,
}

impl std::fmt::Debug for NbaStatsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NbaStatsClient").finish()
    }
}

impl NbaStatsClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .context("Failed to create HTTP client for stats.nba.com")?;
        Ok(Self { client })
    }

    /// Resolve up to three official names for a game. Any failure degrades
    /// to all-empty slots; officials are nice-to-have, not load-bearing.
    pub async fn fetch_game_officials(&self, game_id: &str) -> OfficialsInfo {
        match self.fetch_box_score_summary(game_id).await {
            Ok(data) => {
                let names = parse_officials(&data);
                let officials = officials_from_names(names);
                info!(
                    "Fetched officials for game_id {}: {}",
                    game_id,
                    [&officials.ref_1, &officials.ref_2, &officials.ref_3]
                        .iter()
                        .filter_map(|r| r.as_deref())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
                officials
            }
            Err(e) => {
                error!("Error fetching officials for game_id {}: {:#}", game_id, e);
                OfficialsInfo::default()
            }
        }
    }

    async fn fetch_box_score_summary(&self, game_id: &str) -> Result<Value> {
        let url = format!("{}/boxscoresummaryv2", STATS_API_BASE);
        let resp = self
            .client
            .get(&url)
            .query(&[("GameID", game_id)])
            .header("User-Agent", USER_AGENT)
            .header("Referer", "https://www.nba.com/")
            .header("x-nba-stats-origin", "stats")
            .send()
            .await
            .context("boxscoresummaryv2 request failed")?;

        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("boxscoresummaryv2 returned HTTP {}", status));
        }
        resp.json::<Value>()
            .await
            .context("boxscoresummaryv2 returned non-JSON body")
    }
}

/// Pull official names out of the raw box score summary. The payload is a
/// list of result sets, each with parallel `headers` and `rowSet` arrays;
/// we want the one named `Officials`.
pub fn parse_officials(data: &Value) -> Vec<String> {
    let result_sets = match data.get("resultSets").and_then(Value::as_array) {
        Some(sets) => sets,
        None => return Vec::new(),
    };

    let officials_set = result_sets
        .iter()
        .find(|set| set["name"].as_str() == Some("Officials"));
    let officials_set = match officials_set {
        Some(set) => set,
        None => return Vec::new(),
    };

    let headers: Vec<&str> = officials_set["headers"]
        .as_array()
        .map(|h| h.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    let col = |name: &str| headers.iter().position(|h| *h == name);
    let first_idx = col("FIRST_NAME");
    let last_idx = col("LAST_NAME");
    let full_idx = col("OFFICIAL_NAME");

    let rows = match officials_set["rowSet"].as_array() {
        Some(rows) => rows,
        None => return Vec::new(),
    };

    let mut names = Vec::new();
    for row in rows {
        let cell = |idx: Option<usize>| {
            idx.and_then(|i| row.get(i))
                .and_then(Value::as_str)
                .unwrap_or("")
        };
        let first = title_case(cell(first_idx));
        let last = title_case(cell(last_idx));
        if !first.is_empty() || !last.is_empty() {
            names.push(format!("{} {}", first, last).trim().to_string());
        } else {
            let full = cell(full_idx);
            if !full.is_empty() {
                names.push(title_case(full));
            }
        }
    }
    names
}

/// Fill the ordered referee slots from however many names were found.
pub fn officials_from_names(names: Vec<String>) -> OfficialsInfo {
    let mut iter = names.into_iter();
    OfficialsInfo {
        ref_1: iter.next(),
        ref_2: iter.next(),
        ref_3: iter.next(),
    }
}

/// Capitalize the first letter of every word, lowercase the rest. The stats
/// API is inconsistent about casing (all-caps in older seasons).
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}
