//! Local report cache: one `<game_id>.json` file per game, written by the
//! fetch step. The ingest service only ever reads from it.

use crate::models::RawL2mReport;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// List cached game ids, sorted, derived from `*.json` filenames.
pub fn list_cached_game_ids(dir: &Path) -> Result<Vec<String>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read reports directory {}", dir.display()))?;

    let mut game_ids = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("Failed to list reports directory {}", dir.display()))?
            .path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            game_ids.push(stem.to_string());
        }
    }
    game_ids.sort();
    Ok(game_ids)
}

/// Read and decode one cached report by game id.
pub fn load_report(dir: &Path, game_id: &str) -> Result<RawL2mReport> {
    let path = dir.join(format!("{}.json", game_id));
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read cached report {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to decode cached report {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_cache(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("l2m_cache_test_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn lists_json_files_sorted_by_game_id() {
        let dir = temp_cache("list");
        fs::write(dir.join("0042300102.json"), "{}").unwrap();
        fs::write(dir.join("0042300101.json"), "{}").unwrap();
        fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let ids = list_cached_game_ids(&dir).unwrap();
        assert_eq!(ids, vec!["0042300101", "0042300102"]);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn loads_and_decodes_a_report() {
        let dir = temp_cache("load");
        fs::write(
            dir.join("0042300101.json"),
            r#"{"l2m": [{"PeriodName": "Q4", "CallRatingName": "CC"}]}"#,
        )
        .unwrap();

        let report = load_report(&dir, "0042300101").unwrap();
        assert_eq!(report.plays.as_ref().unwrap().len(), 1);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_or_invalid_files_error() {
        let dir = temp_cache("errors");
        assert!(load_report(&dir, "0000000000").is_err());

        fs::write(dir.join("0042300101.json"), "not json").unwrap();
        assert!(load_report(&dir, "0042300101").is_err());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_directory_errors() {
        let dir = std::env::temp_dir().join("l2m_cache_test_does_not_exist");
        assert!(list_cached_game_ids(&dir).is_err());
    }
}
