//! Report normalizer: raw L2M play entries -> ordered candidate records.
//!
//! Pure transformation, no I/O. Missing fields map to `None`; only a report
//! that lacks the `"l2m"` play list altogether is rejected as malformed.

use crate::models::{CandidateRecord, DecisionCode, RawL2mReport, RawPlayEntry};
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error, PartialEq)]
pub enum ReportError {
    #[error("report is missing the 'l2m' play list")]
    Malformed,
}

/// Normalize one raw report into candidate records, order preserved.
pub fn normalize_report(report: &RawL2mReport) -> Result<Vec<CandidateRecord>, ReportError> {
    let plays = report.plays.as_ref().ok_or(ReportError::Malformed)?;
    Ok(plays.iter().map(normalize_play).collect())
}

fn normalize_play(play: &RawPlayEntry) -> CandidateRecord {
    let decision = play
        .call_rating_name
        .as_deref()
        .map(DecisionCode::parse);
    let is_correct_decision = decision.map(|d| d.is_correct());

    CandidateRecord {
        period: parse_period(play.period_name.as_deref()),
        time: play.pc_time.clone(),
        call_type: play.call_type.clone(),
        decision,
        is_correct_decision,
        description: play.comment.clone(),
        source_cp: play.cp.clone(),
        source_dp: play.dp.clone(),
        source_pos_team_id: play.pos_team_id.clone(),
        team_favored: None,
        team_penalized: None,
    }
}

/// Derive the period number from the report's period label.
///
/// `"Q<n>"` maps directly; `"OT<n>"` maps to `4 + n`; an overtime label with
/// an unparseable suffix falls back to 5 (generic overtime). L2M reports
/// cover the end of regulation, so a missing or unrecognized label defaults
/// to 4.
pub fn parse_period(label: Option<&str>) -> i32 {
    let label = match label {
        Some(l) => l,
        None => return 4,
    };

    if label.contains("OT") {
        return match label.replace("OT", "").trim().parse::<i32>() {
            Ok(n) => 4 + n,
            Err(_) => {
                warn!("Could not parse OT period label '{}', defaulting to 5", label);
                5
            }
        };
    }

    label
        .strip_prefix('Q')
        .and_then(|rest| rest.trim().parse::<i32>().ok())
        .unwrap_or(4)
}

fn team_abbr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // 2-3 uppercase letters in parentheses, e.g. "James, LeBron (LAL)"
    RE.get_or_init(|| Regex::new(r"\(([A-Z]{2,3})\)").expect("valid team abbreviation regex"))
}

/// Extract a team abbreviation from a player context string like
/// "Holiday, Jrue (BOS)". Returns `None` when no abbreviation is embedded.
pub fn extract_team_abbr(player_context: &str) -> Option<String> {
    team_abbr_re()
        .captures(player_context)
        .map(|caps| caps[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report_from(value: serde_json::Value) -> RawL2mReport {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn regular_periods_map_directly() {
        assert_eq!(parse_period(Some("Q4")), 4);
        assert_eq!(parse_period(Some("Q2")), 2);
    }

    #[test]
    fn overtime_periods_map_to_four_plus_n() {
        assert_eq!(parse_period(Some("OT1")), 5);
        assert_eq!(parse_period(Some("OT2")), 6);
        assert_eq!(parse_period(Some("OT4")), 8);
    }

    #[test]
    fn unparseable_overtime_falls_back_to_generic_ot() {
        assert_eq!(parse_period(Some("OTx")), 5);
        assert_eq!(parse_period(Some("OT")), 5);
    }

    #[test]
    fn missing_or_unrecognized_label_defaults_to_fourth() {
        assert_eq!(parse_period(None), 4);
        assert_eq!(parse_period(Some("HALF")), 4);
    }

    #[test]
    fn extracts_team_abbreviation_from_player_context() {
        assert_eq!(
            extract_team_abbr("Holiday, Jrue (BOS)").as_deref(),
            Some("BOS")
        );
        assert_eq!(extract_team_abbr("James, LeBron (LAL)").as_deref(), Some("LAL"));
        assert_eq!(extract_team_abbr("Somebody (ok)"), None);
        assert_eq!(extract_team_abbr("No context here"), None);
    }

    #[test]
    fn missing_play_list_is_malformed() {
        let report = report_from(json!({ "Game": {} }));
        assert_eq!(normalize_report(&report), Err(ReportError::Malformed));
    }

    #[test]
    fn empty_play_list_yields_empty_candidates() {
        let report = report_from(json!({ "l2m": [] }));
        assert_eq!(normalize_report(&report).unwrap(), vec![]);
    }

    #[test]
    fn normalizes_plays_in_order_with_derived_fields() {
        let report = report_from(json!({
            "l2m": [
                {
                    "PeriodName": "Q4",
                    "PCTime": "0:46.2",
                    "CallType": "Foul: Shooting",
                    "CallRatingName": "IC",
                    "Comment": "Holiday (BOS) makes contact with Nembhard (IND)",
                    "CP": "Holiday, Jrue (BOS)",
                    "DP": "Nembhard, Andrew (IND)"
                },
                {
                    "PeriodName": "OT1",
                    "PCTime": "1:12.0",
                    "CallRatingName": "CNC"
                },
                {}
            ]
        }));

        let candidates = normalize_report(&report).unwrap();
        assert_eq!(candidates.len(), 3);

        assert_eq!(candidates[0].period, 4);
        assert_eq!(candidates[0].decision, Some(DecisionCode::IC));
        assert_eq!(candidates[0].is_correct_decision, Some(false));
        assert_eq!(candidates[0].source_cp.as_deref(), Some("Holiday, Jrue (BOS)"));
        assert!(candidates[0].team_favored.is_none());
        assert!(candidates[0].team_penalized.is_none());

        assert_eq!(candidates[1].period, 5);
        assert_eq!(candidates[1].is_correct_decision, Some(true));

        // A play with nothing set still becomes a record, all fields None
        assert_eq!(candidates[2].period, 4);
        assert!(candidates[2].decision.is_none());
        assert!(candidates[2].is_correct_decision.is_none());
        assert!(candidates[2].time.is_none());
    }

    #[test]
    fn unknown_decision_code_counts_as_incorrect() {
        let report = report_from(json!({ "l2m": [{ "CallRatingName": "??" }] }));
        let candidates = normalize_report(&report).unwrap();
        assert_eq!(candidates[0].decision, Some(DecisionCode::Unknown));
        assert_eq!(candidates[0].is_correct_decision, Some(false));
    }
}
