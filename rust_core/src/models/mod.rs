// Shared models for the L2M tracker services
use serde::{Deserialize, Serialize};

// ============================================================================
// Raw report shapes (official.nba.com L2M JSON)
// ============================================================================

/// One per-game L2M report as published. The play list lives under the
/// top-level `"l2m"` key; a document without that key is malformed.
#[derive(Debug, Clone, Deserialize)]
pub struct RawL2mReport {
    #[serde(rename = "l2m")]
    pub plays: Option<Vec<RawPlayEntry>>,
}

/// One reviewed play as it appears in the raw report. Every field is
/// optional; the source frequently omits them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPlayEntry {
    #[serde(rename = "PeriodName")]
    pub period_name: Option<String>,
    #[serde(rename = "PCTime")]
    pub pc_time: Option<String>,
    #[serde(rename = "CallType")]
    pub call_type: Option<String>,
    #[serde(rename = "CallRatingName")]
    pub call_rating_name: Option<String>,
    #[serde(rename = "Comment")]
    pub comment: Option<String>,
    /// Committing player context, e.g. "Holiday, Jrue (BOS)"
    #[serde(rename = "CP")]
    pub cp: Option<String>,
    /// Disadvantaged player context, same format as `CP`
    #[serde(rename = "DP")]
    pub dp: Option<String>,
    /// Possession team id; numeric or string depending on season
    #[serde(rename = "posTeamId")]
    pub pos_team_id: Option<serde_json::Value>,
}

// ============================================================================
// Decision codes
// ============================================================================

/// Referee decision rating from the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionCode {
    /// Correct call
    CC,
    /// Correct non-call
    CNC,
    /// Incorrect call
    IC,
    /// Incorrect non-call
    INC,
    /// Anything the league publishes that we do not recognize
    #[serde(other)]
    Unknown,
}

impl DecisionCode {
    pub fn parse(code: &str) -> Self {
        match code {
            "CC" => DecisionCode::CC,
            "CNC" => DecisionCode::CNC,
            "IC" => DecisionCode::IC,
            "INC" => DecisionCode::INC,
            _ => DecisionCode::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionCode::CC => "CC",
            DecisionCode::CNC => "CNC",
            DecisionCode::IC => "IC",
            DecisionCode::INC => "INC",
            DecisionCode::Unknown => "UNKNOWN",
        }
    }

    /// True iff the officials got it right (call or non-call).
    pub fn is_correct(&self) -> bool {
        matches!(self, DecisionCode::CC | DecisionCode::CNC)
    }
}

// ============================================================================
// Normalized records
// ============================================================================

/// One normalized play, ready for AI augmentation and insertion.
///
/// Serialized field names match the JSON exchanged with the classification
/// service; `source_*` fields are context for the AI only and are never
/// persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub period: i32,
    pub time: Option<String>,
    pub call_type: Option<String>,
    pub decision: Option<DecisionCode>,
    pub is_correct_decision: Option<bool>,
    pub description: Option<String>,
    #[serde(rename = "source_CP")]
    pub source_cp: Option<String>,
    #[serde(rename = "source_DP")]
    pub source_dp: Option<String>,
    #[serde(rename = "source_posTeamId", skip_serializing_if = "Option::is_none", default)]
    pub source_pos_team_id: Option<serde_json::Value>,
    pub team_favored: Option<String>,
    pub team_penalized: Option<String>,
}

/// Up to three officials for a game, slot order as reported by the league.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OfficialsInfo {
    pub ref_1: Option<String>,
    pub ref_2: Option<String>,
    pub ref_3: Option<String>,
}

/// Row shape of the `calls` table. Fields that are required for a record to
/// be insertable are non-optional here; `db::calls::build_records` enforces
/// that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCallRecord {
    pub game_id: String,
    pub period: i32,
    pub time: String,
    pub call_type: String,
    pub decision: String,
    pub is_correct_decision: bool,
    pub description: String,
    pub team_favored: Option<String>,
    pub team_penalized: Option<String>,
    pub ref_1: Option<String>,
    pub ref_2: Option<String>,
    pub ref_3: Option<String>,
}
