use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use baize_lib::{levels::Level, matches::Match, scheduling::SchedulingPreference};

use crate::error::ServiceError;

pub use baize_lib::brackets::PositionMap;

/* ---------- Request bodies ---------- */

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct InitializeTournamentRequest {
    pub tournament_id: String,
    #[serde(default)]
    pub special: bool,
    pub level: Option<Level>,
    pub scheduling_preference: Option<SchedulingPreference>,
}

#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NextRoundRequest {
    pub tournament_id: String,
    pub community_id: Option<String>,
    pub county_id: Option<String>,
    pub region_id: Option<String>,
    /// Advisory only: the actual current round is always recomputed
    pub current_round: Option<String>,
}

#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LevelInitRequest {
    pub tournament_id: String,
    pub county_ids: Option<Vec<String>>,
    pub region_ids: Option<Vec<String>>,
}

#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeRequest {
    pub tournament_id: String,
    pub community_id: Option<String>,
    pub county_id: Option<String>,
    pub region_id: Option<String>,
    pub level: Option<Level>,
}

impl FinalizeRequest {
    /// The (level, entity) the caller is asking to finalize
    pub fn target(&self) -> Option<(Level, String)> {
        if let Some(id) = &self.community_id {
            return Some((Level::Community, id.clone()));
        }
        if let Some(id) = &self.county_id {
            return Some((Level::County, id.clone()));
        }
        if let Some(id) = &self.region_id {
            return Some((Level::Regional, id.clone()));
        }
        match self.level {
            Some(level @ (Level::National | Level::Special)) => {
                Some((level, level.singleton_entity().unwrap_or_default().to_string()))
            }
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PositionsRequest {
    pub tournament_id: String,
    pub entity_id: String,
    pub level: Level,
}

/* ---------- Response bodies ---------- */

#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
/// Response to the two initialization endpoints: the freshly created (or
/// idempotently re-created) first rounds across every resolved entity
pub struct InitializeResponse {
    pub success: bool,
    pub error: Option<String>,
    pub detail: Option<String>,
    pub action: Option<String>,
    pub level: Option<Level>,
    pub entities: Option<Vec<String>>,
    pub matches: Option<Vec<Match>>,
    pub total_matches: Option<usize>,
    pub initial_matches: Option<usize>,
}

impl InitializeResponse {
    pub fn generated(level: Level, entities: Vec<String>, matches: Vec<Match>) -> Self {
        let total = matches.len();
        InitializeResponse {
            success: true,
            error: None,
            detail: None,
            action: Some("level_initialized".into()),
            level: Some(level),
            entities: Some(entities),
            total_matches: Some(total),
            initial_matches: Some(total),
            matches: Some(matches),
        }
    }

    pub fn failure(err: &ServiceError) -> Self {
        InitializeResponse {
            success: false,
            error: Some(err.kind().to_string()),
            detail: Some(err.to_string()),
            action: None,
            level: None,
            entities: None,
            matches: None,
            total_matches: None,
            initial_matches: None,
        }
    }
}

#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
/// Response to the next-round endpoints. A terminal entity answers with
/// `tournament_complete` and its positions instead of new matches.
pub struct RoundResponse {
    pub success: bool,
    pub error: Option<String>,
    pub detail: Option<String>,
    pub action: Option<String>,
    pub round: Option<String>,
    pub entity_id: Option<String>,
    pub matches: Option<Vec<Match>>,
    pub total_matches: Option<usize>,
    pub positions: Option<PositionMap>,
    pub incomplete_matches: Option<Vec<String>>,
    pub completed_count: Option<usize>,
    pub total_count: Option<usize>,
}

impl RoundResponse {
    pub fn generated(entity_id: &str, round: String, matches: Vec<Match>) -> Self {
        RoundResponse {
            success: true,
            error: None,
            detail: None,
            action: Some("round_generated".into()),
            round: Some(round),
            entity_id: Some(entity_id.to_string()),
            total_matches: Some(matches.len()),
            matches: Some(matches),
            positions: None,
            incomplete_matches: None,
            completed_count: None,
            total_count: None,
        }
    }

    pub fn complete(entity_id: &str, positions: PositionMap) -> Self {
        RoundResponse {
            success: true,
            error: None,
            detail: None,
            action: Some("tournament_complete".into()),
            round: None,
            entity_id: Some(entity_id.to_string()),
            matches: None,
            total_matches: None,
            positions: Some(positions),
            incomplete_matches: None,
            completed_count: None,
            total_count: None,
        }
    }

    pub fn failure(err: &ServiceError) -> Self {
        let mut resp = RoundResponse {
            success: false,
            error: Some(err.kind().to_string()),
            detail: Some(err.to_string()),
            action: None,
            round: None,
            entity_id: None,
            matches: None,
            total_matches: None,
            positions: None,
            incomplete_matches: None,
            completed_count: None,
            total_count: None,
        };
        if let ServiceError::Progression(
            baize_lib::error::ProgressionError::PreviousRoundIncomplete {
                round,
                incomplete,
                completed,
                total,
            },
        ) = err
        {
            resp.round = Some(round.clone());
            resp.incomplete_matches = Some(incomplete.clone());
            resp.completed_count = Some(*completed);
            resp.total_count = Some(*total);
        }
        resp
    }
}

#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeResponse {
    pub success: bool,
    pub error: Option<String>,
    pub detail: Option<String>,
    pub positions: Option<PositionMap>,
    pub already_finalized: Option<bool>,
}

impl FinalizeResponse {
    pub fn finalized(positions: PositionMap, already: bool) -> Self {
        FinalizeResponse {
            success: true,
            error: None,
            detail: None,
            positions: Some(positions),
            already_finalized: already.then_some(true),
        }
    }

    pub fn failure(err: &ServiceError) -> Self {
        FinalizeResponse {
            success: false,
            error: Some(err.kind().to_string()),
            detail: Some(err.to_string()),
            positions: None,
            already_finalized: None,
        }
    }
}

#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PositionsResponse {
    pub success: bool,
    pub error: Option<String>,
    pub detail: Option<String>,
    pub level: Option<Level>,
    pub entity_id: Option<String>,
    pub positions: Option<PositionMap>,
}

impl PositionsResponse {
    pub fn found(level: Level, entity_id: &str, positions: PositionMap) -> Self {
        PositionsResponse {
            success: true,
            error: None,
            detail: None,
            level: Some(level),
            entity_id: Some(entity_id.to_string()),
            positions: Some(positions),
        }
    }

    pub fn failure(err: &ServiceError) -> Self {
        PositionsResponse {
            success: false,
            error: Some(err.kind().to_string()),
            detail: Some(err.to_string()),
            level: None,
            entity_id: None,
            positions: None,
        }
    }
}

#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionResponse {
    pub success: bool,
    pub message: Option<String>,
    pub error: Option<String>,
}
