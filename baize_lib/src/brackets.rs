use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::{levels::Level, players::PlayerRef, tournament::ParticipantScope};

#[derive(Serialize, Deserialize, Default, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
/// Coarse round lifecycle as summarized on the bracket document
pub enum RoundState {
    #[default]
    Pending,
    InProgress,
    Completed,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
/// Per-entity summary kept under `bracketLevels`
pub struct BracketLevelEntry {
    pub player_count: usize,
    pub current_round: String,
    pub status: RoundState,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
/// How many finishers each entity sends upward. Three per entity at every
/// feeding level.
pub struct AdvancementRules {
    pub community: u8,
    pub county: u8,
    pub regional: u8,
}

impl Default for AdvancementRules {
    fn default() -> Self {
        AdvancementRules {
            community: 3,
            county: 3,
            regional: 3,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
/// Marker configuration for tournaments that mix every registrant
pub struct SpecialTournamentConfig {
    pub mixed_pool: bool,
}

type EntityRounds = BTreeMap<String, Vec<String>>;

/// Finishing positions of one entity, keyed `"1"`/`"2"`/`"3"`. Keys are
/// strings because the map lives inside JSON and BSON documents.
pub type PositionMap = BTreeMap<String, PlayerRef>;

#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
/// The per-tournament bracket document: forward id lists only, no
/// back-pointers, so every progression question can be recomputed from the
/// matches themselves and the system stays restartable.
pub struct Bracket {
    pub tournament_id: String,
    /// level → entityId → roundLabel → ordered match ids
    pub rounds: BTreeMap<String, BTreeMap<String, EntityRounds>>,
    /// roundLabel → coarse state
    pub round_status: BTreeMap<String, RoundState>,
    /// level → entityId → summary
    pub bracket_levels: BTreeMap<String, BTreeMap<String, BracketLevelEntry>>,
    /// level → entityId → position → player; written once per entity
    pub positions: BTreeMap<String, BTreeMap<String, PositionMap>>,
    pub advancement_rules: AdvancementRules,
    pub special_tournament_config: Option<SpecialTournamentConfig>,
    pub participant_scope: Option<ParticipantScope>,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl Bracket {
    pub fn new(
        tournament_id: impl Into<String>,
        participant_scope: Option<ParticipantScope>,
        special: bool,
        now: DateTime<Utc>,
    ) -> Self {
        Bracket {
            tournament_id: tournament_id.into(),
            rounds: BTreeMap::new(),
            round_status: BTreeMap::new(),
            bracket_levels: BTreeMap::new(),
            positions: BTreeMap::new(),
            advancement_rules: AdvancementRules::default(),
            special_tournament_config: special
                .then_some(SpecialTournamentConfig { mixed_pool: true }),
            participant_scope,
            created_at: now,
            last_updated: now,
        }
    }

    /// Records a generated round: the id list under `rounds`, the label
    /// marked in progress, every earlier label of the entity marked
    /// completed, and the entity summary refreshed. Matches must already be
    /// persisted when this lands (readers may see a match without its
    /// bracket entry, never the reverse).
    pub fn record_round(
        &mut self,
        level: Level,
        entity_id: &str,
        label: &str,
        match_ids: Vec<String>,
        player_count: usize,
        now: DateTime<Utc>,
    ) {
        let entity_rounds = self
            .rounds
            .entry(level.to_string())
            .or_default()
            .entry(entity_id.to_string())
            .or_default();
        for existing in entity_rounds.keys() {
            if existing.as_str() != label {
                self.round_status
                    .insert(existing.clone(), RoundState::Completed);
            }
        }
        entity_rounds.insert(label.to_string(), match_ids);
        self.round_status
            .insert(label.to_string(), RoundState::InProgress);
        self.bracket_levels
            .entry(level.to_string())
            .or_default()
            .insert(
                entity_id.to_string(),
                BracketLevelEntry {
                    player_count,
                    current_round: label.to_string(),
                    status: RoundState::InProgress,
                },
            );
        self.last_updated = now;
    }

    /// The ordered match ids of one recorded round
    pub fn round_ids(&self, level: Level, entity_id: &str, label: &str) -> Option<&Vec<String>> {
        self.rounds
            .get(&level.to_string())?
            .get(entity_id)?
            .get(label)
    }

    /// Finalized positions of one entity, if written
    pub fn positions_for(&self, level: Level, entity_id: &str) -> Option<&PositionMap> {
        self.positions.get(&level.to_string())?.get(entity_id)
    }

    /// Writes an entity's positions exactly once. Returns `false` without
    /// mutating anything when positions already exist; re-finalization must
    /// be an explicit, separate act.
    pub fn set_positions(
        &mut self,
        level: Level,
        entity_id: &str,
        positions: PositionMap,
        now: DateTime<Utc>,
    ) -> bool {
        let entry = self.positions.entry(level.to_string()).or_default();
        if entry.contains_key(entity_id) {
            return false;
        }
        entry.insert(entity_id.to_string(), positions);
        if let Some(summary) = self
            .bracket_levels
            .get_mut(&level.to_string())
            .and_then(|entities| entities.get_mut(entity_id))
        {
            summary.status = RoundState::Completed;
        }
        self.last_updated = now;
        true
    }

    /// Whether every entity recorded at a level has finalized positions;
    /// the gate for initializing the next level
    pub fn level_finalized(&self, level: Level) -> bool {
        let Some(entities) = self.bracket_levels.get(&level.to_string()) else {
            return false;
        };
        !entities.is_empty()
            && entities
                .keys()
                .all(|entity| self.positions_for(level, entity).is_some())
    }
}
