use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::{levels::Level, scheduling::SchedulingPreference};

#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
/// The communities, counties, and regions a tournament admits. Absent sets
/// mean "whatever the registered players bring".
pub struct ParticipantScope {
    pub communities: Option<Vec<String>>,
    pub counties: Option<Vec<String>>,
    pub regions: Option<Vec<String>>,
}

impl ParticipantScope {
    pub fn admits_community(&self, community_id: &str) -> bool {
        match &self.communities {
            Some(allowed) => allowed.iter().any(|c| c == community_id),
            None => true,
        }
    }
}

#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
/// A tournament's configuration document. Two generations of writers spelled
/// the registered-players field differently; both are accepted on read and
/// only the canonical plural is written.
pub struct TournamentConfig {
    #[serde(default)]
    pub id: String,
    pub hierarchical_level: Option<Level>,
    pub participant_scope: Option<ParticipantScope>,
    #[serde(
        default,
        alias = "registeredPlayerIds",
        rename = "registeredPlayersIds"
    )]
    pub registered_players_ids: Vec<String>,
    #[serde(default)]
    pub special: bool,
    pub scheduling_preference: Option<SchedulingPreference>,
}

impl TournamentConfig {
    /// The level this tournament starts at: special overrides everything,
    /// then the configured level, then the community default
    pub fn base_level(&self) -> Level {
        if self.special {
            return Level::Special;
        }
        self.hierarchical_level.unwrap_or(Level::Community)
    }
}
