use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::levels::Level;

/// Fallback display name for records that carry no name field at all
pub fn fallback_name(id: &str) -> String {
    let tail: String = id
        .chars()
        .rev()
        .take(6)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("Player_{tail}")
}

#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
/// A registered player. Geography ties the player to a community, county, and
/// region; the carried `*Position` fields record how the player finished at
/// the level below when flowing upward. `skillRating` is stored but never read
/// by the progression core.
pub struct Player {
    pub id: String,
    pub name: String,
    pub community_id: Option<String>,
    pub county_id: Option<String>,
    pub region_id: Option<String>,
    pub avatar: Option<String>,
    pub skill_rating: Option<i64>,
    pub community_position: Option<u8>,
    pub county_position: Option<u8>,
    pub regional_position: Option<u8>,
}

impl Player {
    /// Creates a bare player with just an id and name
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Player {
            id: id.into(),
            name: name.into(),
            community_id: None,
            county_id: None,
            region_id: None,
            avatar: None,
            skill_rating: None,
            community_position: None,
            county_position: None,
            regional_position: None,
        }
    }

    /// The participant descriptor this player contributes to a match
    pub fn as_ref(&self) -> PlayerRef {
        PlayerRef {
            id: self.id.clone(),
            name: self.name.clone(),
            community_id: self.community_id.clone(),
        }
    }
}

#[skip_serializing_none]
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
/// The persisted player document as stored. Several generations of writers
/// used different name fields; `into_player` resolves them in precedence
/// order and falls back to a synthetic name.
pub struct RawPlayerRecord {
    #[serde(default)]
    pub id: String,
    pub player_name: Option<String>,
    pub display_name: Option<String>,
    pub full_name: Option<String>,
    pub name: Option<String>,
    pub community_id: Option<String>,
    pub county_id: Option<String>,
    pub region_id: Option<String>,
    pub avatar: Option<String>,
    pub skill_rating: Option<i64>,
    pub community_position: Option<u8>,
    pub county_position: Option<u8>,
    pub regional_position: Option<u8>,
}

impl RawPlayerRecord {
    /// Resolves the display name and produces the core player model
    pub fn into_player(self) -> Player {
        let RawPlayerRecord {
            id,
            player_name,
            display_name,
            full_name,
            name,
            community_id,
            county_id,
            region_id,
            avatar,
            skill_rating,
            community_position,
            county_position,
            regional_position,
        } = self;
        let resolved = player_name
            .or(display_name)
            .or(full_name)
            .or(name)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| fallback_name(&id));
        Player {
            id,
            name: resolved,
            community_id,
            county_id,
            region_id,
            avatar,
            skill_rating,
            community_position,
            county_position,
            regional_position,
        }
    }
}

#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
/// A participant as carried on a match or a finalized position: just enough
/// identity to pair, advance, and report
pub struct PlayerRef {
    pub id: String,
    pub name: String,
    pub community_id: Option<String>,
}

impl PlayerRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        PlayerRef {
            id: id.into(),
            name: name.into(),
            community_id: None,
        }
    }
}

/// Orders a promotion pool so that position-1 finishers pair first, then
/// position-2s, then position-3s. Within one position class the feeding
/// entity's id breaks ties, which keeps promotion pairings deterministic
/// without a shuffle.
pub fn sort_for_promotion(pool: &mut [Player], level: Level) {
    let feeder = match level {
        Level::County => Level::Community,
        Level::Regional => Level::County,
        Level::National => Level::Regional,
        _ => return,
    };
    pool.sort_by(|a, b| {
        let pos_a = level.carried_position(a).unwrap_or(u8::MAX);
        let pos_b = level.carried_position(b).unwrap_or(u8::MAX);
        pos_a
            .cmp(&pos_b)
            .then_with(|| feeder.entity_of(a).cmp(&feeder.entity_of(b)))
            .then_with(|| a.id.cmp(&b.id))
    });
}
