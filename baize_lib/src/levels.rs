use std::fmt;

use serde::{Deserialize, Serialize};

use crate::players::Player;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
/// The geographic tier a tournament (or one of its brackets) runs at.
/// `Special` ignores geography entirely and mixes every registrant.
pub enum Level {
    Community,
    County,
    Regional,
    National,
    Special,
}

impl Level {
    /// The prefix used inside match ids
    pub fn prefix(self) -> &'static str {
        use Level::*;
        match self {
            Community => "COMM",
            County => "CNTY",
            Regional => "REGL",
            National => "NATL",
            Special => "SPCL",
        }
    }

    /// The capitalized name used inside positioning round labels
    pub fn display_name(self) -> &'static str {
        use Level::*;
        match self {
            Community => "Community",
            County => "County",
            Regional => "Regional",
            National => "National",
            Special => "Special",
        }
    }

    /// The level winners of this level feed into, if any
    pub fn next(self) -> Option<Level> {
        use Level::*;
        match self {
            Community => Some(County),
            County => Some(Regional),
            Regional => Some(National),
            National | Special => None,
        }
    }

    /// The level whose finishers feed this one, if any
    pub fn feeder(self) -> Option<Level> {
        use Level::*;
        match self {
            County => Some(Community),
            Regional => Some(County),
            National => Some(Regional),
            Community | Special => None,
        }
    }

    /// The single entity id for levels that have exactly one bracket
    pub fn singleton_entity(self) -> Option<&'static str> {
        match self {
            Level::National => Some("national"),
            Level::Special => Some("special"),
            _ => None,
        }
    }

    /// Reads the entity a player belongs to at this level
    pub fn entity_of(self, player: &Player) -> Option<&str> {
        use Level::*;
        match self {
            Community => player.community_id.as_deref(),
            County => player.county_id.as_deref(),
            Regional => player.region_id.as_deref(),
            National => Some("national"),
            Special => Some("special"),
        }
    }

    /// Reads the finishing position a player carried out of the level that
    /// feeds this one. Used to order promotion pools (position-1s pair first).
    pub fn carried_position(self, player: &Player) -> Option<u8> {
        use Level::*;
        match self {
            County => player.community_position,
            Regional => player.county_position,
            National => player.regional_position,
            Community | Special => None,
        }
    }

    /// Writes the finishing position onto a player flowing up from this level
    pub fn tag_position(self, player: &mut Player, position: u8) {
        use Level::*;
        match self {
            Community => player.community_position = Some(position),
            County => player.county_position = Some(position),
            Regional => player.regional_position = Some(position),
            National | Special => {}
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Level::*;
        let s = match self {
            Community => "community",
            County => "county",
            Regional => "regional",
            National => "national",
            Special => "special",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use Level::*;
        match s {
            "community" => Ok(Community),
            "county" => Ok(County),
            "regional" => Ok(Regional),
            "national" => Ok(National),
            "special" => Ok(Special),
            other => Err(format!("unknown level: {other}")),
        }
    }
}
