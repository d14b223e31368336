use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{levels::Level, rounds::RoundLabel};

#[derive(Serialize, Deserialize, Debug, Clone, Hash, PartialEq, Eq)]
/// The final component of a match id. Elimination rounds number their
/// matches and byes; the positioning phases use fixed role names.
pub enum MatchSuffix {
    Match(u32),
    Bye(u32),
    SemiFinal(u8),
    WinnersFinal,
    LosersFinal,
    Final,
    Initial,
    Pos23Final,
    AutoPos1,
    TwoPlayerFinal,
}

impl fmt::Display for MatchSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use MatchSuffix::*;
        match self {
            Match(n) => write!(f, "match_{n}"),
            Bye(n) => write!(f, "bye_{n}"),
            SemiFinal(n) => write!(f, "SF{n}"),
            WinnersFinal => write!(f, "WINNERS_FINAL"),
            LosersFinal => write!(f, "LOSERS_FINAL"),
            Final => write!(f, "FINAL"),
            Initial => write!(f, "INITIAL"),
            Pos23Final => write!(f, "POS23_FINAL"),
            AutoPos1 => write!(f, "AUTO_POS1"),
            TwoPlayerFinal => write!(f, "TWO_PLAYER_FINAL"),
        }
    }
}

/// Builds the deterministic match id
/// `<RoundLabel>_<LevelPrefix>_<EntityId>_<Suffix>`. Identical inputs always
/// produce the identical id, which is what makes regeneration and retries
/// idempotent under upserting stores.
pub fn match_id(label: RoundLabel, level: Level, entity_id: &str, suffix: &MatchSuffix) -> String {
    format!(
        "{}_{}_{}_{}",
        label.as_string(level),
        level.prefix(),
        entity_id,
        suffix
    )
}
