use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::{
    brackets::PositionMap,
    error::ProgressionError,
    matches::{Match, MatchType},
    oracle::{loser_of, winner_of},
    players::PlayerRef,
};

#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
/// The finishing order of one entity. A one-player pool fills only position
/// 1; a two-player pool has no position 3; the four-player scheme eliminates
/// the losers-final loser without a position.
pub struct EntityPositions {
    pub first: PlayerRef,
    pub second: Option<PlayerRef>,
    pub third: Option<PlayerRef>,
}

impl EntityPositions {
    /// The persisted map shape: position number → player
    pub fn as_map(&self) -> PositionMap {
        let mut map = PositionMap::new();
        map.insert("1".into(), self.first.clone());
        if let Some(p) = &self.second {
            map.insert("2".into(), p.clone());
        }
        if let Some(p) = &self.third {
            map.insert("3".into(), p.clone());
        }
        map
    }

    /// Rebuilds the typed shape from a persisted map
    pub fn from_map(map: &PositionMap) -> Option<EntityPositions> {
        Some(EntityPositions {
            first: map.get("1")?.clone(),
            second: map.get("2").cloned(),
            third: map.get("3").cloned(),
        })
    }
}

/// A positioning match must be completed and strictly decided before its
/// positions can be read. Not yet completed means the phase is still being
/// played; completed with equal points is the unrecoverable tie.
fn decisive(m: &Match) -> Result<(PlayerRef, Option<PlayerRef>), ProgressionError> {
    if !m.is_completed() {
        return Err(ProgressionError::MissingPositioningMatches);
    }
    match winner_of(m) {
        Some(winner) => Ok((winner, loser_of(m))),
        None => Err(ProgressionError::TieUndecidable(m.id.clone())),
    }
}

/// Derives positions 1/2/3 for one entity from its final-phase matches,
/// using the oracle only. The scenario is detected from the multiset of
/// positioning match types; ordinary elimination matches are ignored.
pub fn finalize_positions(all: &[Match]) -> Result<EntityPositions, ProgressionError> {
    let find = |wanted: fn(MatchType) -> bool| all.iter().find(|m| wanted(m.match_type));

    // one registrant: a pre-completed auto-advancement and nothing else
    if let Some(auto) = find(|t| t == MatchType::AutoAdvancement) {
        return Ok(EntityPositions {
            first: auto.player1(),
            second: None,
            third: None,
        });
    }

    // two registrants: the direct final, no position 3
    if let Some(final_match) = find(|t| t == MatchType::TwoPlayerFinal) {
        let (winner, loser) = decisive(final_match)?;
        return Ok(EntityPositions {
            first: winner,
            second: loser,
            third: None,
        });
    }

    // three players: initial decides 1, the pos-2/3 final decides the rest
    if let Some(initial) = find(|t| matches!(t, MatchType::ThreePlayerInitial | MatchType::Legacy3ws))
    {
        let (first, _) = decisive(initial)?;
        let pos23 = find(|t| t == MatchType::ThreePlayerFinal)
            .ok_or(ProgressionError::MissingPositioningMatches)?;
        let (second, third) = decisive(pos23)?;
        return Ok(EntityPositions {
            first,
            second: Some(second),
            third,
        });
    }

    // four players: winners final fixes 1, the last match splits 2 and 3;
    // the losers-final loser is eliminated outright
    if let Some(wf) = find(|t| matches!(t, MatchType::WinnersFinal | MatchType::LegacyWb)) {
        let (first, _) = decisive(wf)?;
        let final_match = find(|t| t == MatchType::Final)
            .ok_or(ProgressionError::MissingPositioningMatches)?;
        let (second, third) = decisive(final_match)?;
        return Ok(EntityPositions {
            first,
            second: Some(second),
            third,
        });
    }

    Err(ProgressionError::MissingPositioningMatches)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::{
        levels::Level,
        matches::{MatchStatus, RoundScope},
        rounds::RoundLabel,
    };

    fn round(label: RoundLabel) -> RoundScope {
        RoundScope::new(
            "T1",
            Level::Community,
            "C1",
            label,
            Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        )
    }

    fn score(m: &mut Match, p1: i64, p2: i64) {
        m.player1_points = p1;
        m.player2_points = p2;
        m.status = MatchStatus::Completed;
    }

    #[test]
    fn lone_player_takes_position_one_only() {
        let auto =
            Match::new_auto_advancement(&round(RoundLabel::Final), &PlayerRef::new("p1", "P1"))
                .unwrap();
        let positions = finalize_positions(&[auto]).unwrap();
        assert_eq!(positions.first.id, "p1");
        assert!(positions.second.is_none() && positions.third.is_none());
    }

    #[test]
    fn two_player_final_has_no_third() {
        let mut m = Match::new_two_player_final(
            &round(RoundLabel::Final),
            &PlayerRef::new("a", "A"),
            &PlayerRef::new("b", "B"),
        )
        .unwrap();
        score(&mut m, 1, 3);
        let positions = finalize_positions(&[m]).unwrap();
        assert_eq!(positions.first.id, "b");
        assert_eq!(positions.second.unwrap().id, "a");
        assert!(positions.third.is_none());
    }

    #[test]
    fn three_player_scheme_orders_all_three() {
        let mut initial = Match::new_three_player_initial(
            &round(RoundLabel::Final),
            &PlayerRef::new("q1", "Q1"),
            &PlayerRef::new("q2", "Q2"),
            &PlayerRef::new("q3", "Q3"),
        )
        .unwrap();
        score(&mut initial, 3, 0);
        let mut pos23 = Match::new_three_player_final(
            &round(RoundLabel::Final),
            &PlayerRef::new("q2", "Q2"),
            &PlayerRef::new("q3", "Q3"),
        )
        .unwrap();
        score(&mut pos23, 3, 0);
        let positions = finalize_positions(&[initial, pos23]).unwrap();
        assert_eq!(positions.first.id, "q1");
        assert_eq!(positions.second.unwrap().id, "q2");
        assert_eq!(positions.third.unwrap().id, "q3");
    }

    #[test]
    fn tie_on_the_decisive_match_is_fatal() {
        let mut m = Match::new_two_player_final(
            &round(RoundLabel::Final),
            &PlayerRef::new("a", "A"),
            &PlayerRef::new("b", "B"),
        )
        .unwrap();
        score(&mut m, 2, 2);
        assert!(matches!(
            finalize_positions(&[m]).unwrap_err(),
            ProgressionError::TieUndecidable(_)
        ));
    }

    #[test]
    fn missing_pos23_final_is_reported() {
        let mut initial = Match::new_three_player_initial(
            &round(RoundLabel::Final),
            &PlayerRef::new("q1", "Q1"),
            &PlayerRef::new("q2", "Q2"),
            &PlayerRef::new("q3", "Q3"),
        )
        .unwrap();
        score(&mut initial, 3, 0);
        assert_eq!(
            finalize_positions(&[initial]).unwrap_err(),
            ProgressionError::MissingPositioningMatches
        );
    }

    #[test]
    fn positions_map_round_trips() {
        let positions = EntityPositions {
            first: PlayerRef::new("a", "A"),
            second: Some(PlayerRef::new("b", "B")),
            third: None,
        };
        let map = positions.as_map();
        assert_eq!(map.len(), 2);
        assert_eq!(EntityPositions::from_map(&map).unwrap(), positions);
    }
}
