use std::collections::{BTreeMap, HashSet};

use crate::{
    error::ProgressionError,
    generator::RoundPlan,
    matches::{Match, MatchType},
    oracle::{loser_of, winner_of},
    pairings::best_loser,
    players::PlayerRef,
    rounds::{RoundLabel, RoundStage},
};

/// Whether a match counts as finished for progression purposes. Byes and
/// auto-advancements are born decided; an ordinary match must be completed
/// with a strict points winner — a completed tie leaves the round open until
/// the points are corrected.
pub fn decided(m: &Match) -> bool {
    if !m.is_completed() {
        return false;
    }
    if m.is_bye_match || m.is_auto_advancement {
        return true;
    }
    winner_of(m).is_some()
}

/// The stage a persisted match belongs to. Three-player initial matches form
/// their own stage below the finals regardless of label, because the two
/// matches of that scheme share the `<Level>_Final` label when the scheme is
/// entered at initialization.
fn stage_of(m: &Match) -> Option<RoundStage> {
    match m.match_type {
        MatchType::ThreePlayerInitial | MatchType::Legacy3ws => Some(RoundStage::SemiFinals),
        _ => RoundLabel::parse(&m.round_number).map(|label| label.stage()),
    }
}

/// Decides what an entity plays next from its full persisted match history.
///
/// The caller's round hint is deliberately not an input: the actual current
/// round is recomputed as the highest stage whose matches are all decided,
/// which keeps retries idempotent — a retried call regenerates the identical
/// next round and upserting stores ignore the duplicates.
///
/// `Err(Terminal)` means the entity has played its last match and only
/// finalization remains.
pub fn next_round_plan(all: &[Match]) -> Result<RoundPlan, ProgressionError> {
    if all.is_empty() {
        return Err(ProgressionError::InvalidInput(
            "entity has no matches; initialize the level first".into(),
        ));
    }

    let mut stages: BTreeMap<RoundStage, Vec<&Match>> = BTreeMap::new();
    for m in all {
        if let Some(stage) = stage_of(m) {
            stages.entry(stage).or_default().push(m);
        }
    }
    if stages.is_empty() {
        return Err(ProgressionError::InvalidInput(
            "no matches carry a recognizable round label".into(),
        ));
    }

    let current = stages
        .iter()
        .rev()
        .find(|(_, matches)| matches.iter().all(|m| decided(m)))
        .map(|(stage, matches)| (*stage, matches.clone()));

    let (stage, mut matches) = match current {
        Some(found) => found,
        None => {
            // nothing is fully decided, so the lowest stage is the one the
            // entity is waiting on
            let (_, lowest) = stages.iter().next().expect("stages is non-empty");
            return Err(incomplete_error(lowest));
        }
    };
    matches.sort_by_key(|m| m.match_number);

    match stage {
        RoundStage::Finals => Err(ProgressionError::Terminal),
        RoundStage::BracketFinals => plan_grand_final(&matches),
        RoundStage::SemiFinals => plan_after_semis(&matches),
        RoundStage::Elimination(number) => plan_after_elimination(number, &matches),
    }
}

fn incomplete_error(matches: &[&Match]) -> ProgressionError {
    let incomplete: Vec<String> = matches
        .iter()
        .filter(|m| !decided(m))
        .map(|m| m.id.clone())
        .collect();
    let total = matches.len();
    ProgressionError::PreviousRoundIncomplete {
        round: matches
            .first()
            .map(|m| m.round_number.clone())
            .unwrap_or_default(),
        completed: total - incomplete.len(),
        total,
        incomplete,
    }
}

fn plan_after_semis(matches: &[&Match]) -> Result<RoundPlan, ProgressionError> {
    // the three-player scheme parks its initial match in this stage
    if let Some(initial) = matches.iter().find(|m| {
        matches!(
            m.match_type,
            MatchType::ThreePlayerInitial | MatchType::Legacy3ws
        )
    }) {
        let loser = loser_of(initial).ok_or(ProgressionError::MissingPositioningMatches)?;
        let waiting = initial
            .waiting_player()
            .ok_or(ProgressionError::MissingPositioningMatches)?;
        return Ok(RoundPlan::ThreePlayerFinal { loser, waiting });
    }

    let semis: Vec<&&Match> = matches
        .iter()
        .filter(|m| m.match_type == MatchType::SemiFinal)
        .collect();
    if semis.len() != 2 {
        return Err(ProgressionError::MissingPositioningMatches);
    }
    let (sf1, sf2) = (semis[0], semis[1]);
    let winners = (
        winner_of(sf1).ok_or(ProgressionError::MissingPositioningMatches)?,
        winner_of(sf2).ok_or(ProgressionError::MissingPositioningMatches)?,
    );
    let losers = (
        loser_of(sf1).ok_or(ProgressionError::MissingPositioningMatches)?,
        loser_of(sf2).ok_or(ProgressionError::MissingPositioningMatches)?,
    );
    Ok(RoundPlan::BracketFinals { winners, losers })
}

fn plan_grand_final(matches: &[&Match]) -> Result<RoundPlan, ProgressionError> {
    let wf = matches
        .iter()
        .find(|m| matches!(m.match_type, MatchType::WinnersFinal | MatchType::LegacyWb))
        .ok_or(ProgressionError::MissingPositioningMatches)?;
    let lf = matches
        .iter()
        .find(|m| matches!(m.match_type, MatchType::LosersFinal | MatchType::LegacyLb))
        .ok_or(ProgressionError::MissingPositioningMatches)?;
    let wf_loser = loser_of(wf).ok_or(ProgressionError::MissingPositioningMatches)?;
    let lf_winner = winner_of(lf).ok_or(ProgressionError::MissingPositioningMatches)?;
    Ok(RoundPlan::GrandFinal { wf_loser, lf_winner })
}

fn plan_after_elimination(number: u32, matches: &[&Match]) -> Result<RoundPlan, ProgressionError> {
    let mut winners: Vec<PlayerRef> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for m in matches {
        if let Some(w) = winner_of(m) {
            if seen.insert(w.id.clone()) {
                winners.push(w);
            }
        }
    }

    match winners.len() {
        0 => Err(ProgressionError::NoWinnersFound),
        // a lone winner out of an elimination round means the bucket counting
        // drifted; refuse rather than fabricate a final
        1 => Err(ProgressionError::UnexpectedPoolSize(1)),
        2 => {
            let mut pool = winners.into_iter();
            Ok(RoundPlan::TwoPlayerFinal {
                high: pool.next().expect("two winners"),
                low: pool.next().expect("two winners"),
            })
        }
        3 => Ok(RoundPlan::ThreePlayer { pool: winners }),
        4 => Ok(RoundPlan::SemiFinals { pool: winners }),
        _ => {
            if winners.len() % 2 == 1 {
                if let Some(lucky) = best_loser(matches) {
                    winners.push(lucky);
                }
            }
            Ok(RoundPlan::Elimination {
                number: number + 1,
                pool: winners,
            })
        }
    }
}
