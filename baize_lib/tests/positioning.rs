//! Full walkthroughs of the small-field positioning schemes: pools of one,
//! two, three, and four players, from the first generated match to the
//! derived positions.

use chrono::{TimeZone, Utc};

use baize_lib::{
    error::ProgressionError,
    finalizer::finalize_positions,
    generator::{initial_round, materialize, EntityScope, PairingMode},
    levels::Level,
    matches::{Match, MatchType},
    pairings::seeded_rng,
    progression::next_round_plan,
};
use baize_tests::{decide, spoof_pool};

fn scope() -> EntityScope {
    EntityScope::new(
        "T1",
        Level::Community,
        "C1",
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
    )
}

fn generate_first(count: usize) -> Vec<Match> {
    let pool = spoof_pool("p", count, "C1");
    let mut rng = seeded_rng("T1", Level::Community, "C1", "seed");
    initial_round(&scope(), &pool, PairingMode::Shuffled, &mut rng).unwrap()
}

fn advance(all: &mut Vec<Match>) -> Vec<Match> {
    let plan = next_round_plan(all).unwrap();
    let mut rng = seeded_rng("T1", Level::Community, "C1", "seed");
    let next = materialize(&scope(), &plan, &mut rng).unwrap();
    all.extend(next.clone());
    next
}

#[test]
fn one_player_finishes_immediately() {
    let matches = generate_first(1);
    assert_eq!(matches.len(), 1);
    assert!(matches[0].is_auto_advancement);
    // no further rounds are possible
    assert_eq!(
        next_round_plan(&matches).unwrap_err(),
        ProgressionError::Terminal
    );
    let positions = finalize_positions(&matches).unwrap();
    assert_eq!(positions.first.id, "p1");
    assert!(positions.second.is_none());
    assert!(positions.third.is_none());
}

#[test]
fn two_players_play_one_final() {
    let mut matches = generate_first(2);
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].match_type, MatchType::TwoPlayerFinal);
    decide(&mut matches[0], 3, 1);
    assert_eq!(
        next_round_plan(&matches).unwrap_err(),
        ProgressionError::Terminal
    );
    let positions = finalize_positions(&matches).unwrap();
    assert_eq!(positions.first.id, matches[0].player1_id);
    assert!(positions.third.is_none());
}

#[test]
fn three_players_take_exactly_two_matches() {
    let mut all = generate_first(3);
    assert_eq!(all.len(), 1);
    let initial = all[0].clone();
    assert_eq!(initial.match_type, MatchType::ThreePlayerInitial);
    let waiting = initial.waiting_player_id.clone().unwrap();

    decide(&mut all[0], 3, 0);
    let next = advance(&mut all);
    assert_eq!(next.len(), 1);
    let pos23 = &next[0];
    assert_eq!(pos23.match_type, MatchType::ThreePlayerFinal);
    // the pos-2/3 final pairs the initial loser with the waiting player
    assert_eq!(pos23.player1_id, all[0].player2_id.clone().unwrap());
    assert_eq!(pos23.player2_id.as_deref(), Some(waiting.as_str()));

    let last = all.len() - 1;
    decide(&mut all[last], 3, 2);
    assert_eq!(all.len(), 2);
    let positions = finalize_positions(&all).unwrap();
    assert_eq!(positions.first.id, all[0].player1_id);
    assert_eq!(positions.second.unwrap().id, all[1].player1_id);
    assert_eq!(
        positions.third.unwrap().id,
        all[1].player2_id.clone().unwrap()
    );
}

#[test]
fn four_players_take_exactly_five_matches() {
    let mut all = generate_first(4);
    assert_eq!(all.len(), 2);
    assert!(all.iter().all(|m| m.match_type == MatchType::SemiFinal));

    // semi-final winners are player1 of SF1 and player2 of SF2
    decide(&mut all[0], 3, 0);
    decide(&mut all[1], 0, 3);
    let sf1_winner = all[0].player1_id.clone();
    let sf1_loser = all[0].player2_id.clone().unwrap();
    let sf2_winner = all[1].player2_id.clone().unwrap();
    let sf2_loser = all[1].player1_id.clone();

    let finals = advance(&mut all);
    assert_eq!(finals.len(), 2);
    let wf = finals
        .iter()
        .find(|m| m.match_type == MatchType::WinnersFinal)
        .unwrap();
    let lf = finals
        .iter()
        .find(|m| m.match_type == MatchType::LosersFinal)
        .unwrap();
    assert_eq!(wf.player1_id, sf1_winner);
    assert_eq!(wf.player2_id.as_deref(), Some(sf2_winner.as_str()));
    assert_eq!(lf.player1_id, sf1_loser);
    assert_eq!(lf.player2_id.as_deref(), Some(sf2_loser.as_str()));

    // winners final: sf1 winner takes position 1; losers final: sf1 loser
    // survives, sf2 loser is eliminated
    let wf_index = all.iter().position(|m| m.id == wf.id).unwrap();
    let lf_index = all.iter().position(|m| m.id == lf.id).unwrap();
    decide(&mut all[wf_index], 3, 1);
    decide(&mut all[lf_index], 3, 1);

    let last_round = advance(&mut all);
    assert_eq!(last_round.len(), 1);
    let final_match = &last_round[0];
    assert_eq!(final_match.match_type, MatchType::Final);
    assert_eq!(final_match.player1_id, sf2_winner); // loser of the WF
    assert_eq!(final_match.player2_id.as_deref(), Some(sf1_loser.as_str()));

    let last = all.len() - 1;
    decide(&mut all[last], 3, 0);
    assert_eq!(all.len(), 5);

    let positions = finalize_positions(&all).unwrap();
    assert_eq!(positions.first.id, sf1_winner);
    assert_eq!(positions.second.unwrap().id, sf2_winner);
    assert_eq!(positions.third.unwrap().id, sf1_loser);
    // the losers-final loser holds no position
    let held: Vec<String> = finalize_positions(&all)
        .unwrap()
        .as_map()
        .values()
        .map(|p| p.id.clone())
        .collect();
    assert!(!held.contains(&sf2_loser));
}

#[test]
fn tied_final_cannot_finalize() {
    let mut all = generate_first(2);
    decide(&mut all[0], 2, 2);
    assert!(matches!(
        finalize_positions(&all).unwrap_err(),
        ProgressionError::TieUndecidable(_)
    ));
}
