//! Elimination-round behavior for pools of five and more: pairing counts,
//! the double-duty extra, byes, best-loser attachment, and a full run from
//! the opening round down to finalized positions.

use std::collections::HashSet;

use chrono::{TimeZone, Utc};

use baize_lib::{
    finalizer::finalize_positions,
    generator::{initial_round, materialize, EntityScope, PairingMode},
    levels::Level,
    matches::{Match, MatchType},
    oracle::winner_of,
    pairings::seeded_rng,
    progression::{decided, next_round_plan},
    error::ProgressionError,
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
    let mut rng = seeded_rng("T1", Level::Community, "C1", "R1");
    initial_round(&scope(), &pool, PairingMode::Shuffled, &mut rng).unwrap()
}

#[test]
fn match_count_follows_the_pool_size() {
    // ⌊N/2⌋ ordinary matches plus at most one extra
    for count in 5..=24 {
        let matches = generate_first(count);
        let ordinary = matches
            .iter()
            .filter(|m| m.match_type == MatchType::Standard)
            .count();
        let extras = matches.len() - ordinary;
        assert_eq!(ordinary, count / 2, "pool of {count}");
        assert!(extras <= 1, "pool of {count}");
    }
}

#[test]
fn every_player_appears_and_ids_are_unique() {
    let matches = generate_first(13);
    let mut ids = HashSet::new();
    let mut players = HashSet::new();
    for m in &matches {
        assert!(ids.insert(m.id.clone()), "duplicate id {}", m.id);
        players.insert(m.player1_id.clone());
        if let Some(p2) = m.player2() {
            players.insert(p2.id);
        }
    }
    assert_eq!(players.len(), 13);
}

#[test]
fn odd_first_round_uses_double_duty_not_a_bye() {
    let matches = generate_first(7);
    assert_eq!(matches.len(), 4);
    let extra = matches
        .iter()
        .find(|m| m.match_type == MatchType::DoubleDuty)
        .unwrap();
    assert!(extra.special_match);
    assert!(matches.iter().all(|m| !m.is_bye_match));
    // the extra is born unplayed, unlike a bye
    assert!(!decided(extra));
}

#[test]
fn winners_feed_the_next_round() {
    let mut all = generate_first(16);
    for m in all.iter_mut() {
        decide(m, 3, 1);
    }
    let plan = next_round_plan(&all).unwrap();
    let mut rng = seeded_rng("T1", Level::Community, "C1", "R2");
    let next = materialize(&scope(), &plan, &mut rng).unwrap();
    assert_eq!(next.len(), 4);
    assert!(next.iter().all(|m| m.round_number == "R2"));

    let winners: HashSet<String> = all.iter().filter_map(|m| winner_of(m)).map(|w| w.id).collect();
    for m in &next {
        assert!(winners.contains(&m.player1_id));
        assert!(winners.contains(&m.player2().unwrap().id));
    }
}

#[test]
fn odd_winner_pool_absorbs_the_best_loser() {
    // 14 players: 7 ordinary matches, 7 winners; the best loser is attached
    // so round two needs no bye
    let mut all = generate_first(14);
    for (i, m) in all.iter_mut().enumerate() {
        decide(m, 3, i as i64 % 3);
    }
    let plan = next_round_plan(&all).unwrap();
    let mut rng = seeded_rng("T1", Level::Community, "C1", "R2");
    let next = materialize(&scope(), &plan, &mut rng).unwrap();
    assert_eq!(next.len(), 4);
    assert!(next.iter().all(|m| !m.is_bye_match));
}

#[test]
fn nine_players_reach_positions() {
    let mut all = generate_first(9);
    // play every round by awarding player1 the win until the bracket is done
    loop {
        for m in all.iter_mut() {
            if !decided(m) {
                decide(m, 3, 0);
            }
        }
        match next_round_plan(&all) {
            Ok(plan) => {
                let label = plan.label().as_string(Level::Community);
                let mut rng = seeded_rng("T1", Level::Community, "C1", &label);
                let next = materialize(&scope(), &plan, &mut rng).unwrap();
                assert!(!next.is_empty());
                all.extend(next);
            }
            Err(ProgressionError::Terminal) => break,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    let positions = finalize_positions(&all).unwrap();
    let map = positions.as_map();
    assert_eq!(map.len(), 3);
    let mut distinct = HashSet::new();
    for p in map.values() {
        assert!(distinct.insert(p.id.clone()));
    }
}

#[test]
fn promotion_style_pools_take_byes() {
    let pool = spoof_pool("p", 9, "C1");
    let mut rng = seeded_rng("T1", Level::County, "K1", "R1");
    let scope = EntityScope::new(
        "T1",
        Level::County,
        "K1",
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
    );
    let matches = initial_round(&scope, &pool, PairingMode::ByPosition, &mut rng).unwrap();
    assert_eq!(matches.len(), 5);
    let byes: Vec<&Match> = matches.iter().filter(|m| m.is_bye_match).collect();
    assert_eq!(byes.len(), 1);
    assert!(decided(byes[0]));
    assert_eq!(winner_of(byes[0]).unwrap().id, "p9");
}
