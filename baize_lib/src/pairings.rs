use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};

use fxhash::FxHasher64;
use itertools::Itertools;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

use crate::{
    levels::Level,
    matches::Match,
    oracle::{loser_of, winner_of},
    players::PlayerRef,
};

/// The default shuffle source: a PRNG seeded from the round's identity so a
/// regenerated round pairs identically. Tests and callers may inject any
/// other `Rng` into the generator instead.
pub fn seeded_rng(tournament_id: &str, level: Level, entity_id: &str, label: &str) -> StdRng {
    let mut hasher = FxHasher64::default();
    tournament_id.hash(&mut hasher);
    level.prefix().hash(&mut hasher);
    entity_id.hash(&mut hasher);
    label.hash(&mut hasher);
    StdRng::seed_from_u64(hasher.finish())
}

/// Shuffles a pool in place with the injected source
pub fn shuffle_pool<T, R: Rng>(pool: &mut [T], rng: &mut R) {
    pool.shuffle(rng);
}

/// Pairs an ordered pool consecutively: (0,1), (2,3), … The odd element, if
/// any, is returned unpaired for the caller to absorb with a bye or the
/// double-duty extra.
pub fn pair_consecutive(pool: &[PlayerRef]) -> (Vec<(PlayerRef, PlayerRef)>, Option<PlayerRef>) {
    let pairs = pool
        .iter()
        .tuples()
        .map(|(a, b)| (a.clone(), b.clone()))
        .collect();
    let leftover = (pool.len() % 2 == 1).then(|| pool[pool.len() - 1].clone());
    (pairs, leftover)
}

#[derive(Debug, Default, Clone)]
struct LoserLine {
    player: Option<PlayerRef>,
    total_points: i64,
    matches: i64,
}

/// Ranks the losers of a completed round and returns the best-performing
/// one: highest total points, then highest average points per match, then
/// lexicographic name. Totals are computed from the round's own match
/// history, never from stored aggregate fields. Players who won any match of
/// the round (double-duty) are not losers.
pub fn best_loser(prior_round: &[&Match]) -> Option<PlayerRef> {
    let winners: HashSet<String> = prior_round
        .iter()
        .filter_map(|m| winner_of(m))
        .map(|w| w.id)
        .collect();

    let mut lines: HashMap<String, LoserLine> = HashMap::new();
    for m in prior_round {
        if m.is_bye_match || m.is_auto_advancement || !m.is_completed() {
            continue;
        }
        if loser_of(m).is_none() {
            continue;
        }
        let sides = [
            (m.player1(), m.player1_points),
            match m.player2() {
                Some(p2) => (p2, m.player2_points),
                None => continue,
            },
        ];
        for (player, points) in sides {
            if winners.contains(&player.id) {
                continue;
            }
            let line = lines.entry(player.id.clone()).or_default();
            line.total_points += points;
            line.matches += 1;
            line.player.get_or_insert(player);
        }
    }

    let mut ranked: Vec<LoserLine> = lines.into_values().collect();
    ranked.sort_by(|a, b| {
        b.total_points
            .cmp(&a.total_points)
            // average comparison via cross-multiplication; match counts are
            // small and positive
            .then_with(|| (b.total_points * a.matches).cmp(&(a.total_points * b.matches)))
            .then_with(|| {
                let name_a = a.player.as_ref().map(|p| p.name.as_str()).unwrap_or("");
                let name_b = b.player.as_ref().map(|p| p.name.as_str()).unwrap_or("");
                name_a.cmp(name_b)
            })
    });
    ranked.into_iter().next().and_then(|line| line.player)
}
