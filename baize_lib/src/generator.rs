use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::{
    error::ProgressionError,
    levels::Level,
    matches::{Match, RoundScope},
    pairings::{pair_consecutive, shuffle_pool},
    players::{Player, PlayerRef},
    rounds::RoundLabel,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// How an initial pool is ordered before pairing. True first rounds shuffle;
/// promotion-fed pools arrive pre-sorted by carried position and pair in
/// that order.
pub enum PairingMode {
    Shuffled,
    ByPosition,
}

#[derive(Debug, Clone)]
/// The identity of the entity a round is being generated for
pub struct EntityScope {
    pub tournament_id: String,
    pub level: Level,
    pub entity_id: String,
    pub salt: DateTime<Utc>,
}

impl EntityScope {
    pub fn new(
        tournament_id: impl Into<String>,
        level: Level,
        entity_id: impl Into<String>,
        salt: DateTime<Utc>,
    ) -> Self {
        EntityScope {
            tournament_id: tournament_id.into(),
            level,
            entity_id: entity_id.into(),
            salt,
        }
    }

    fn round(&self, label: RoundLabel) -> RoundScope {
        RoundScope::new(
            self.tournament_id.clone(),
            self.level,
            self.entity_id.clone(),
            label,
            self.salt,
        )
    }
}

#[derive(Debug, Clone)]
/// What the state machine decided to generate next. The generator
/// materializes a plan into match records without re-deciding anything.
pub enum RoundPlan {
    /// Another shuffled elimination round. The pool holds the prior round's
    /// winners plus, when the count was odd, the attached best loser.
    Elimination { number: u32, pool: Vec<PlayerRef> },
    /// Four players remain: two semi-finals
    SemiFinals { pool: Vec<PlayerRef> },
    /// Three players remain: the initial match, one player waiting
    ThreePlayer { pool: Vec<PlayerRef> },
    /// Two players remain: the direct final
    TwoPlayerFinal { high: PlayerRef, low: PlayerRef },
    /// The pos-2/3 final of the three-player scheme
    ThreePlayerFinal { loser: PlayerRef, waiting: PlayerRef },
    /// Winners final and losers final after both semi-finals
    BracketFinals {
        winners: (PlayerRef, PlayerRef),
        losers: (PlayerRef, PlayerRef),
    },
    /// The four-player scheme's last match
    GrandFinal {
        wf_loser: PlayerRef,
        lf_winner: PlayerRef,
    },
}

impl RoundPlan {
    /// The label the shuffle is seeded with and the round is reported under.
    /// The bracket finals span two labels; the winners final is primary.
    pub fn label(&self) -> RoundLabel {
        use RoundPlan::*;
        match self {
            Elimination { number, .. } => RoundLabel::Round(*number),
            SemiFinals { .. } | ThreePlayer { .. } => RoundLabel::SemiFinal,
            TwoPlayerFinal { .. } | ThreePlayerFinal { .. } => RoundLabel::Final,
            BracketFinals { .. } => RoundLabel::WinnersFinal,
            GrandFinal { .. } => RoundLabel::FourPlayerFinal,
        }
    }
}

/// The label of an entity's very first round, decided by pool size alone
pub fn initial_label(pool_size: usize) -> RoundLabel {
    match pool_size {
        0..=3 => RoundLabel::Final,
        4 => RoundLabel::SemiFinal,
        _ => RoundLabel::Round(1),
    }
}

fn check_distinct(pool: &[Player]) -> Result<(), ProgressionError> {
    let mut seen = HashSet::with_capacity(pool.len());
    for p in pool {
        if p.id.is_empty() {
            return Err(ProgressionError::InvalidInput(
                "registered player with empty id".into(),
            ));
        }
        if !seen.insert(p.id.as_str()) {
            return Err(ProgressionError::DuplicatePlayer(p.id.clone()));
        }
    }
    Ok(())
}

/// Generates an entity's first round from its registered pool. Pools of four
/// or fewer players go straight into the positioning schemes; larger pools
/// play a shuffled (or position-ordered, for promotion) elimination round.
pub fn initial_round<R: Rng>(
    scope: &EntityScope,
    pool: &[Player],
    mode: PairingMode,
    rng: &mut R,
) -> Result<Vec<Match>, ProgressionError> {
    check_distinct(pool)?;
    let mut refs: Vec<PlayerRef> = pool.iter().map(Player::as_ref).collect();
    match refs.len() {
        0 => Err(ProgressionError::InsufficientPlayers),
        1 => {
            let round = scope.round(RoundLabel::Final);
            Ok(vec![Match::new_auto_advancement(&round, &refs[0])?])
        }
        2 => {
            let round = scope.round(RoundLabel::Final);
            Ok(vec![Match::new_two_player_final(&round, &refs[0], &refs[1])?])
        }
        3 => {
            shuffle_pool(&mut refs, rng);
            let round = scope.round(RoundLabel::Final);
            Ok(vec![Match::new_three_player_initial(
                &round, &refs[0], &refs[1], &refs[2],
            )?])
        }
        4 => {
            shuffle_pool(&mut refs, rng);
            let round = scope.round(RoundLabel::SemiFinal);
            Ok(vec![
                Match::new_semi_final(&round, 1, &refs[0], &refs[1])?,
                Match::new_semi_final(&round, 2, &refs[2], &refs[3])?,
            ])
        }
        _ => {
            let round = scope.round(RoundLabel::Round(1));
            match mode {
                PairingMode::Shuffled => {
                    shuffle_pool(&mut refs, rng);
                    elimination_matches(&round, &refs, OddPolicy::DoubleDuty, rng)
                }
                PairingMode::ByPosition => {
                    elimination_matches(&round, &refs, OddPolicy::Bye, rng)
                }
            }
        }
    }
}

/// Materializes a state-machine plan into the next round's matches
pub fn materialize<R: Rng>(
    scope: &EntityScope,
    plan: &RoundPlan,
    rng: &mut R,
) -> Result<Vec<Match>, ProgressionError> {
    use RoundPlan::*;
    match plan {
        Elimination { number, pool } => {
            if pool.len() < 2 {
                return Err(ProgressionError::UnexpectedPoolSize(pool.len()));
            }
            let round = scope.round(RoundLabel::Round(*number));
            let mut refs = pool.clone();
            shuffle_pool(&mut refs, rng);
            elimination_matches(&round, &refs, OddPolicy::Bye, rng)
        }
        SemiFinals { pool } => {
            if pool.len() != 4 {
                return Err(ProgressionError::UnexpectedPoolSize(pool.len()));
            }
            let round = scope.round(RoundLabel::SemiFinal);
            let mut refs = pool.clone();
            shuffle_pool(&mut refs, rng);
            Ok(vec![
                Match::new_semi_final(&round, 1, &refs[0], &refs[1])?,
                Match::new_semi_final(&round, 2, &refs[2], &refs[3])?,
            ])
        }
        ThreePlayer { pool } => {
            if pool.len() != 3 {
                return Err(ProgressionError::UnexpectedPoolSize(pool.len()));
            }
            let round = scope.round(RoundLabel::SemiFinal);
            let mut refs = pool.clone();
            shuffle_pool(&mut refs, rng);
            Ok(vec![Match::new_three_player_initial(
                &round, &refs[0], &refs[1], &refs[2],
            )?])
        }
        TwoPlayerFinal { high, low } => {
            let round = scope.round(RoundLabel::Final);
            Ok(vec![Match::new_two_player_final(&round, high, low)?])
        }
        ThreePlayerFinal { loser, waiting } => {
            let round = scope.round(RoundLabel::Final);
            Ok(vec![Match::new_three_player_final(&round, loser, waiting)?])
        }
        BracketFinals { winners, losers } => {
            let wf_round = scope.round(RoundLabel::WinnersFinal);
            let lf_round = scope.round(RoundLabel::LosersFinal);
            Ok(vec![
                Match::new_winners_final(&wf_round, &winners.0, &winners.1)?,
                Match::new_losers_final(&lf_round, &losers.0, &losers.1)?,
            ])
        }
        GrandFinal { wf_loser, lf_winner } => {
            let round = scope.round(RoundLabel::FourPlayerFinal);
            Ok(vec![Match::new_final(&round, wf_loser, lf_winner)?])
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OddPolicy {
    /// First-round-only: the odd player plays a random paired player twice
    DoubleDuty,
    /// The odd player receives a bye
    Bye,
}

fn elimination_matches<R: Rng>(
    round: &RoundScope,
    refs: &[PlayerRef],
    odd_policy: OddPolicy,
    rng: &mut R,
) -> Result<Vec<Match>, ProgressionError> {
    let (pairs, leftover) = pair_consecutive(refs);
    let mut matches = Vec::with_capacity(pairs.len() + 1);
    for (number, (a, b)) in pairs.iter().enumerate() {
        matches.push(Match::new(round, number as u32 + 1, a, b)?);
    }
    if let Some(odd) = leftover {
        let number = pairs.len() as u32 + 1;
        match odd_policy {
            OddPolicy::DoubleDuty if !pairs.is_empty() => {
                let paired: Vec<&PlayerRef> =
                    pairs.iter().flat_map(|(a, b)| [a, b]).collect();
                let opponent = paired[rng.gen_range(0..paired.len())];
                matches.push(Match::new_double_duty(round, number, &odd, opponent)?);
            }
            _ => {
                matches.push(Match::new_bye(round, 1, number, &odd)?);
            }
        }
    }
    Ok(matches)
}
