use crate::{matches::Match, players::PlayerRef};

/// Derives the winner of a completed match from its points alone. `None`
/// means undecided: the match is not completed, a participant is missing, or
/// the points are equal. Persisted `winnerId`/`loserId` fields are never
/// consulted.
pub fn winner_of(m: &Match) -> Option<PlayerRef> {
    if !m.is_completed() {
        return None;
    }
    if m.is_bye_match || m.is_auto_advancement {
        return Some(m.player1());
    }
    let p2 = m.player2()?;
    if m.player1_id.is_empty() {
        return None;
    }
    match m.player1_points.cmp(&m.player2_points) {
        std::cmp::Ordering::Greater => Some(m.player1()),
        std::cmp::Ordering::Less => Some(p2),
        std::cmp::Ordering::Equal => None,
    }
}

/// Derives the loser of a completed match from its points alone. Byes and
/// auto-advancements have no loser.
pub fn loser_of(m: &Match) -> Option<PlayerRef> {
    if !m.is_completed() || m.is_bye_match || m.is_auto_advancement {
        return None;
    }
    let p2 = m.player2()?;
    if m.player1_id.is_empty() {
        return None;
    }
    match m.player1_points.cmp(&m.player2_points) {
        std::cmp::Ordering::Greater => Some(p2),
        std::cmp::Ordering::Less => Some(m.player1()),
        std::cmp::Ordering::Equal => None,
    }
}
