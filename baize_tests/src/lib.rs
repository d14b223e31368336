//! Spoofed data for the baize test suites: players, pools, tournament
//! configs, result recording, and (behind the `sdk` feature) an in-memory
//! `TournamentStore` the coordinator tests run against.

use baize_lib::{
    matches::{Match, MatchStatus},
    players::Player,
    tournament::TournamentConfig,
};
use uuid::Uuid;

#[cfg(feature = "sdk")]
mod memory_store;
#[cfg(feature = "sdk")]
pub use memory_store::MemoryStore;

/// A random opaque id, the shape real document stores hand out
pub fn spoof_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// A player with fixed id and name, homed in the given community
pub fn spoof_player(id: &str, community: &str) -> Player {
    let mut player = Player::new(id, id.to_uppercase());
    player.community_id = Some(community.to_string());
    player
}

/// `count` players named `<prefix>1..=<prefix>count`, all in one community
pub fn spoof_pool(prefix: &str, count: usize, community: &str) -> Vec<Player> {
    (1..=count)
        .map(|i| spoof_player(&format!("{prefix}{i}"), community))
        .collect()
}

/// A community-level tournament config over the given players
pub fn spoof_config(tournament_id: &str, players: &[Player]) -> TournamentConfig {
    TournamentConfig {
        id: tournament_id.to_string(),
        hierarchical_level: None,
        participant_scope: None,
        registered_players_ids: players.iter().map(|p| p.id.clone()).collect(),
        special: false,
        scheduling_preference: None,
    }
}

/// Records a result the way the outside world does: set the points, mark the
/// match completed
pub fn decide(m: &mut Match, player1_points: i64, player2_points: i64) {
    m.player1_points = player1_points;
    m.player2_points = player2_points;
    m.status = MatchStatus::Completed;
}
