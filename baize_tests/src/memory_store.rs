use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use baize_lib::{
    brackets::{Bracket, PositionMap},
    levels::Level,
    matches::Match,
    players::Player,
    tournament::TournamentConfig,
};
use baize_sdk::store::{StoreError, TournamentStore};

#[derive(Default)]
struct Inner {
    tournaments: HashMap<String, TournamentConfig>,
    players: HashMap<String, Player>,
    /// tournament id → match id → document
    matches: HashMap<String, BTreeMap<String, Match>>,
    brackets: HashMap<String, Bracket>,
}

/// An in-memory `TournamentStore` with the same semantics the real adapter
/// guarantees: insert-if-absent matches, field-path round recording, and
/// write-once positions.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn seed_tournament(&self, config: TournamentConfig) {
        let mut inner = self.inner.lock().unwrap();
        inner.tournaments.insert(config.id.clone(), config);
    }

    pub fn seed_players(&self, players: impl IntoIterator<Item = Player>) {
        let mut inner = self.inner.lock().unwrap();
        for player in players {
            inner.players.insert(player.id.clone(), player);
        }
    }

    /// Records a result on a persisted match, as the score-entry surface
    /// would
    pub fn set_result(
        &self,
        tournament_id: &str,
        match_id: &str,
        player1_points: i64,
        player2_points: i64,
    ) {
        let mut inner = self.inner.lock().unwrap();
        let m = inner
            .matches
            .get_mut(tournament_id)
            .and_then(|docs| docs.get_mut(match_id))
            .unwrap_or_else(|| panic!("no match {match_id} in {tournament_id}"));
        m.player1_points = player1_points;
        m.player2_points = player2_points;
        m.status = baize_lib::matches::MatchStatus::Completed;
    }

    pub fn get_match(&self, tournament_id: &str, match_id: &str) -> Option<Match> {
        let inner = self.inner.lock().unwrap();
        inner
            .matches
            .get(tournament_id)
            .and_then(|docs| docs.get(match_id))
            .cloned()
    }

    pub fn match_count(&self, tournament_id: &str) -> usize {
        let inner = self.inner.lock().unwrap();
        inner
            .matches
            .get(tournament_id)
            .map(|docs| docs.len())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TournamentStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn get_tournament(&self, tournament_id: &str) -> Result<TournamentConfig, StoreError> {
        let inner = self.inner.lock().unwrap();
        inner
            .tournaments
            .get(tournament_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("tournament {tournament_id}")))
    }

    async fn get_players(&self, ids: &[String]) -> Result<Vec<Player>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| inner.players.get(id).cloned())
            .collect())
    }

    async fn entity_matches(
        &self,
        tournament_id: &str,
        level: Level,
        entity_id: &str,
    ) -> Result<Vec<Match>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .matches
            .get(tournament_id)
            .map(|docs| {
                docs.values()
                    .filter(|m| {
                        m.tournament_level == level && m.entity_id() == Some(entity_id)
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn round_matches(
        &self,
        tournament_id: &str,
        level: Level,
        entity_id: &str,
        label: &str,
    ) -> Result<Vec<Match>, StoreError> {
        Ok(self
            .entity_matches(tournament_id, level, entity_id)
            .await?
            .into_iter()
            .filter(|m| m.round_number == label)
            .collect())
    }

    async fn insert_matches(
        &self,
        tournament_id: &str,
        matches: &[Match],
    ) -> Result<usize, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let docs = inner.matches.entry(tournament_id.to_string()).or_default();
        let mut created = 0;
        for m in matches {
            if !docs.contains_key(&m.id) {
                docs.insert(m.id.clone(), m.clone());
                created += 1;
            }
        }
        Ok(created)
    }

    async fn get_bracket(&self, tournament_id: &str) -> Result<Option<Bracket>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.brackets.get(tournament_id).cloned())
    }

    async fn upsert_bracket(&self, bracket: &Bracket) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .brackets
            .insert(bracket.tournament_id.clone(), bracket.clone());
        Ok(())
    }

    async fn record_round(
        &self,
        tournament_id: &str,
        level: Level,
        entity_id: &str,
        label: &str,
        match_ids: &[String],
        player_count: usize,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let bracket = inner
            .brackets
            .get_mut(tournament_id)
            .ok_or_else(|| StoreError::NotFound(format!("bracket for {tournament_id}")))?;
        bracket.record_round(level, entity_id, label, match_ids.to_vec(), player_count, now);
        Ok(())
    }

    async fn write_positions(
        &self,
        tournament_id: &str,
        level: Level,
        entity_id: &str,
        positions: &PositionMap,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let bracket = inner
            .brackets
            .get_mut(tournament_id)
            .ok_or_else(|| StoreError::NotFound(format!("bracket for {tournament_id}")))?;
        if bracket.set_positions(level, entity_id, positions.clone(), now) {
            Ok(())
        } else {
            Err(StoreError::ConflictingWrite(format!(
                "positions.{level}.{entity_id}"
            )))
        }
    }
}
