use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use baize_lib::{
    brackets::{Bracket, PositionMap},
    levels::Level,
    matches::Match,
    players::Player,
    tournament::TournamentConfig,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Failures surfaced by a `TournamentStore` implementation
pub enum StoreError {
    /// The requested document does not exist
    NotFound(String),
    /// A write-once field was already written
    ConflictingWrite(String),
    /// The backing store could not be reached
    Unavailable(String),
}

impl StoreError {
    /// The bare kind name used in response bodies
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::NotFound(_) => "NotFound",
            StoreError::ConflictingWrite(_) => "ConflictingWrite",
            StoreError::Unavailable(_) => "StoreUnavailable",
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound(what) => write!(f, "NotFound: {what}"),
            StoreError::ConflictingWrite(what) => write!(f, "ConflictingWrite: {what}"),
            StoreError::Unavailable(what) => write!(f, "StoreUnavailable: {what}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// The persistence contract the coordinator runs against. This is the only
/// seam that touches external storage; everything above it is pure.
///
/// Two ordering rules bind implementations:
/// - `insert_matches` must be insert-if-absent: a regenerated match never
///   overwrites a persisted one, so retries cannot clobber recorded results.
/// - Round recording and position writes are field-path mutations of the
///   bracket document, so entities can progress in parallel without
///   trampling each other. Positions are write-once; a second write fails
///   with `ConflictingWrite`.
#[async_trait]
pub trait TournamentStore: Send + Sync {
    /// Cheap reachability probe for the liveness endpoint
    async fn ping(&self) -> Result<(), StoreError>;

    async fn get_tournament(&self, tournament_id: &str) -> Result<TournamentConfig, StoreError>;

    /// Resolves player records for the given ids, in id order. Unknown ids
    /// are skipped, not errors.
    async fn get_players(&self, ids: &[String]) -> Result<Vec<Player>, StoreError>;

    /// Every match of one entity's bracket, across all rounds
    async fn entity_matches(
        &self,
        tournament_id: &str,
        level: Level,
        entity_id: &str,
    ) -> Result<Vec<Match>, StoreError>;

    /// The matches of one labeled round of one entity
    async fn round_matches(
        &self,
        tournament_id: &str,
        level: Level,
        entity_id: &str,
        label: &str,
    ) -> Result<Vec<Match>, StoreError>;

    /// Persists generated matches, skipping ids that already exist.
    /// Returns how many documents were newly created.
    async fn insert_matches(
        &self,
        tournament_id: &str,
        matches: &[Match],
    ) -> Result<usize, StoreError>;

    async fn get_bracket(&self, tournament_id: &str) -> Result<Option<Bracket>, StoreError>;

    /// Creates or replaces the bracket document. Used at initialization
    /// only; later mutations go through the field-path operations below.
    async fn upsert_bracket(&self, bracket: &Bracket) -> Result<(), StoreError>;

    /// Field-path update recording one generated round under
    /// `rounds.<level>.<entity>.<label>`. The matches must already be
    /// persisted when this lands.
    async fn record_round(
        &self,
        tournament_id: &str,
        level: Level,
        entity_id: &str,
        label: &str,
        match_ids: &[String],
        player_count: usize,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Atomic write-once update of `positions.<level>.<entity>`. Fails with
    /// `ConflictingWrite` when positions already exist.
    async fn write_positions(
        &self,
        tournament_id: &str,
        level: Level,
        entity_id: &str,
        positions: &PositionMap,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}
