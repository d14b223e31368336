use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use futures::future::try_join_all;

use baize_lib::{
    brackets::Bracket,
    error::ProgressionError,
    generator::{initial_label, initial_round, materialize, EntityScope},
    levels::Level,
    matches::Match,
    pairings::seeded_rng,
    progression::next_round_plan,
    scheduling::{annotate_matches, SchedulingPreference},
    finalizer::finalize_positions,
};

use crate::{
    api::{
        ConnectionResponse, FinalizeResponse, InitializeResponse, InitializeTournamentRequest,
        PositionMap, PositionsResponse, RoundResponse,
    },
    error::ServiceError,
    resolver::{self, EntityPool},
    store::{StoreError, TournamentStore},
};

/// Orchestrates every endpoint: resolve → validate → generate → annotate →
/// persist. Holds the injected store handle; there is no other shared state.
///
/// Within one entity all effects are serialized by the flow itself; across
/// entities the coordinator fans out. Matches are always persisted before
/// the bracket lists that reference them.
pub struct Coordinator<S> {
    store: S,
}

impl<S: TournamentStore> Coordinator<S> {
    pub fn new(store: S) -> Self {
        Coordinator { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /* ---------- public surface: domain errors become response bodies ---------- */

    pub async fn initialize_tournament(
        &self,
        req: &InitializeTournamentRequest,
    ) -> Result<InitializeResponse, ServiceError> {
        match self.initialize_tournament_inner(req).await {
            Ok(resp) => Ok(resp),
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => Ok(InitializeResponse::failure(&err)),
        }
    }

    pub async fn initialize_level(
        &self,
        tournament_id: &str,
        level: Level,
        requested: Option<Vec<String>>,
    ) -> Result<InitializeResponse, ServiceError> {
        match self
            .initialize_level_inner(tournament_id, level, requested)
            .await
        {
            Ok(resp) => Ok(resp),
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => Ok(InitializeResponse::failure(&err)),
        }
    }

    pub async fn next_round(
        &self,
        tournament_id: &str,
        level: Level,
        entity_id: &str,
    ) -> Result<RoundResponse, ServiceError> {
        match self.next_round_inner(tournament_id, level, entity_id).await {
            Ok(resp) => Ok(resp),
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => Ok(RoundResponse::failure(&err)),
        }
    }

    pub async fn finalize_entity(
        &self,
        tournament_id: &str,
        level: Level,
        entity_id: &str,
    ) -> Result<FinalizeResponse, ServiceError> {
        match self
            .finalize_entity_inner(tournament_id, level, entity_id)
            .await
        {
            Ok(resp) => Ok(resp),
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => Ok(FinalizeResponse::failure(&err)),
        }
    }

    pub async fn entity_positions(
        &self,
        tournament_id: &str,
        level: Level,
        entity_id: &str,
    ) -> Result<PositionsResponse, ServiceError> {
        match self
            .entity_positions_inner(tournament_id, level, entity_id)
            .await
        {
            Ok(resp) => Ok(resp),
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => Ok(PositionsResponse::failure(&err)),
        }
    }

    /// Next round of the top bracket: the national singleton, or the special
    /// singleton when the tournament mixes every registrant
    pub async fn next_round_top(&self, tournament_id: &str) -> Result<RoundResponse, ServiceError> {
        let level = match self.top_level(tournament_id).await {
            Ok(level) => level,
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => return Ok(RoundResponse::failure(&err)),
        };
        let entity = level.singleton_entity().unwrap_or_default().to_string();
        self.next_round(tournament_id, level, &entity).await
    }

    /// Finalize the top bracket, resolving special tournaments to their own
    /// singleton entity
    pub async fn finalize_top(
        &self,
        tournament_id: &str,
    ) -> Result<FinalizeResponse, ServiceError> {
        let level = match self.top_level(tournament_id).await {
            Ok(level) => level,
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => return Ok(FinalizeResponse::failure(&err)),
        };
        let entity = level.singleton_entity().unwrap_or_default().to_string();
        self.finalize_entity(tournament_id, level, &entity).await
    }

    async fn top_level(&self, tournament_id: &str) -> Result<Level, ServiceError> {
        let config = self.store.get_tournament(tournament_id).await?;
        Ok(if config.special {
            Level::Special
        } else {
            Level::National
        })
    }

    pub async fn test_connection(&self) -> ConnectionResponse {
        match self.store.ping().await {
            Ok(()) => ConnectionResponse {
                success: true,
                message: Some("store reachable".into()),
                error: None,
            },
            Err(err) => ConnectionResponse {
                success: false,
                message: None,
                error: Some(err.to_string()),
            },
        }
    }

    /* ---------- initialization ---------- */

    async fn initialize_tournament_inner(
        &self,
        req: &InitializeTournamentRequest,
    ) -> Result<InitializeResponse, ServiceError> {
        let now = Utc::now();
        let tournament_id = req.tournament_id.as_str();
        let mut config = self.store.get_tournament(tournament_id).await?;
        config.id = tournament_id.to_string();

        let special = req.special || config.special;
        let level = if special {
            Level::Special
        } else {
            req.level
                .or(config.hierarchical_level)
                .unwrap_or(Level::Community)
        };
        let pref = req
            .scheduling_preference
            .or(config.scheduling_preference)
            .unwrap_or_default();

        let players = self
            .store
            .get_players(&config.registered_players_ids)
            .await?;
        let pools = resolver::registration_pools(level, &config, players)?;

        let mut bracket = match self.store.get_bracket(tournament_id).await? {
            Some(existing) => existing,
            None => Bracket::new(
                tournament_id,
                config.participant_scope.clone(),
                special,
                now,
            ),
        };
        self.open_level(tournament_id, level, pools, pref, &mut bracket, now)
            .await
    }

    async fn initialize_level_inner(
        &self,
        tournament_id: &str,
        level: Level,
        requested: Option<Vec<String>>,
    ) -> Result<InitializeResponse, ServiceError> {
        let now = Utc::now();
        let config = self.store.get_tournament(tournament_id).await?;
        let pref = config.scheduling_preference.unwrap_or_default();
        let feeder = level.feeder().ok_or_else(|| {
            ProgressionError::InvalidInput(format!("level {level} is not promotion-fed"))
        })?;

        let mut bracket = self
            .store
            .get_bracket(tournament_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("bracket for {tournament_id}")))?;

        let unfinalized = resolver::unfinalized_entities(&bracket, feeder);
        if !unfinalized.is_empty() {
            let total = bracket
                .bracket_levels
                .get(&feeder.to_string())
                .map(|entities| entities.len())
                .unwrap_or_default();
            return Err(ProgressionError::PreviousRoundIncomplete {
                round: format!("{}_Final", feeder.display_name()),
                completed: total - unfinalized.len(),
                total,
                incomplete: unfinalized,
            }
            .into());
        }

        let finishers = resolver::finishers(&bracket, feeder);
        let mut seen = HashSet::new();
        let finisher_ids: Vec<String> = finishers
            .iter()
            .map(|(_, _, p)| p.id.clone())
            .filter(|id| seen.insert(id.clone()))
            .collect();
        let records: HashMap<String, _> = self
            .store
            .get_players(&finisher_ids)
            .await?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();
        let pools =
            resolver::promotion_pools(level, feeder, finishers, &records, requested.as_deref())?;
        self.open_level(tournament_id, level, pools, pref, &mut bracket, now)
            .await
    }

    /// Generates and persists the first round of every resolved entity, then
    /// records them all on the bracket in one write. Entities run
    /// concurrently; the bracket write happens last so no reader can see a
    /// bracket entry whose matches are missing.
    async fn open_level(
        &self,
        tournament_id: &str,
        level: Level,
        pools: Vec<EntityPool>,
        pref: SchedulingPreference,
        bracket: &mut Bracket,
        now: DateTime<Utc>,
    ) -> Result<InitializeResponse, ServiceError> {
        let generated = try_join_all(pools.into_iter().map(|pool| {
            let store = &self.store;
            async move {
                let label = initial_label(pool.players.len());
                let scope = EntityScope::new(tournament_id, level, pool.entity_id.clone(), now);
                let mut rng = seeded_rng(
                    tournament_id,
                    level,
                    &pool.entity_id,
                    &label.as_string(level),
                );
                let mut matches = initial_round(&scope, &pool.players, pool.mode, &mut rng)?;
                annotate_matches(&mut matches, pref);
                store.insert_matches(tournament_id, &matches).await?;
                Ok::<_, ServiceError>((pool.entity_id, pool.players.len(), matches))
            }
        }))
        .await?;

        let mut entities = Vec::with_capacity(generated.len());
        let mut all_matches = Vec::new();
        for (entity_id, player_count, matches) in generated {
            for (label, ids) in group_by_label(&matches) {
                bracket.record_round(level, &entity_id, &label, ids, player_count, now);
            }
            entities.push(entity_id);
            all_matches.extend(matches);
        }
        self.store.upsert_bracket(bracket).await?;
        Ok(InitializeResponse::generated(level, entities, all_matches))
    }

    /* ---------- progression ---------- */

    async fn next_round_inner(
        &self,
        tournament_id: &str,
        level: Level,
        entity_id: &str,
    ) -> Result<RoundResponse, ServiceError> {
        let now = Utc::now();
        let matches = self
            .store
            .entity_matches(tournament_id, level, entity_id)
            .await?;
        if matches.is_empty() {
            return Err(StoreError::NotFound(format!(
                "no matches for {level} entity {entity_id}"
            ))
            .into());
        }

        let plan = match next_round_plan(&matches) {
            Ok(plan) => plan,
            Err(ProgressionError::Terminal) => {
                let positions = self
                    .ensure_positions(tournament_id, level, entity_id, &matches, now)
                    .await?;
                return Ok(RoundResponse::complete(entity_id, positions));
            }
            Err(err) => return Err(err.into()),
        };

        let config = self.store.get_tournament(tournament_id).await?;
        let pref = config.scheduling_preference.unwrap_or_default();

        let label = plan.label();
        let label_string = label.as_string(level);
        let scope = EntityScope::new(tournament_id, level, entity_id, now);
        let mut rng = seeded_rng(tournament_id, level, entity_id, &label_string);
        let mut generated = materialize(&scope, &plan, &mut rng)?;
        annotate_matches(&mut generated, pref);

        // players entering this round, for the bracket summary
        let mut entrants = HashSet::new();
        for m in &generated {
            entrants.insert(m.player1_id.clone());
            if let Some(p2) = m.player2() {
                entrants.insert(p2.id);
            }
        }

        self.store.insert_matches(tournament_id, &generated).await?;
        for (label, ids) in group_by_label(&generated) {
            self.store
                .record_round(
                    tournament_id,
                    level,
                    entity_id,
                    &label,
                    &ids,
                    entrants.len(),
                    now,
                )
                .await?;
        }

        // answer with the persisted documents: on a retry these are the
        // originally created matches, so repeated calls return identical
        // rounds
        let wanted: HashSet<&str> = generated.iter().map(|m| m.id.as_str()).collect();
        let mut persisted: Vec<Match> = self
            .store
            .entity_matches(tournament_id, level, entity_id)
            .await?
            .into_iter()
            .filter(|m| wanted.contains(m.id.as_str()))
            .collect();
        persisted.sort_by_key(|m| {
            generated
                .iter()
                .position(|g| g.id == m.id)
                .unwrap_or(usize::MAX)
        });
        Ok(RoundResponse::generated(entity_id, label_string, persisted))
    }

    /* ---------- finalization ---------- */

    async fn finalize_entity_inner(
        &self,
        tournament_id: &str,
        level: Level,
        entity_id: &str,
    ) -> Result<FinalizeResponse, ServiceError> {
        let now = Utc::now();
        let bracket = self
            .store
            .get_bracket(tournament_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("bracket for {tournament_id}")))?;
        if let Some(existing) = bracket.positions_for(level, entity_id) {
            return Ok(FinalizeResponse::finalized(existing.clone(), true));
        }

        let matches = self
            .store
            .entity_matches(tournament_id, level, entity_id)
            .await?;
        if matches.is_empty() {
            return Err(StoreError::NotFound(format!(
                "no matches for {level} entity {entity_id}"
            ))
            .into());
        }
        let positions = self
            .ensure_positions(tournament_id, level, entity_id, &matches, now)
            .await?;
        Ok(FinalizeResponse::finalized(positions, false))
    }

    /// Derives and writes an entity's positions, or returns the already
    /// finalized ones unchanged. The write is a single field-path update; a
    /// concurrent finalize losing the race simply reads the winner's result.
    async fn ensure_positions(
        &self,
        tournament_id: &str,
        level: Level,
        entity_id: &str,
        matches: &[Match],
        now: DateTime<Utc>,
    ) -> Result<PositionMap, ServiceError> {
        let bracket = self
            .store
            .get_bracket(tournament_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("bracket for {tournament_id}")))?;
        if let Some(existing) = bracket.positions_for(level, entity_id) {
            return Ok(existing.clone());
        }

        let derived = finalize_positions(matches)?;
        let map: PositionMap = derived.as_map();
        match self
            .store
            .write_positions(tournament_id, level, entity_id, &map, now)
            .await
        {
            Ok(()) => Ok(map),
            Err(StoreError::ConflictingWrite(_)) => {
                let bracket = self
                    .store
                    .get_bracket(tournament_id)
                    .await?
                    .ok_or_else(|| StoreError::NotFound(format!("bracket for {tournament_id}")))?;
                bracket
                    .positions_for(level, entity_id)
                    .cloned()
                    .ok_or_else(|| {
                        StoreError::ConflictingWrite(format!(
                            "positions for {level} entity {entity_id}"
                        ))
                        .into()
                    })
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn entity_positions_inner(
        &self,
        tournament_id: &str,
        level: Level,
        entity_id: &str,
    ) -> Result<PositionsResponse, ServiceError> {
        let bracket = self
            .store
            .get_bracket(tournament_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("bracket for {tournament_id}")))?;
        let positions = bracket.positions_for(level, entity_id).ok_or_else(|| {
            StoreError::NotFound(format!(
                "positions for {level} entity {entity_id} are not finalized"
            ))
        })?;
        Ok(PositionsResponse::found(level, entity_id, positions.clone()))
    }
}

/// Groups a generation step's matches by round label, preserving match
/// order, so each label lands under its own bracket key
fn group_by_label(matches: &[Match]) -> Vec<(String, Vec<String>)> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for m in matches {
        if !groups.contains_key(&m.round_number) {
            order.push(m.round_number.clone());
        }
        groups
            .entry(m.round_number.clone())
            .or_default()
            .push(m.id.clone());
    }
    order
        .into_iter()
        .map(|label| {
            let ids = groups.remove(&label).unwrap_or_default();
            (label, ids)
        })
        .collect()
}
