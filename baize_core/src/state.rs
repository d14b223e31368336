use std::{borrow::Cow, collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    bson::{self, doc, Bson, Document},
    options::{ClientOptions, UpdateModifications, UpdateOptions},
    Client as DbClient, Collection, Database,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::Level as LogLevel;

use baize_lib::{
    brackets::{Bracket, BracketLevelEntry, PositionMap, RoundState},
    levels::Level,
    matches::Match,
    players::{Player, RawPlayerRecord},
    tournament::TournamentConfig,
};
use baize_sdk::{
    store::{StoreError, TournamentStore},
    Coordinator,
};

pub type Uri = Cow<'static, str>;

/// A builder for an `AppState`, defaulting every knob from the environment
#[derive(Debug, Clone)]
pub struct AppStateBuilder {
    db_conn: Uri,
    db_name: Option<String>,
}

impl AppStateBuilder {
    /// Starts from `MONGODB_URI`, falling back to a local instance
    pub fn new() -> AppStateBuilder {
        let db_conn = std::env::var("MONGODB_URI")
            .map(Cow::Owned)
            .unwrap_or(Cow::Borrowed("mongodb://localhost:27017"));
        AppStateBuilder {
            db_conn,
            db_name: std::env::var("BAIZE_DB").ok(),
        }
    }

    /// Overrides the MongoDB connection string
    #[allow(dead_code)]
    pub fn address<S: ToString>(mut self, addr: S) -> Self {
        self.db_conn = Cow::Owned(addr.to_string());
        self
    }

    /// Overrides the database name. Default is `baize`, or `baize_testing`
    /// when compiled for testing.
    #[allow(dead_code)]
    pub fn database_name(mut self, name: impl Into<String>) -> Self {
        self.db_name = Some(name.into());
        self
    }

    #[cfg(not(test))]
    fn get_db_name(&self) -> &str {
        self.db_name.as_deref().unwrap_or("baize")
    }

    #[cfg(test)]
    fn get_db_name(&self) -> &str {
        self.db_name.as_deref().unwrap_or("baize_testing")
    }

    /// Connects and assembles the shared state.
    ///
    /// # Panics
    /// Panics if the connection string cannot be parsed.
    pub async fn build(self) -> AppState<MongoStore> {
        let client_options = ClientOptions::parse(&self.db_conn).await.unwrap();
        let db_conn = DbClient::with_options(client_options)
            .unwrap()
            .database(self.get_db_name());
        AppState::with_store(MongoStore::new(db_conn))
    }
}

impl Default for AppStateBuilder {
    fn default() -> Self {
        AppStateBuilder::new()
    }
}

/// Shared handler state: the coordinator over whichever store the binary
/// (or a test) plugged in
pub struct AppState<S> {
    pub coordinator: Arc<Coordinator<S>>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        AppState {
            coordinator: Arc::clone(&self.coordinator),
        }
    }
}

impl<S: TournamentStore> AppState<S> {
    pub fn with_store(store: S) -> Self {
        AppState {
            coordinator: Arc::new(Coordinator::new(store)),
        }
    }
}

/// The MongoDB implementation of the store contract. One document per
/// tournament config, player, match, and bracket; every write is an upsert
/// so retried requests are no-ops.
#[derive(Debug, Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    const TOURNAMENTS_COLL: &'static str = "tournaments";
    const PLAYERS_COLL: &'static str = "players";
    const MATCHES_COLL: &'static str = "matches";
    const BRACKETS_COLL: &'static str = "tournament_brackets";

    pub fn new(db: Database) -> Self {
        MongoStore { db }
    }

    fn tournaments(&self) -> Collection<Document> {
        self.db.collection(Self::TOURNAMENTS_COLL)
    }

    fn players(&self) -> Collection<Document> {
        self.db.collection(Self::PLAYERS_COLL)
    }

    fn matches(&self) -> Collection<Document> {
        self.db.collection(Self::MATCHES_COLL)
    }

    fn brackets(&self) -> Collection<Document> {
        self.db.collection(Self::BRACKETS_COLL)
    }

    /// Match ids are unique per tournament, so the document key carries both
    fn match_key(tournament_id: &str, match_id: &str) -> String {
        format!("{tournament_id}__{match_id}")
    }

    async fn match_docs(&self, filter: Document) -> Result<Vec<Match>, StoreError> {
        let cursor = self.matches().find(filter, None).await.map_err(db_err)?;
        let docs: Vec<Document> = cursor.try_collect().await.map_err(db_err)?;
        docs.into_iter().map(from_doc).collect()
    }

    fn entity_filter(tournament_id: &str, level: Level, entity_id: &str) -> Document {
        let mut filter = doc! {
            "tournamentId": tournament_id,
            "tournamentLevel": level.to_string(),
        };
        match level {
            Level::Community => {
                filter.insert("communityId", entity_id);
            }
            Level::County => {
                filter.insert("countyId", entity_id);
            }
            Level::Regional => {
                filter.insert("regionId", entity_id);
            }
            // the national and special brackets are singletons
            Level::National | Level::Special => {}
        }
        filter
    }
}

fn db_err(err: mongodb::error::Error) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

fn from_doc<T: DeserializeOwned>(mut doc: Document) -> Result<T, StoreError> {
    doc.remove("_id");
    bson::from_document(doc).map_err(|err| StoreError::Unavailable(format!("decode: {err}")))
}

fn to_doc<T: Serialize>(value: &T) -> Result<Document, StoreError> {
    bson::to_document(value).map_err(|err| StoreError::Unavailable(format!("encode: {err}")))
}

fn to_bson<T: Serialize>(value: &T) -> Result<Bson, StoreError> {
    bson::to_bson(value).map_err(|err| StoreError::Unavailable(format!("encode: {err}")))
}

#[async_trait]
impl TournamentStore for MongoStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.db
            .run_command(doc! {"ping": 1}, None)
            .await
            .map(|_| ())
            .map_err(db_err)
    }

    async fn get_tournament(&self, tournament_id: &str) -> Result<TournamentConfig, StoreError> {
        let doc = self
            .tournaments()
            .find_one(doc! {"_id": tournament_id}, None)
            .await
            .map_err(db_err)?
            .ok_or_else(|| StoreError::NotFound(format!("tournament {tournament_id}")))?;
        let mut config: TournamentConfig = from_doc(doc)?;
        config.id = tournament_id.to_string();
        Ok(config)
    }

    async fn get_players(&self, ids: &[String]) -> Result<Vec<Player>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let cursor = self
            .players()
            .find(doc! {"_id": {"$in": ids.to_vec()}}, None)
            .await
            .map_err(db_err)?;
        let docs: Vec<Document> = cursor.try_collect().await.map_err(db_err)?;
        let mut by_id: HashMap<String, Player> = HashMap::with_capacity(docs.len());
        for mut doc in docs {
            let id = doc
                .remove("_id")
                .and_then(|id| match id {
                    Bson::String(s) => Some(s),
                    other => Some(other.to_string()),
                })
                .unwrap_or_default();
            let mut raw: RawPlayerRecord = from_doc(doc)?;
            raw.id = id;
            let player = raw.into_player();
            by_id.insert(player.id.clone(), player);
        }
        // registration order is pairing-relevant; answer in request order
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    async fn entity_matches(
        &self,
        tournament_id: &str,
        level: Level,
        entity_id: &str,
    ) -> Result<Vec<Match>, StoreError> {
        self.match_docs(Self::entity_filter(tournament_id, level, entity_id))
            .await
    }

    async fn round_matches(
        &self,
        tournament_id: &str,
        level: Level,
        entity_id: &str,
        label: &str,
    ) -> Result<Vec<Match>, StoreError> {
        let mut filter = Self::entity_filter(tournament_id, level, entity_id);
        filter.insert("roundNumber", label);
        self.match_docs(filter).await
    }

    async fn insert_matches(
        &self,
        tournament_id: &str,
        matches: &[Match],
    ) -> Result<usize, StoreError> {
        let coll = self.matches();
        let mut created = 0;
        for m in matches {
            let doc = to_doc(m)?;
            let result = coll
                .update_one(
                    doc! {"_id": Self::match_key(tournament_id, &m.id)},
                    UpdateModifications::Document(doc! {"$setOnInsert": doc}),
                    UpdateOptions::builder().upsert(true).build(),
                )
                .await
                .map_err(db_err)?;
            if result.upserted_id.is_some() {
                created += 1;
            }
        }
        Ok(created)
    }

    async fn get_bracket(&self, tournament_id: &str) -> Result<Option<Bracket>, StoreError> {
        self.brackets()
            .find_one(doc! {"_id": tournament_id}, None)
            .await
            .map_err(db_err)?
            .map(from_doc)
            .transpose()
    }

    async fn upsert_bracket(&self, bracket: &Bracket) -> Result<(), StoreError> {
        let doc = to_doc(bracket)?;
        match self
            .brackets()
            .update_one(
                doc! {"_id": &bracket.tournament_id},
                UpdateModifications::Document(doc! {"$set": doc}),
                UpdateOptions::builder().upsert(true).build(),
            )
            .await
        {
            Ok(_) => Ok(()),
            Err(err) => {
                tracing::event!(
                    LogLevel::WARN,
                    "could not persist bracket for tournament {}: {err}",
                    bracket.tournament_id,
                );
                Err(db_err(err))
            }
        }
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
        let current = self
            .get_bracket(tournament_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("bracket for {tournament_id}")))?;

        let summary = BracketLevelEntry {
            player_count,
            current_round: label.to_string(),
            status: RoundState::InProgress,
        };
        let mut set = Document::new();
        set.insert(
            format!("rounds.{level}.{entity_id}.{label}"),
            to_bson(&match_ids)?,
        );
        set.insert(
            format!("roundStatus.{label}"),
            to_bson(&RoundState::InProgress)?,
        );
        set.insert(
            format!("bracketLevels.{level}.{entity_id}"),
            to_doc(&summary)?,
        );
        set.insert("lastUpdated", to_bson(&now)?);
        if let Some(rounds) = current
            .rounds
            .get(&level.to_string())
            .and_then(|entities| entities.get(entity_id))
        {
            for earlier in rounds.keys().filter(|existing| *existing != label) {
                set.insert(
                    format!("roundStatus.{earlier}"),
                    to_bson(&RoundState::Completed)?,
                );
            }
        }
        self.brackets()
            .update_one(
                doc! {"_id": tournament_id},
                UpdateModifications::Document(doc! {"$set": set}),
                None,
            )
            .await
            .map_err(db_err)?;
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
        let path = format!("positions.{level}.{entity_id}");
        let mut filter = doc! {"_id": tournament_id};
        filter.insert(path.clone(), doc! {"$exists": false});
        let mut set = Document::new();
        set.insert(path, to_bson(positions)?);
        set.insert(
            format!("bracketLevels.{level}.{entity_id}.status"),
            to_bson(&RoundState::Completed)?,
        );
        set.insert("lastUpdated", to_bson(&now)?);
        let result = self
            .brackets()
            .update_one(
                filter,
                UpdateModifications::Document(doc! {"$set": set}),
                None,
            )
            .await
            .map_err(db_err)?;
        if result.matched_count != 0 {
            return Ok(());
        }
        match self.get_bracket(tournament_id).await? {
            None => Err(StoreError::NotFound(format!(
                "bracket for {tournament_id}"
            ))),
            Some(bracket) if bracket.positions_for(level, entity_id).is_some() => Err(
                StoreError::ConflictingWrite(format!("positions.{level}.{entity_id}")),
            ),
            Some(_) => Err(StoreError::Unavailable(
                "positions write matched no document".into(),
            )),
        }
    }
}
