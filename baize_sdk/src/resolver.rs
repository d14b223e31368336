use std::collections::{BTreeMap, HashMap};

use baize_lib::{
    brackets::Bracket,
    error::ProgressionError,
    generator::PairingMode,
    levels::Level,
    players::{sort_for_promotion, Player, PlayerRef},
    tournament::TournamentConfig,
};

#[derive(Debug, Clone)]
/// One entity's pool, ready for round generation
pub struct EntityPool {
    pub entity_id: String,
    pub players: Vec<Player>,
    pub mode: PairingMode,
}

/// Partitions the registered players of a tournament into the entities of
/// its starting level. Special and national tournaments mix everyone into
/// the singleton entity; geographic levels group by the matching field and
/// honor the participant scope. Players with no geography for the level are
/// left out rather than guessed at.
pub fn registration_pools(
    level: Level,
    config: &TournamentConfig,
    players: Vec<Player>,
) -> Result<Vec<EntityPool>, ProgressionError> {
    if players.is_empty() {
        return Err(ProgressionError::InsufficientPlayers);
    }
    if let Some(entity) = level.singleton_entity() {
        return Ok(vec![EntityPool {
            entity_id: entity.to_string(),
            players,
            mode: PairingMode::Shuffled,
        }]);
    }

    let mut grouped: BTreeMap<String, Vec<Player>> = BTreeMap::new();
    for player in players {
        let Some(entity) = level.entity_of(&player).map(str::to_string) else {
            continue;
        };
        if level == Level::Community {
            if let Some(scope) = &config.participant_scope {
                if !scope.admits_community(&entity) {
                    continue;
                }
            }
        }
        grouped.entry(entity).or_default().push(player);
    }
    if grouped.is_empty() {
        return Err(ProgressionError::InsufficientPlayers);
    }
    Ok(grouped
        .into_iter()
        .map(|(entity_id, players)| EntityPool {
            entity_id,
            players,
            mode: PairingMode::Shuffled,
        })
        .collect())
}

/// The feeder-level entities that have not finalized yet; promotion is only
/// available once this is empty
pub fn unfinalized_entities(bracket: &Bracket, feeder: Level) -> Vec<String> {
    bracket
        .bracket_levels
        .get(&feeder.to_string())
        .map(|entities| {
            entities
                .keys()
                .filter(|entity| bracket.positions_for(feeder, entity).is_none())
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

/// Collects every finisher of the feeder level from the bracket's position
/// maps: (feeder entity, position, player)
pub fn finishers(bracket: &Bracket, feeder: Level) -> Vec<(String, u8, PlayerRef)> {
    let mut found = Vec::new();
    if let Some(entities) = bracket.positions.get(&feeder.to_string()) {
        for (entity, positions) in entities {
            for (position, player) in positions {
                let Ok(position) = position.parse::<u8>() else {
                    continue;
                };
                found.push((entity.clone(), position, player.clone()));
            }
        }
    }
    found
}

/// Builds the promotion pools of a level from the feeder's finishers. Each
/// finisher is tagged with the position it carried out of its entity, full
/// player records supply the geography, and every pool is ordered so that
/// position-1s pair first.
pub fn promotion_pools(
    level: Level,
    feeder: Level,
    finishers: Vec<(String, u8, PlayerRef)>,
    records: &HashMap<String, Player>,
    requested: Option<&[String]>,
) -> Result<Vec<EntityPool>, ProgressionError> {
    let mut grouped: BTreeMap<String, Vec<Player>> = BTreeMap::new();
    for (feeder_entity, position, finisher) in finishers {
        let mut player = match records.get(&finisher.id) {
            Some(record) => record.clone(),
            None => {
                let mut p = Player::new(finisher.id.clone(), finisher.name.clone());
                p.community_id = finisher.community_id.clone();
                p
            }
        };
        // the bracket is authoritative for where the finisher came from
        match feeder {
            Level::Community => player.community_id = Some(feeder_entity.clone()),
            Level::County => player.county_id = Some(feeder_entity.clone()),
            Level::Regional => player.region_id = Some(feeder_entity.clone()),
            _ => {}
        }
        feeder.tag_position(&mut player, position);
        let Some(entity) = level.entity_of(&player).map(str::to_string) else {
            continue;
        };
        if let Some(wanted) = requested {
            if !wanted.iter().any(|w| *w == entity) {
                continue;
            }
        }
        grouped.entry(entity).or_default().push(player);
    }
    if grouped.is_empty() {
        return Err(ProgressionError::InsufficientPlayers);
    }
    Ok(grouped
        .into_iter()
        .map(|(entity_id, mut players)| {
            sort_for_promotion(&mut players, level);
            EntityPool {
                entity_id,
                players,
                mode: PairingMode::ByPosition,
            }
        })
        .collect())
}
