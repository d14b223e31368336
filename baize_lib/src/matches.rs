use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::{
    error::ProgressionError,
    identifiers::{match_id, MatchSuffix},
    levels::Level,
    players::PlayerRef,
    rounds::RoundLabel,
    scheduling::SchedulingInfo,
};

/// Canonical points awarded to the live player of a bye or auto-advancement
pub const CANONICAL_WIN_POINTS: i64 = 3;

/// The literal opponent id carried by bye matches
pub const BYE_OPPONENT: &str = "BYE";

#[derive(Serialize, Deserialize, Default, Debug, Clone, Copy, Hash, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
/// A match's lifecycle. Transitions only move forward; `cancelled` and
/// `disputed` are absorbing. The progression core reads completed matches
/// only.
pub enum MatchStatus {
    #[default]
    Scheduled,
    Live,
    Completed,
    Cancelled,
    Disputed,
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, Copy, Hash, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
/// What role a match plays in its bracket. The state machine and the
/// position finalizer dispatch on this tag, never on raw strings. The legacy
/// variants appear only in brackets written by older generators.
pub enum MatchType {
    #[default]
    Standard,
    Bye,
    AutoAdvancement,
    TwoPlayerFinal,
    ThreePlayerInitial,
    ThreePlayerFinal,
    SemiFinal,
    WinnersFinal,
    LosersFinal,
    Final,
    DoubleDuty,
    #[serde(rename = "legacy_wb")]
    LegacyWb,
    #[serde(rename = "legacy_lb")]
    LegacyLb,
    #[serde(rename = "legacy_3ws")]
    Legacy3ws,
}

#[derive(Debug, Clone)]
/// Identity shared by every match of one generated round
pub struct RoundScope {
    pub tournament_id: String,
    pub level: Level,
    pub entity_id: String,
    pub label: RoundLabel,
    pub salt: DateTime<Utc>,
}

impl RoundScope {
    pub fn new(
        tournament_id: impl Into<String>,
        level: Level,
        entity_id: impl Into<String>,
        label: RoundLabel,
        salt: DateTime<Utc>,
    ) -> Self {
        RoundScope {
            tournament_id: tournament_id.into(),
            level,
            entity_id: entity_id.into(),
            label,
            salt,
        }
    }

    /// This round's label string as persisted on matches and bracket keys
    pub fn label_string(&self) -> String {
        self.label.as_string(self.level)
    }
}

#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
/// One match document. Identity fields are immutable; results (`status`,
/// points) are set externally and read back by the oracles. `winnerId` and
/// `loserId` are kept for the UI layer and never consulted by progression.
pub struct Match {
    pub id: String,
    pub tournament_id: String,
    pub tournament_level: Level,
    /// The round label string, e.g. `R1` or `Community_SF`
    pub round_number: String,
    pub match_number: u32,
    pub community_id: Option<String>,
    pub county_id: Option<String>,
    pub region_id: Option<String>,
    pub player1_id: String,
    pub player1_name: String,
    pub player1_community_id: Option<String>,
    pub player2_id: Option<String>,
    pub player2_name: Option<String>,
    pub player2_community_id: Option<String>,
    pub player1_points: i64,
    pub player2_points: i64,
    pub status: MatchStatus,
    #[serde(default)]
    pub match_type: MatchType,
    #[serde(default)]
    pub is_bye_match: bool,
    #[serde(default)]
    pub is_auto_advancement: bool,
    #[serde(default)]
    pub is_level_final: bool,
    /// Set on the double-duty extra of an odd first round
    #[serde(default)]
    pub special_match: bool,
    /// Positions that will be decided when this match completes
    #[serde(default)]
    pub determines_positions: Vec<u8>,
    /// For the three-player scheme: the finisher waiting for the pos-2/3 final
    pub waiting_player_id: Option<String>,
    pub waiting_player_name: Option<String>,
    pub winner_id: Option<String>,
    pub loser_id: Option<String>,
    pub scheduled_date: Option<String>,
    pub scheduling: Option<SchedulingInfo>,
    pub venue: Option<String>,
    #[serde(default)]
    pub searchable_text: String,
    pub created_at: DateTime<Utc>,
}

fn searchable_text(scope: &RoundScope, names: &[&str]) -> String {
    let mut parts: Vec<String> = names.iter().map(|n| n.to_lowercase()).collect();
    parts.push(scope.tournament_id.to_lowercase());
    parts.push(scope.entity_id.to_lowercase());
    parts.push(scope.level.to_string());
    parts.join(" ")
}

fn require_id(player: &PlayerRef) -> Result<(), ProgressionError> {
    if player.id.is_empty() {
        return Err(ProgressionError::InvalidInput(
            "player id must not be empty".into(),
        ));
    }
    Ok(())
}

impl Match {
    fn base(scope: &RoundScope, suffix: &MatchSuffix, number: u32, p1: &PlayerRef) -> Match {
        let (community_id, county_id, region_id) = match scope.level {
            Level::Community => (Some(scope.entity_id.clone()), None, None),
            Level::County => (None, Some(scope.entity_id.clone()), None),
            Level::Regional => (None, None, Some(scope.entity_id.clone())),
            Level::National | Level::Special => (None, None, None),
        };
        Match {
            id: match_id(scope.label, scope.level, &scope.entity_id, suffix),
            tournament_id: scope.tournament_id.clone(),
            tournament_level: scope.level,
            round_number: scope.label_string(),
            match_number: number,
            community_id,
            county_id,
            region_id,
            player1_id: p1.id.clone(),
            player1_name: p1.name.clone(),
            player1_community_id: p1.community_id.clone(),
            player2_id: None,
            player2_name: None,
            player2_community_id: None,
            player1_points: 0,
            player2_points: 0,
            status: MatchStatus::Scheduled,
            match_type: MatchType::Standard,
            is_bye_match: false,
            is_auto_advancement: false,
            is_level_final: false,
            special_match: false,
            determines_positions: Vec::new(),
            waiting_player_id: None,
            waiting_player_name: None,
            winner_id: None,
            loser_id: None,
            scheduled_date: None,
            scheduling: None,
            venue: None,
            searchable_text: searchable_text(scope, &[&p1.name]),
            created_at: scope.salt,
        }
    }

    fn paired(
        scope: &RoundScope,
        suffix: &MatchSuffix,
        number: u32,
        p1: &PlayerRef,
        p2: &PlayerRef,
    ) -> Result<Match, ProgressionError> {
        require_id(p1)?;
        require_id(p2)?;
        if p1.id == p2.id {
            return Err(ProgressionError::DuplicatePlayer(p1.id.clone()));
        }
        let mut m = Match::base(scope, suffix, number, p1);
        m.player2_id = Some(p2.id.clone());
        m.player2_name = Some(p2.name.clone());
        m.player2_community_id = p2.community_id.clone();
        m.searchable_text = searchable_text(scope, &[&p1.name, &p2.name]);
        Ok(m)
    }

    /// An ordinary elimination pairing
    pub fn new(
        scope: &RoundScope,
        number: u32,
        p1: &PlayerRef,
        p2: &PlayerRef,
    ) -> Result<Match, ProgressionError> {
        Match::paired(scope, &MatchSuffix::Match(number), number, p1, p2)
    }

    /// The first-round-only extra where an already-paired player absorbs the
    /// odd player by playing a second time
    pub fn new_double_duty(
        scope: &RoundScope,
        number: u32,
        odd_player: &PlayerRef,
        opponent: &PlayerRef,
    ) -> Result<Match, ProgressionError> {
        let mut m = Match::paired(scope, &MatchSuffix::Match(number), number, odd_player, opponent)?;
        m.match_type = MatchType::DoubleDuty;
        m.special_match = true;
        Ok(m)
    }

    /// A bye: created already completed, canonical points, opponent `BYE`
    pub fn new_bye(
        scope: &RoundScope,
        bye_number: u32,
        number: u32,
        player: &PlayerRef,
    ) -> Result<Match, ProgressionError> {
        require_id(player)?;
        let mut m = Match::base(scope, &MatchSuffix::Bye(bye_number), number, player);
        m.player2_id = Some(BYE_OPPONENT.to_string());
        m.player2_name = Some(BYE_OPPONENT.to_string());
        m.player1_points = CANONICAL_WIN_POINTS;
        m.player2_points = 0;
        m.status = MatchStatus::Completed;
        m.match_type = MatchType::Bye;
        m.is_bye_match = true;
        Ok(m)
    }

    /// A single registrant walks straight into position 1
    pub fn new_auto_advancement(
        scope: &RoundScope,
        player: &PlayerRef,
    ) -> Result<Match, ProgressionError> {
        require_id(player)?;
        let mut m = Match::base(scope, &MatchSuffix::AutoPos1, 1, player);
        m.player1_points = CANONICAL_WIN_POINTS;
        m.status = MatchStatus::Completed;
        m.match_type = MatchType::AutoAdvancement;
        m.is_auto_advancement = true;
        m.is_level_final = true;
        m.determines_positions = vec![1];
        Ok(m)
    }

    /// The direct final of a two-player pool; there is no position 3
    pub fn new_two_player_final(
        scope: &RoundScope,
        p1: &PlayerRef,
        p2: &PlayerRef,
    ) -> Result<Match, ProgressionError> {
        let mut m = Match::paired(scope, &MatchSuffix::TwoPlayerFinal, 1, p1, p2)?;
        m.match_type = MatchType::TwoPlayerFinal;
        m.is_level_final = true;
        m.determines_positions = vec![1, 2];
        Ok(m)
    }

    /// First match of the three-player scheme; the third player waits on it
    pub fn new_three_player_initial(
        scope: &RoundScope,
        p1: &PlayerRef,
        p2: &PlayerRef,
        waiting: &PlayerRef,
    ) -> Result<Match, ProgressionError> {
        require_id(waiting)?;
        let mut m = Match::paired(scope, &MatchSuffix::Initial, 1, p1, p2)?;
        m.match_type = MatchType::ThreePlayerInitial;
        m.determines_positions = vec![1];
        m.waiting_player_id = Some(waiting.id.clone());
        m.waiting_player_name = Some(waiting.name.clone());
        Ok(m)
    }

    /// Second match of the three-player scheme: loser of the initial match
    /// against the waiting player, for positions 2 and 3
    pub fn new_three_player_final(
        scope: &RoundScope,
        loser: &PlayerRef,
        waiting: &PlayerRef,
    ) -> Result<Match, ProgressionError> {
        let mut m = Match::paired(scope, &MatchSuffix::Pos23Final, 1, loser, waiting)?;
        m.match_type = MatchType::ThreePlayerFinal;
        m.is_level_final = true;
        m.determines_positions = vec![2, 3];
        Ok(m)
    }

    /// One of the two semi-finals of the four-player scheme
    pub fn new_semi_final(
        scope: &RoundScope,
        sf_number: u8,
        p1: &PlayerRef,
        p2: &PlayerRef,
    ) -> Result<Match, ProgressionError> {
        let mut m = Match::paired(
            scope,
            &MatchSuffix::SemiFinal(sf_number),
            sf_number as u32,
            p1,
            p2,
        )?;
        m.match_type = MatchType::SemiFinal;
        Ok(m)
    }

    /// Winners of the semi-finals; decides position 1
    pub fn new_winners_final(
        scope: &RoundScope,
        p1: &PlayerRef,
        p2: &PlayerRef,
    ) -> Result<Match, ProgressionError> {
        let mut m = Match::paired(scope, &MatchSuffix::WinnersFinal, 1, p1, p2)?;
        m.match_type = MatchType::WinnersFinal;
        m.determines_positions = vec![1];
        Ok(m)
    }

    /// Losers of the semi-finals; its loser is eliminated outright
    pub fn new_losers_final(
        scope: &RoundScope,
        p1: &PlayerRef,
        p2: &PlayerRef,
    ) -> Result<Match, ProgressionError> {
        let mut m = Match::paired(scope, &MatchSuffix::LosersFinal, 2, p1, p2)?;
        m.match_type = MatchType::LosersFinal;
        Ok(m)
    }

    /// Last match of the four-player scheme: winners-final loser against
    /// losers-final winner, for positions 2 and 3
    pub fn new_final(
        scope: &RoundScope,
        p1: &PlayerRef,
        p2: &PlayerRef,
    ) -> Result<Match, ProgressionError> {
        let mut m = Match::paired(scope, &MatchSuffix::Final, 1, p1, p2)?;
        m.match_type = MatchType::Final;
        m.is_level_final = true;
        m.determines_positions = vec![2, 3];
        Ok(m)
    }

    /// Whether the result of this match can be read by the core. Byes and
    /// auto-advancements are born completed.
    pub fn is_completed(&self) -> bool {
        self.status == MatchStatus::Completed
    }

    /// The entity this match belongs to: the geography field matching the
    /// level, or the singleton entity for national and special brackets
    pub fn entity_id(&self) -> Option<&str> {
        match self.tournament_level {
            Level::Community => self.community_id.as_deref(),
            Level::County => self.county_id.as_deref(),
            Level::Regional => self.region_id.as_deref(),
            Level::National | Level::Special => self.tournament_level.singleton_entity(),
        }
    }

    /// The first participant as a descriptor
    pub fn player1(&self) -> PlayerRef {
        PlayerRef {
            id: self.player1_id.clone(),
            name: self.player1_name.clone(),
            community_id: self.player1_community_id.clone(),
        }
    }

    /// The second participant, absent on byes' phantom side and
    /// auto-advancements
    pub fn player2(&self) -> Option<PlayerRef> {
        let id = self.player2_id.as_deref()?;
        if id.is_empty() || id == BYE_OPPONENT {
            return None;
        }
        Some(PlayerRef {
            id: id.to_string(),
            name: self.player2_name.clone().unwrap_or_default(),
            community_id: self.player2_community_id.clone(),
        })
    }

    /// The waiting finisher carried by a three-player initial match
    pub fn waiting_player(&self) -> Option<PlayerRef> {
        let id = self.waiting_player_id.as_deref()?;
        Some(PlayerRef {
            id: id.to_string(),
            name: self.waiting_player_name.clone().unwrap_or_default(),
            community_id: None,
        })
    }
}
