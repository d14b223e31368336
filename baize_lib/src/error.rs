use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// All the ways the progression core can refuse to act. Errors are plain
/// values; the service layer turns them into response bodies.
pub enum ProgressionError {
    /// A constructor or generator was handed unusable data
    InvalidInput(String),
    /// The pool is empty, so there is nothing to pair
    InsufficientPlayers,
    /// The same player appeared twice in one pool
    DuplicatePlayer(String),
    /// The winner count drifted outside every regime the engine knows
    UnexpectedPoolSize(usize),
    /// The current round still has unfinished matches
    PreviousRoundIncomplete {
        /// The label of the round that is still open
        round: String,
        /// Ids of the matches that are not completed
        incomplete: Vec<String>,
        /// How many matches of the round are completed
        completed: usize,
        /// How many matches the round has in total
        total: usize,
    },
    /// A completed round produced no derivable winners
    NoWinnersFound,
    /// The positioning phase is missing one or more of its matches
    MissingPositioningMatches,
    /// A decisive match ended with equal points; progression cannot continue
    /// until the points are corrected
    TieUndecidable(String),
    /// The entity has played its final match; only finalization remains
    Terminal,
}

impl fmt::Display for ProgressionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ProgressionError::*;
        match self {
            InvalidInput(what) => write!(f, "InvalidInput: {what}"),
            InsufficientPlayers => write!(f, "InsufficientPlayers"),
            DuplicatePlayer(id) => write!(f, "DuplicatePlayer: {id}"),
            UnexpectedPoolSize(n) => write!(f, "UnexpectedPoolSize: {n}"),
            PreviousRoundIncomplete {
                round,
                completed,
                total,
                ..
            } => write!(
                f,
                "PreviousRoundIncomplete: {completed}/{total} matches of {round} completed"
            ),
            NoWinnersFound => write!(f, "NoWinnersFound"),
            MissingPositioningMatches => write!(f, "MissingPositioningMatches"),
            TieUndecidable(id) => write!(f, "TieUndecidable: {id}"),
            Terminal => write!(f, "Terminal"),
        }
    }
}

impl std::error::Error for ProgressionError {}
