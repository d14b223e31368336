use std::fmt;

use baize_lib::error::ProgressionError;

use crate::store::StoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Everything that can stop an orchestration: a refusal from the progression
/// core or a failure at the storage seam. Both are values; the endpoints map
/// them to response bodies, and only an unreachable store escapes as a 500.
pub enum ServiceError {
    Progression(ProgressionError),
    Store(StoreError),
}

impl ServiceError {
    /// The bare kind name carried in the `error` field of responses
    pub fn kind(&self) -> &'static str {
        use ProgressionError::*;
        match self {
            ServiceError::Progression(err) => match err {
                InvalidInput(_) => "InvalidInput",
                InsufficientPlayers => "InsufficientPlayers",
                DuplicatePlayer(_) => "DuplicatePlayer",
                UnexpectedPoolSize(_) => "UnexpectedPoolSize",
                PreviousRoundIncomplete { .. } => "PreviousRoundIncomplete",
                NoWinnersFound => "NoWinnersFound",
                MissingPositioningMatches => "MissingPositioningMatches",
                TieUndecidable(_) => "TieUndecidable",
                Terminal => "Terminal",
            },
            ServiceError::Store(err) => err.kind(),
        }
    }

    /// Whether the error should surface as a server fault rather than a
    /// domain-level refusal
    pub fn is_fatal(&self) -> bool {
        matches!(self, ServiceError::Store(StoreError::Unavailable(_)))
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Progression(err) => write!(f, "{err}"),
            ServiceError::Store(err) => write!(f, "{err}"),
        }
    }
}

impl From<ProgressionError> for ServiceError {
    fn from(err: ProgressionError) -> Self {
        ServiceError::Progression(err)
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        ServiceError::Store(err)
    }
}

impl std::error::Error for ServiceError {}
