//! The progression core of the baize tournament engine: deterministic rules
//! for partitioning a pool of registered players, pairing them through
//! elimination rounds, collapsing small fields into the positioning schemes
//! that settle places 1/2/3 without a redundant third-place game, and
//! deriving the finishers once the last match lands.
//!
//! Everything in this crate is pure: no I/O, no clocks, no ambient
//! randomness. Time and shuffle sources are injected by the service layer.

pub mod brackets;
pub mod error;
pub mod finalizer;
pub mod generator;
pub mod identifiers;
pub mod levels;
pub mod matches;
pub mod oracle;
pub mod pairings;
pub mod players;
pub mod progression;
pub mod rounds;
pub mod scheduling;
pub mod tournament;
