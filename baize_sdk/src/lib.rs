//! The service layer of the baize tournament engine: the request/response
//! types of the HTTP surface, the storage contract the progression core is
//! orchestrated against, the entity resolver, and the coordinator that ties
//! them together. Server binaries plug a concrete `TournamentStore` into
//! `Coordinator` and expose the endpoints.

pub mod api;
pub mod coordinator;
pub mod error;
pub mod resolver;
pub mod store;

pub use coordinator::Coordinator;
pub use error::ServiceError;
pub use store::{StoreError, TournamentStore};
