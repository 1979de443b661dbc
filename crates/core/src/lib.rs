//! SquadUp Core Library
//!
//! Ticket lifecycle, reputation ledger, expiry sweep, authorization
//! policy, and SQLite storage for the SquadUp matchmaking platform.

pub mod config;
pub mod error;
pub mod invariants;
pub mod ledger;
pub mod lifecycle;
pub mod models;
pub mod policy;
pub mod storage;
pub mod sweeper;

pub use config::{Config, DatabaseConfig, SweeperConfig};
pub use error::{Conflict, Error, Result};
pub use ledger::ReputationLedger;
pub use lifecycle::TicketLifecycle;
pub use models::*;
pub use policy::{can_act, Actor, ELEVATED_ROLES};
pub use storage::{
    Database, Storage, TicketRepository, UserRepository, VoteRepository,
};
pub use sweeper::{created_before_ttl, sweep_once, ExpiryPolicy};
