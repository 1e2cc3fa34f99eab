//! Harvest Core - the progression and rewards engine behind the game.
//!
//! Storage (ledger), economy, progression, achievements, leaderboard and
//! auth, composed by [`service::GameService`]. The HTTP daemon and the CLI
//! are thin collaborators over this crate.

pub mod achievements;
pub mod api;
pub mod auth;
pub mod economy;
pub mod error;
pub mod leaderboard;
pub mod ledger;
pub mod models;
pub mod progression;
pub mod seed;
pub mod service;

pub use error::{GameError, Result};
pub use ledger::LedgerDb;
pub use service::GameService;
