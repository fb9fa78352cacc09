//! # Lair Simulation Core
//!
//! Deterministic resource-flow simulation for the lair invader faction.
//!
//! Given a distance tree rooted at the sink and a set of lands holding
//! typed token counts, the engine executes a fixed sequence of phases
//! (downgrade, small gather, slurp, call, ravage, blur) and records
//! every movement in an auditable, mergeable action log.
//!
//! ## Key Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`Engine`] | Phase primitives over the land arena and routing tree |
//! | [`LairState`] | The mutable arena, routing lists and waste tallies |
//! | [`LairConf`] | Immutable per-run rule configuration |
//! | [`ActionLog`] | Forkable, mergeable record of everything that moved |
//! | [`DelayedActions`] | Manual ledger applied at phase checkpoints |
//! | [`Phase`] | One player-orderable phase of the turn |
//!
//! Determinism is a correctness requirement: land iteration always goes
//! through explicit sort keys, and buffered log entries are sorted by
//! source land before commit, so the same input and phase sequence
//! always produce byte-identical output.

pub mod config;
pub mod engine;
pub mod error;
pub mod log;
pub mod manual;
pub mod pieces;
pub mod score;
pub mod state;
pub mod systems;
pub mod testing;

pub use config::{Faction, ForcePolicy, InnateConf, LairConf};
pub use engine::{Destination, Engine};
pub use error::SimError;
pub use log::{ActionKind, ActionLog, LogEntry, PieceMove};
pub use manual::{DelayedActions, ManualAction};
pub use pieces::{PieceKind, PieceNames, PIECE_NAMES_EMOJI, PIECE_NAMES_TEXT};
pub use score::{score, Score};
pub use state::{LairState, Land, LandKey, SINK_KEY};
pub use systems::Phase;
