//! Land registry and whole-run simulation state.

use crate::error::SimError;
use crate::log::ActionLog;
use crate::pieces::{stringify_pieces, PieceKind, PieceNames};
use rustc_hash::FxHashMap;

pub type LandKey = String;

/// Distinguished key of the sink land (the terminus of every gather
/// route and the source of ravage damage).
pub const SINK_KEY: &str = "LAIR";

/// One land on the board, holding typed token counts.
///
/// Counts stay non-negative, except on shadow lands (off-map lands that
/// exist only so manual ledger entries can be audited).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Land {
    pub key: LandKey,
    pub display_name: String,
    /// Terrain letter (J/M/S/W/O; the sink uses "L").
    pub terrain: char,
    pub coastal: bool,
    pub explorers: i32,
    pub towns: i32,
    pub cities: i32,
    pub dahan: i32,
    /// Pending military response, committed only at end of ravage.
    pub pending_explorers: i32,
    pub pending_towns: i32,
    /// Off-map land tracked only for the manual ledger; may go negative.
    pub shadow: bool,
}

impl Land {
    pub fn new(
        key: impl Into<LandKey>,
        display_name: impl Into<String>,
        terrain: char,
        explorers: i32,
        towns: i32,
        cities: i32,
        dahan: i32,
    ) -> Self {
        Self {
            key: key.into(),
            display_name: display_name.into(),
            terrain,
            coastal: false,
            explorers,
            towns,
            cities,
            dahan,
            pending_explorers: 0,
            pending_towns: 0,
            shadow: false,
        }
    }

    /// An off-map land created on demand by the manual ledger.
    pub fn new_shadow(key: impl Into<LandKey>, terrain: char) -> Self {
        let mut land = Self::new(key, "FAKE", terrain, 0, 0, 0, 0);
        land.shadow = true;
        land
    }

    pub fn count(&self, kind: PieceKind) -> i32 {
        match kind {
            PieceKind::Void => 0,
            PieceKind::Explorer => self.explorers,
            PieceKind::Town => self.towns,
            PieceKind::City => self.cities,
            PieceKind::Dahan => self.dahan,
        }
    }

    pub fn count_mut(&mut self, kind: PieceKind) -> Option<&mut i32> {
        match kind {
            PieceKind::Void => None,
            PieceKind::Explorer => Some(&mut self.explorers),
            PieceKind::Town => Some(&mut self.towns),
            PieceKind::City => Some(&mut self.cities),
            PieceKind::Dahan => Some(&mut self.dahan),
        }
    }

    /// Staging counter for an incoming military response of `kind`.
    /// Only Explorer (from Town) and Town (from City) respond.
    pub fn pending_mut(&mut self, kind: PieceKind) -> Option<&mut i32> {
        match kind {
            PieceKind::Explorer => Some(&mut self.pending_explorers),
            PieceKind::Town => Some(&mut self.pending_towns),
            _ => None,
        }
    }

    /// Fold staged military responses into the live counters.
    pub fn commit_responses(&mut self) {
        self.explorers += self.pending_explorers;
        self.pending_explorers = 0;
        self.towns += self.pending_towns;
        self.pending_towns = 0;
    }

    pub fn total_invaders(&self) -> i32 {
        self.explorers + self.towns + self.cities
    }

    pub fn describe(&self, names: &PieceNames) -> String {
        stringify_pieces([
            (PieceKind::Explorer.name(names), self.explorers),
            (PieceKind::Town.name(names), self.towns),
            (PieceKind::City.name(names), self.cities),
            (PieceKind::Dahan.name(names), self.dahan),
        ])
    }
}

/// Whole-run mutable state: the land arena, routing distances, the
/// action log and the waste tallies.
///
/// Cloned wholesale for pre-ravage snapshots, so everything here is
/// plain owned data.
#[derive(Debug, Clone, Default)]
pub struct LairState {
    /// All lands in scope, including the sink and any shadow lands.
    pub lands: FxHashMap<LandKey, Land>,
    /// Keys of lands at hop distance 1, sorted.
    pub near: Vec<LandKey>,
    /// Keys of all routed lands (distance >= 1), sorted.
    pub reachable: Vec<LandKey>,
    /// Configured lands with no usable route to the sink.
    pub unroutable: Vec<LandKey>,
    /// Hop distance from the sink, per land key.
    pub dist: FxHashMap<LandKey, u32>,
    pub log: ActionLog,
    pub total_gathers: i32,
    pub wasted_damage: i32,
    pub wasted_downgrades: i32,
    pub wasted_invader_gathers: i32,
    pub wasted_dahan_gathers: i32,
    pub fear: i32,
}

impl LairState {
    pub fn land(&self, key: &str) -> Result<&Land, SimError> {
        self.lands.get(key).ok_or_else(|| SimError::UnknownLand {
            land: key.to_string(),
        })
    }

    pub fn land_mut(&mut self, key: &str) -> Result<&mut Land, SimError> {
        self.lands.get_mut(key).ok_or_else(|| SimError::UnknownLand {
            land: key.to_string(),
        })
    }

    pub fn sink(&self) -> Result<&Land, SimError> {
        self.land(SINK_KEY)
    }

    pub fn sink_mut(&mut self) -> Result<&mut Land, SimError> {
        self.land_mut(SINK_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pieces::PIECE_NAMES_TEXT;

    #[test]
    fn test_commit_responses_moves_pending() {
        let mut land = Land::new("A1", "A1W", 'W', 1, 0, 0, 0);
        land.pending_explorers = 2;
        land.pending_towns = 1;
        land.commit_responses();
        assert_eq!(land.explorers, 3);
        assert_eq!(land.towns, 1);
        assert_eq!(land.pending_explorers, 0);
        assert_eq!(land.pending_towns, 0);
    }

    #[test]
    fn test_shadow_land_is_marked() {
        let land = Land::new_shadow("FAR1", 'J');
        assert!(land.shadow);
        assert_eq!(land.display_name, "FAKE");
    }

    #[test]
    fn test_describe() {
        let land = Land::new("A1", "A1W", 'W', 0, 2, 0, 1);
        assert_eq!(land.describe(&PIECE_NAMES_TEXT), "2 town 1 dahan");
    }
}
