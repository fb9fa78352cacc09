//! Fixture builders for unit tests.
//!
//! Assembles a small land arena plus a hand-written distance tree
//! without going through the board loader, so tests state exactly the
//! topology they exercise.

use crate::config::{ForcePolicy, LairConf};
use crate::engine::Engine;
use crate::error::SimError;
use crate::log::ActionLog;
use crate::state::{Land, LandKey, SINK_KEY};
use rustc_hash::FxHashMap;
use std::collections::HashMap;

pub struct EngineBuilder {
    conf: LairConf,
    lands: FxHashMap<LandKey, Land>,
    dist: FxHashMap<LandKey, u32>,
    parent: FxHashMap<LandKey, LandKey>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        let mut lands = FxHashMap::default();
        lands.insert(
            SINK_KEY.to_string(),
            Land::new(SINK_KEY, "lair", 'L', 0, 0, 0, 0),
        );
        let mut dist = FxHashMap::default();
        dist.insert(SINK_KEY.to_string(), 0);
        Self {
            conf: LairConf::default(),
            lands,
            dist,
            parent: FxHashMap::default(),
        }
    }

    /// Set the sink's starting counts `(explorers, towns, cities, dahan)`.
    pub fn sink(mut self, counts: [i32; 4]) -> Self {
        let land = self.lands.get_mut(SINK_KEY).expect("sink exists");
        land.explorers = counts[0];
        land.towns = counts[1];
        land.cities = counts[2];
        land.dahan = counts[3];
        self
    }

    /// A land at the given hop distance with no explicit route parent.
    /// Distance-1 lands route to themselves; anything farther needs
    /// [`EngineBuilder::chained_land`] to be reachable.
    pub fn land(mut self, key: &str, terrain: char, dist: u32, counts: [i32; 4]) -> Self {
        self.lands.insert(
            key.to_string(),
            Land::new(key, key, terrain, counts[0], counts[1], counts[2], counts[3]),
        );
        self.dist.insert(key.to_string(), dist);
        self
    }

    /// A land whose gather route runs through `parent`.
    pub fn chained_land(
        mut self,
        key: &str,
        terrain: char,
        dist: u32,
        parent: &str,
        counts: [i32; 4],
    ) -> Self {
        self.parent.insert(key.to_string(), parent.to_string());
        self.land(key, terrain, dist, counts)
    }

    /// A configured land that is absent from the distance tree entirely.
    pub fn orphan_land(mut self, key: &str, terrain: char, counts: [i32; 4]) -> Self {
        self.lands.insert(
            key.to_string(),
            Land::new(key, key, terrain, counts[0], counts[1], counts[2], counts[3]),
        );
        self
    }

    pub fn coastal(mut self, key: &str) -> Self {
        if let Some(land) = self.lands.get_mut(key) {
            land.coastal = true;
        }
        self
    }

    pub fn terrain_priority(mut self, priority: &str) -> Self {
        self.conf.terrain_priority = priority.to_string();
        self
    }

    pub fn leave_behind(mut self, land: &str, piece: &str, count: i32) -> Self {
        self.conf
            .leave_behind
            .entry(land.to_string())
            .or_insert_with(HashMap::new)
            .insert(piece.to_string(), count);
        self
    }

    pub fn ignore(mut self, key: &str) -> Self {
        self.conf.ignore_lands.push(key.to_string());
        self
    }

    pub fn priority_land(mut self, key: &str) -> Self {
        self.conf.priority_lands.push(key.to_string());
        self
    }

    pub fn allow_missing(mut self) -> Self {
        self.conf.allow_missing = true;
        self
    }

    pub fn force_policy(mut self, policy: ForcePolicy) -> Self {
        self.conf.force_policy = policy;
        self
    }

    pub fn reserve_gathers(mut self, blue: i32, orange: i32) -> Self {
        self.conf.blue.reserve_gathers = blue;
        self.conf.orange.reserve_gathers = orange;
        self
    }

    pub fn max_range(mut self, blue: u32, orange: u32) -> Self {
        self.conf.blue.max_range = blue;
        self.conf.orange.max_range = orange;
        self
    }

    pub fn try_build(self) -> Result<Engine, SimError> {
        Engine::new(self.lands, self.dist, self.parent, self.conf, ActionLog::new())
    }

    pub fn build(self) -> Engine {
        self.try_build().expect("fixture engine builds")
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
