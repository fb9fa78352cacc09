//! The resource-flow engine.
//!
//! Owns the land arena, the routing tree derived from the distance
//! provider, and the uncommitted log buffer. Phase logic lives in
//! [`crate::systems`]; this module provides the primitives they are
//! built from: the exchange primitive ([`Engine::transfer`]), the
//! multi-hop cost-rationed gather, damage application, and the
//! fork/commit log bracket around each top-level phase.

use crate::config::{ForcePolicy, LairConf};
use crate::error::SimError;
use crate::log::{ActionKind, ActionLog, LogEntry, PieceMove};
use crate::pieces::{PieceKind, PIECE_NAMES_TEXT};
use crate::state::{LairState, Land, LandKey, SINK_KEY};
use rustc_hash::FxHashMap;

/// Where a transfer delivers its units.
#[derive(Debug, Clone, Copy)]
pub enum Destination<'a> {
    /// The live counter of `kind` on a land.
    Live(&'a str, PieceKind),
    /// The pending military-response counter of `kind` on a land.
    Pending(&'a str, PieceKind),
    /// Destroyed with no response; the units simply vanish.
    Vanish,
}

/// Routing data derived once from the distance tree and never mutated
/// afterwards. Distance-1 lands gather to themselves; the engine decides
/// per transfer whether to push the final hop into the sink.
#[derive(Debug, Clone, Default)]
pub struct Routes {
    pub gathers_to: FxHashMap<LandKey, LandKey>,
    pub gather_cost: FxHashMap<LandKey, i32>,
}

#[derive(Debug, Clone)]
pub struct Engine {
    pub conf: LairConf,
    pub state: LairState,
    pub routes: Routes,
    buffered: Vec<LogEntry>,
    expected_ravages_left: i32,
}

impl Engine {
    /// Build an engine from a land arena and a distance tree.
    ///
    /// Classifies every configured land as near (distance 1), reachable
    /// (a parent-pointer walk reaches a distance-1 land) or unroutable.
    /// A land with no distance entry at all is a configuration error
    /// unless `allow_missing` is set.
    pub fn new(
        mut lands: FxHashMap<LandKey, Land>,
        dist: FxHashMap<LandKey, u32>,
        parent: FxHashMap<LandKey, LandKey>,
        conf: LairConf,
        log: ActionLog,
    ) -> Result<Engine, SimError> {
        if !lands.contains_key(SINK_KEY) {
            return Err(SimError::UnknownLand {
                land: SINK_KEY.to_string(),
            });
        }

        let mut keys: Vec<LandKey> = lands
            .keys()
            .filter(|k| k.as_str() != SINK_KEY)
            .cloned()
            .collect();
        keys.sort();

        let mut routes = Routes::default();
        let mut near = Vec::new();
        let mut reachable = Vec::new();
        let mut unroutable = Vec::new();

        // First pass: routing pointers and display annotations.
        for key in &keys {
            let d = match dist.get(key) {
                Some(&d) => d,
                None => {
                    if conf.allow_missing {
                        continue;
                    }
                    return Err(SimError::MissingRoute { land: key.clone() });
                }
            };
            if d == 0 {
                continue;
            }
            if conf.display_name_range {
                if let Some(land) = lands.get_mut(key) {
                    land.display_name.push_str(&format!(" [{d}]"));
                }
            }
            if d == 1 {
                routes.gathers_to.insert(key.clone(), key.clone());
            } else if let Some(p) = parent.get(key) {
                // A route is only usable if every hop is a configured land.
                if lands.contains_key(p) {
                    routes.gathers_to.insert(key.clone(), p.clone());
                }
            }
        }

        // Second pass: classify.
        for key in &keys {
            let d = match dist.get(key) {
                Some(&d) => d,
                None => {
                    unroutable.push(key.clone());
                    continue;
                }
            };
            if d == 0 {
                continue;
            }
            if d == 1 {
                near.push(key.clone());
                reachable.push(key.clone());
            } else if walk_to_near(&routes.gathers_to, &dist, key).is_some() {
                reachable.push(key.clone());
            } else {
                unroutable.push(key.clone());
            }
        }

        for key in routes.gathers_to.keys().cloned().collect::<Vec<_>>() {
            if let Some(&d) = dist.get(&key) {
                routes.gather_cost.insert(key, d as i32 - 1);
            }
        }

        let state = LairState {
            lands,
            near,
            reachable,
            unroutable,
            dist,
            log,
            ..Default::default()
        };

        Ok(Engine {
            conf,
            state,
            routes,
            buffered: Vec::new(),
            expected_ravages_left: 0,
        })
    }

    /// Prime the force-through heuristic with how many ravages the
    /// chosen phase ordering will still run.
    pub fn set_expected_ravages(&mut self, ravages: i32) {
        self.expected_ravages_left = ravages;
    }

    pub fn note_ravage_started(&mut self) {
        self.expected_ravages_left -= 1;
    }

    /// The distance-1 ancestor of a land along its gather route.
    pub fn near_ancestor(&self, key: &str) -> Option<&LandKey> {
        walk_to_near(&self.routes.gathers_to, &self.state.dist, key)
    }

    // ------------------------------------------------------------------
    // Exchange primitive
    // ------------------------------------------------------------------

    /// Move up to `requested` units of `kind` out of `src`, honoring the
    /// configured leave-behind floor. Returns the amount actually moved;
    /// never over-draws, never drives a counter negative.
    pub fn transfer(
        &mut self,
        src: &str,
        kind: PieceKind,
        dst: Destination,
        requested: i32,
    ) -> Result<i32, SimError> {
        let requested = requested.max(0);
        let leave = self.conf.leave_behind(src, kind.name(&PIECE_NAMES_TEXT));
        let land = self.state.land_mut(src)?;
        let counter = match land.count_mut(kind) {
            Some(c) => c,
            None => return Ok(0),
        };
        let actual = (*counter - leave).max(0).min(requested);
        *counter -= actual;

        match dst {
            Destination::Live(key, k) => {
                let target = self.state.land_mut(key)?;
                if let Some(c) = target.count_mut(k) {
                    *c += actual;
                }
            }
            Destination::Pending(key, k) => {
                let target = self.state.land_mut(key)?;
                if let Some(c) = target.pending_mut(k) {
                    *c += actual;
                }
            }
            Destination::Vanish => {}
        }
        Ok(actual)
    }

    // ------------------------------------------------------------------
    // Gathering
    // ------------------------------------------------------------------

    fn force_through(&self, kind: PieceKind, near_dahan: i32) -> bool {
        match self.conf.force_policy {
            ForcePolicy::Never => false,
            ForcePolicy::Always => true,
            ForcePolicy::SurvivesRavage => {
                kind.health() > self.expected_ravages_left && near_dahan > 0
            }
        }
    }

    /// Move units of `kind` from `key` toward the sink, spending from
    /// `budget`. Each unit costs `hops` budget; the number of units is
    /// rationed by integer division. Returns the budget actually spent.
    ///
    /// With `force` the units always punch through to the sink itself;
    /// otherwise they stop at the distance-1 land unless the configured
    /// force policy routes them through.
    pub fn gather(
        &mut self,
        kind: PieceKind,
        key: &str,
        budget: i32,
        force: bool,
    ) -> Result<i32, SimError> {
        if self.conf.is_ignored(key) {
            return Ok(0);
        }
        let mut cost = match self.routes.gather_cost.get(key) {
            Some(&c) => c,
            None => return Ok(0),
        };

        // Walk the route, recording intermediate stops for the log.
        let mut via = Vec::new();
        let mut last = key.to_string();
        for _ in 1..cost {
            let next = match self.routes.gathers_to.get(&last) {
                Some(n) => n.clone(),
                None => return Ok(0),
            };
            via.push(self.state.land(&next)?.display_name.clone());
            last = next;
        }
        let stop = match self.routes.gathers_to.get(&last) {
            Some(s) => s.clone(),
            None => return Ok(0),
        };

        let near_dahan = self.state.land(&stop)?.dahan;
        let target = if force || self.force_through(kind, near_dahan) {
            if cost > 0 {
                via.push(self.state.land(&stop)?.display_name.clone());
            }
            cost += 1;
            SINK_KEY.to_string()
        } else {
            stop
        };

        if cost == 0 {
            return Ok(0);
        }

        let moved = self.transfer(key, kind, Destination::Live(&target, kind), budget / cost)?;
        let actual = moved * cost;
        self.state.total_gathers += actual;
        if moved > 0 {
            let piece = kind.name(&self.conf.piece_names).to_string();
            let mut entry = LogEntry::action(ActionKind::Gather);
            entry.src_land = Some(self.state.land(key)?.display_name.clone());
            entry.tgt_land = Some(self.state.land(&target)?.display_name.clone());
            entry.via = via;
            entry.mult = cost;
            entry.moves.push(PieceMove {
                src: piece.clone(),
                tgt: piece,
                count: moved,
            });
            self.buffered.push(entry);
        }
        Ok(actual)
    }

    /// The large-gather variant: pieces stop at the distance-1 land
    /// unless the force policy punches them through.
    pub fn slurp(&mut self, kind: PieceKind, key: &str, budget: i32) -> Result<i32, SimError> {
        self.gather(kind, key, budget, false)
    }

    // ------------------------------------------------------------------
    // Downgrades, damage, reinforcement
    // ------------------------------------------------------------------

    /// Convert units of `kind` into its response kind on the same land.
    /// Returns the number of units downgraded.
    pub fn downgrade(&mut self, kind: PieceKind, key: &str, budget: i32) -> Result<i32, SimError> {
        let response = match kind.response() {
            Some(r) => r,
            None => return Ok(0),
        };
        let moved = self.transfer(key, kind, Destination::Live(key, response), budget)?;
        if moved > 0 {
            let names = self.conf.piece_names;
            let display = self.state.land(key)?.display_name.clone();
            let mut entry = LogEntry::action(ActionKind::Downgrade);
            entry.src_land = Some(display.clone());
            entry.tgt_land = Some(display);
            entry.moves.push(PieceMove {
                src: kind.name(&names).to_string(),
                tgt: response.name(&names).to_string(),
                count: moved,
            });
            self.buffered.push(entry);
        }
        Ok(moved)
    }

    /// Apply up to `dmg` damage to `kind` on a land. Destroyed units
    /// stage their military response at the land itself if it holds
    /// dahan, otherwise at its distance-1 ancestor (the sink when the
    /// land is distance 1). Returns the health actually consumed.
    pub fn apply_damage(&mut self, key: &str, kind: PieceKind, dmg: i32) -> Result<i32, SimError> {
        if kind.health() == 0 {
            return Ok(0);
        }
        let response = kind.response();
        let respond_to: Option<LandKey> = match response {
            Some(_) => {
                if self.state.land(key)?.dahan > 0 {
                    Some(key.to_string())
                } else if self.state.dist.get(key).copied() == Some(1) {
                    Some(SINK_KEY.to_string())
                } else {
                    self.routes.gathers_to.get(key).cloned()
                }
            }
            None => None,
        };
        let dst = match (response, &respond_to) {
            (Some(r), Some(t)) => Destination::Pending(t, r),
            _ => Destination::Vanish,
        };

        let kills = self.transfer(key, kind, dst, dmg / kind.health())?;
        if kills > 0 {
            let names = self.conf.piece_names;
            let mut entry = LogEntry::action(ActionKind::Destroy);
            entry.src_land = Some(self.state.land(key)?.display_name.clone());
            entry.tgt_land = match &respond_to {
                Some(t) => Some(self.state.land(t)?.display_name.clone()),
                None => None,
            };
            entry.moves.push(PieceMove {
                src: kind.name(&names).to_string(),
                tgt: response.map(|r| r.name(&names)).unwrap_or("").to_string(),
                count: kills,
            });
            self.buffered.push(entry);
        }
        self.state.fear += kills * kind.fear();
        Ok(kills * kind.health())
    }

    /// Add freshly built units to a land; logged immediately rather than
    /// buffered, so reinforcement keeps its place in the phase log.
    pub fn place(&mut self, key: &str, kind: PieceKind, count: i32) -> Result<(), SimError> {
        let names = self.conf.piece_names;
        let land = self.state.land_mut(key)?;
        if let Some(counter) = land.count_mut(kind) {
            *counter += count;
        }
        let display = land.display_name.clone();
        let mut entry = LogEntry::action(ActionKind::Add);
        entry.tgt_land = Some(display);
        entry.moves.push(PieceMove {
            src: String::new(),
            tgt: kind.name(&names).to_string(),
            count,
        });
        self.state.log.push(entry);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Land orderings
    // ------------------------------------------------------------------

    /// Distance-1 lands, most defended first.
    pub fn near_most_dahan(&self) -> Vec<LandKey> {
        let mut keys = self.state.near.clone();
        keys.sort_by_key(|k| {
            let dahan = self.state.lands.get(k).map(|l| l.dahan).unwrap_or(0);
            (-dahan, k.clone())
        });
        keys
    }

    /// Distance-1 lands, least defended first.
    pub fn near_least_dahan(&self) -> Vec<LandKey> {
        let mut keys = self.state.near.clone();
        keys.sort_by_key(|k| {
            let dahan = self.state.lands.get(k).map(|l| l.dahan).unwrap_or(0);
            (dahan, k.clone())
        });
        keys
    }

    /// The layered tie-break key ordering lands for slurp and ravage.
    /// Recomputed on every call: it depends on live dahan counts.
    pub fn priority_key(&self, key: &LandKey) -> (bool, i64, i64, i32, LandKey) {
        let (terrain, coastal) = self
            .state
            .lands
            .get(key)
            .map(|l| (l.terrain, l.coastal))
            .unwrap_or(('?', false));
        let rank = self.conf.land_rank(Some(key), terrain, coastal) as i64;
        let d = self.state.dist.get(key).copied().unwrap_or(u32::MAX) as i64;
        let near_dahan = self
            .near_ancestor(key)
            .and_then(|k| self.state.lands.get(k))
            .map(|l| l.dahan)
            .unwrap_or(0);
        let ignored = self.conf.is_ignored(key);
        let (a, b) = if self.conf.distance_first {
            (d, rank)
        } else {
            (rank, d)
        };
        (ignored, a, b, near_dahan, key.clone())
    }

    /// All routed lands in ascending priority-key order.
    pub fn reachable_by_priority(&self) -> Vec<LandKey> {
        let mut keys = self.state.reachable.clone();
        keys.sort_by_key(|k| self.priority_key(k));
        keys
    }

    /// Distance-1 lands in ascending priority-key order.
    pub fn near_by_priority(&self) -> Vec<LandKey> {
        let mut keys = self.state.near.clone();
        keys.sort_by_key(|k| self.priority_key(k));
        keys
    }

    // ------------------------------------------------------------------
    // Log plumbing
    // ------------------------------------------------------------------

    /// Sort the uncommitted entries by source land and push them into
    /// the log, so output never depends on map iteration order.
    pub fn commit_buffered(&mut self) {
        let mut buffered = std::mem::take(&mut self.buffered);
        buffered.sort_by(|a, b| a.src_land.cmp(&b.src_land));
        for entry in buffered {
            self.state.log.push(entry);
        }
    }

    /// Run one top-level phase inside a forked log scope. The summary
    /// comment lands in the parent first, then the child's entries one
    /// level deeper, giving the collapsible two-level structure.
    pub fn phase_scope(
        &mut self,
        label: &str,
        f: impl FnOnce(&mut Self) -> Result<(), SimError>,
    ) -> Result<(), SimError> {
        let names = self.conf.piece_names;
        let child = self.state.log.fork();
        let parent = std::mem::replace(&mut self.state.log, child);
        let before = self.state.sink()?.describe(&names);

        let result = f(self);
        self.commit_buffered();
        let after = self.state.sink()?.describe(&names);

        let child = std::mem::replace(&mut self.state.log, parent);
        if result.is_ok() {
            let sink_name = self.state.sink()?.display_name.clone();
            self.state
                .log
                .comment(format!("{label} in {sink_name}: ({before}) => ({after})"));
        }
        self.state.log.absorb(child);
        result
    }
}

fn walk_to_near<'a>(
    gathers_to: &'a FxHashMap<LandKey, LandKey>,
    dist: &FxHashMap<LandKey, u32>,
    key: &str,
) -> Option<&'a LandKey> {
    let mut cursor = gathers_to.get(key)?;
    loop {
        match dist.get(cursor) {
            Some(1) => return Some(cursor),
            Some(d) if *d > 1 => {
                let next = gathers_to.get(cursor)?;
                if next == cursor {
                    return None;
                }
                cursor = next;
            }
            _ => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::EngineBuilder;

    #[test]
    fn test_transfer_conserves_and_never_overdraws() {
        let mut engine = EngineBuilder::new()
            .land("A1", 'W', 1, [3, 0, 0, 0])
            .build();
        let before = engine.state.land("A1").unwrap().explorers
            + engine.state.sink().unwrap().explorers;
        let moved = engine
            .transfer("A1", PieceKind::Explorer, Destination::Live(SINK_KEY, PieceKind::Explorer), 5)
            .unwrap();
        assert_eq!(moved, 3);
        assert_eq!(engine.state.land("A1").unwrap().explorers, 0);
        assert_eq!(
            engine.state.land("A1").unwrap().explorers
                + engine.state.sink().unwrap().explorers,
            before
        );
    }

    #[test]
    fn test_transfer_honors_leave_behind() {
        let mut engine = EngineBuilder::new()
            .land("A1", 'W', 1, [0, 4, 0, 0])
            .leave_behind("A1", "town", 2)
            .build();
        let moved = engine
            .transfer("A1", PieceKind::Town, Destination::Live(SINK_KEY, PieceKind::Town), 10)
            .unwrap();
        assert_eq!(moved, 2);
        assert_eq!(engine.state.land("A1").unwrap().towns, 2);
    }

    #[test]
    fn test_gather_from_near_land_costs_one() {
        let mut engine = EngineBuilder::new()
            .land("A1", 'W', 1, [2, 0, 0, 0])
            .build();
        let spent = engine.gather(PieceKind::Explorer, "A1", 2, true).unwrap();
        assert_eq!(spent, 2);
        assert_eq!(engine.state.sink().unwrap().explorers, 2);
    }

    #[test]
    fn test_slurp_cost_rationing() {
        // Land at hop distance 3, slurp stops at the distance-1 land:
        // cost 2 per unit.
        let mut engine = EngineBuilder::new()
            .land("A1", 'W', 1, [0, 0, 0, 0])
            .chained_land("B2", 'W', 2, "A1", [0, 0, 0, 0])
            .chained_land("C3", 'W', 3, "B2", [9, 0, 0, 0])
            .build();
        let spent = engine.slurp(PieceKind::Explorer, "C3", 9).unwrap();
        assert_eq!(spent, 8); // 4 units x cost 2
        assert_eq!(engine.state.land("A1").unwrap().explorers, 4);
        assert_eq!(engine.state.land("C3").unwrap().explorers, 5);
    }

    #[test]
    fn test_slurp_forced_through_defended_stop() {
        // Distance-1 stop holds dahan and no ravage is coming: a town
        // (health 2 > 0 ravages left) punches through to the sink,
        // paying one extra hop.
        let mut engine = EngineBuilder::new()
            .land("A1", 'W', 1, [0, 0, 0, 3])
            .chained_land("B2", 'W', 2, "A1", [0, 4, 0, 0])
            .build();
        engine.set_expected_ravages(0);
        let spent = engine.slurp(PieceKind::Town, "B2", 8).unwrap();
        // cost 1 + forced hop = 2 per unit
        assert_eq!(spent, 8);
        assert_eq!(engine.state.sink().unwrap().towns, 4);
        assert_eq!(engine.state.land("A1").unwrap().towns, 0);
    }

    #[test]
    fn test_slurp_skips_ignored_land() {
        let mut engine = EngineBuilder::new()
            .land("A1", 'W', 1, [5, 0, 0, 0])
            .ignore("A1")
            .build();
        let spent = engine.gather(PieceKind::Explorer, "A1", 5, true).unwrap();
        assert_eq!(spent, 0);
        assert_eq!(engine.state.land("A1").unwrap().explorers, 5);
    }

    #[test]
    fn test_apply_damage_stages_response_at_sink_for_near_land() {
        let mut engine = EngineBuilder::new()
            .land("A1", 'W', 1, [0, 2, 0, 0])
            .build();
        let consumed = engine.apply_damage("A1", PieceKind::Town, 4).unwrap();
        assert_eq!(consumed, 4);
        assert_eq!(engine.state.land("A1").unwrap().towns, 0);
        // Response staged, not yet live
        assert_eq!(engine.state.sink().unwrap().pending_explorers, 2);
        assert_eq!(engine.state.sink().unwrap().explorers, 0);
        assert_eq!(engine.state.fear, 2);
    }

    #[test]
    fn test_apply_damage_responds_in_place_when_defended() {
        let mut engine = EngineBuilder::new()
            .land("A1", 'W', 1, [0, 1, 0, 2])
            .build();
        engine.apply_damage("A1", PieceKind::Town, 2).unwrap();
        assert_eq!(engine.state.land("A1").unwrap().pending_explorers, 1);
        assert_eq!(engine.state.sink().unwrap().pending_explorers, 0);
    }

    #[test]
    fn test_apply_damage_no_response_for_explorer() {
        let mut engine = EngineBuilder::new()
            .land("A1", 'W', 1, [3, 0, 0, 0])
            .build();
        let consumed = engine.apply_damage("A1", PieceKind::Explorer, 2).unwrap();
        assert_eq!(consumed, 2);
        assert_eq!(engine.state.land("A1").unwrap().explorers, 1);
        assert_eq!(engine.state.sink().unwrap().pending_explorers, 0);
        assert_eq!(engine.state.fear, 0);
    }

    #[test]
    fn test_missing_route_is_fatal_without_allow_missing() {
        let result = EngineBuilder::new()
            .land("A1", 'W', 1, [0, 0, 0, 0])
            .orphan_land("GONE", 'J', [1, 0, 0, 0])
            .try_build();
        assert!(matches!(result, Err(SimError::MissingRoute { .. })));
    }

    #[test]
    fn test_missing_route_tolerated_with_allow_missing() {
        let engine = EngineBuilder::new()
            .land("A1", 'W', 1, [0, 0, 0, 0])
            .orphan_land("GONE", 'J', [1, 0, 0, 0])
            .allow_missing()
            .build();
        assert!(engine.state.reachable.iter().all(|k| k != "GONE"));
    }

    #[test]
    fn test_priority_key_orders_ignored_last() {
        let mut engine = EngineBuilder::new()
            .land("A1", 'W', 1, [0, 0, 0, 0])
            .land("B2", 'W', 1, [0, 0, 0, 0])
            .ignore("A1")
            .build();
        engine.conf.terrain_priority = "W".to_string();
        let order = engine.near_by_priority();
        assert_eq!(order, vec!["B2".to_string(), "A1".to_string()]);
    }

    #[test]
    fn test_rank_compared_before_distance_when_toggled() {
        let mut engine = EngineBuilder::new()
            .terrain_priority("WJ")
            .land("N1", 'J', 1, [0, 0, 0, 0])
            .chained_land("A1", 'W', 2, "N1", [0, 0, 0, 0])
            .build();
        // Default: the closer land sweeps first regardless of terrain
        assert_eq!(
            engine.reachable_by_priority(),
            vec!["N1".to_string(), "A1".to_string()]
        );
        engine.conf.distance_first = false;
        // Toggled: A1's better terrain rank outweighs its distance
        assert_eq!(
            engine.reachable_by_priority(),
            vec!["A1".to_string(), "N1".to_string()]
        );
    }

    #[test]
    fn test_coastal_promotion_reorders_sweep() {
        let inland = EngineBuilder::new()
            .terrain_priority("CM")
            .land("A1", 'J', 1, [0, 0, 0, 0])
            .land("B2", 'M', 1, [0, 0, 0, 0])
            .build();
        assert_eq!(
            inland.near_by_priority(),
            vec!["B2".to_string(), "A1".to_string()]
        );
        // Same board, but A1 on the coast takes the 'C' rank and jumps
        // ahead of the mountain land
        let coastal = EngineBuilder::new()
            .terrain_priority("CM")
            .land("A1", 'J', 1, [0, 0, 0, 0])
            .land("B2", 'M', 1, [0, 0, 0, 0])
            .coastal("A1")
            .build();
        assert_eq!(
            coastal.near_by_priority(),
            vec!["A1".to_string(), "B2".to_string()]
        );
    }

    #[test]
    fn test_priority_land_outranks_terrain() {
        let engine = EngineBuilder::new()
            .terrain_priority("W")
            .land("A1", 'W', 1, [0, 0, 0, 0])
            .land("B2", 'M', 1, [0, 0, 0, 0])
            .priority_land("B2")
            .build();
        // B2's unlisted terrain would rank last, but the explicit
        // priority listing puts it in front
        assert_eq!(
            engine.near_by_priority(),
            vec!["B2".to_string(), "A1".to_string()]
        );
    }

    #[test]
    fn test_force_policy_never_stops_at_defended_hop() {
        let mut engine = EngineBuilder::new()
            .land("A1", 'W', 1, [0, 0, 0, 3])
            .chained_land("B2", 'W', 2, "A1", [0, 4, 0, 0])
            .force_policy(ForcePolicy::Never)
            .build();
        engine.set_expected_ravages(0);
        let spent = engine.slurp(PieceKind::Town, "B2", 8).unwrap();
        // Same board as the survives-ravage test, but the towns halt at
        // the defended distance-1 land at cost 1 per unit
        assert_eq!(spent, 4);
        assert_eq!(engine.state.land("A1").unwrap().towns, 4);
        assert_eq!(engine.state.sink().unwrap().towns, 0);
    }

    #[test]
    fn test_force_policy_always_punches_through_empty_hop() {
        let mut engine = EngineBuilder::new()
            .land("A1", 'W', 1, [0, 0, 0, 0])
            .chained_land("B2", 'W', 2, "A1", [4, 0, 0, 0])
            .force_policy(ForcePolicy::Always)
            .build();
        let spent = engine.slurp(PieceKind::Explorer, "B2", 8).unwrap();
        // No dahan at the stop, still forced through: cost 1 + 1
        assert_eq!(spent, 8);
        assert_eq!(engine.state.sink().unwrap().explorers, 4);
        assert_eq!(engine.state.land("A1").unwrap().explorers, 0);
    }

    #[test]
    fn test_priority_key_prefers_less_defended_branch() {
        let mut engine = EngineBuilder::new()
            .land("A1", 'W', 1, [0, 0, 0, 5])
            .land("B2", 'W', 1, [0, 0, 0, 1])
            .chained_land("C3", 'W', 2, "A1", [1, 0, 0, 0])
            .chained_land("D4", 'W', 2, "B2", [1, 0, 0, 0])
            .build();
        let order: Vec<_> = engine
            .reachable_by_priority()
            .into_iter()
            .filter(|k| k == "C3" || k == "D4")
            .collect();
        // D4's branch is defended by 1 dahan, C3's by 5
        assert_eq!(order, vec!["D4".to_string(), "C3".to_string()]);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: a gather never spends more than the budget and
            /// never drives any counter negative.
            #[test]
            fn gather_budget_and_nonnegativity(
                explorers in 0i32..20,
                dahan in 0i32..5,
                budget in 0i32..30,
            ) {
                let mut engine = EngineBuilder::new()
                    .land("A1", 'W', 1, [0, 0, 0, dahan])
                    .chained_land("B2", 'W', 2, "A1", [explorers, 0, 0, 0])
                    .build();
                let spent = engine.gather(PieceKind::Explorer, "B2", budget, true).unwrap();
                prop_assert!(spent <= budget);
                prop_assert!(engine.state.land("B2").unwrap().explorers >= 0);
                prop_assert!(engine.state.sink().unwrap().explorers >= 0);
            }

            /// Property: transfer conserves the total across source and
            /// destination counters.
            #[test]
            fn transfer_conserves_total(
                src_count in 0i32..50,
                requested in 0i32..50,
                leave in 0i32..5,
            ) {
                let mut engine = EngineBuilder::new()
                    .land("A1", 'W', 1, [src_count, 0, 0, 0])
                    .leave_behind("A1", "explorer", leave)
                    .build();
                let moved = engine
                    .transfer(
                        "A1",
                        PieceKind::Explorer,
                        Destination::Live(SINK_KEY, PieceKind::Explorer),
                        requested,
                    )
                    .unwrap();
                let land = engine.state.land("A1").unwrap();
                prop_assert!(moved <= requested);
                prop_assert!(land.explorers >= 0);
                prop_assert_eq!(land.explorers + moved, src_count);
                prop_assert_eq!(engine.state.sink().unwrap().explorers, moved);
            }
        }
    }
}
