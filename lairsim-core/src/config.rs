//! Per-run immutable configuration for the simulation.

use crate::pieces::{PieceNames, PIECE_NAMES_TEXT};
use crate::state::LandKey;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Innate settings of one invader faction.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InnateConf {
    /// Gathers carved out of the slurp budget before spending.
    pub reserve_gathers: i32,
    /// Maximum hop distance the slurp sweep will reach.
    pub max_range: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Faction {
    Blue,
    Orange,
}

impl Faction {
    pub fn label(self) -> &'static str {
        match self {
            Faction::Blue => "blue",
            Faction::Orange => "orange",
        }
    }
}

/// When a slurped piece bypasses its defended distance-1 stop and routes
/// straight into the sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ForcePolicy {
    Never,
    Always,
    /// Punch through when the piece would survive the remaining ravages
    /// and the distance-1 stop is defended. The original heuristic.
    #[default]
    SurvivesRavage,
}

#[derive(Debug, Clone)]
pub struct LairConf {
    /// Terrain letters in clear-priority order; unlisted terrains rank
    /// last. The letter 'C' marks the rank coastal lands get promoted to.
    pub terrain_priority: String,
    pub blue: InnateConf,
    pub orange: InnateConf,
    /// land key -> piece text name -> minimum units never drained.
    pub leave_behind: HashMap<LandKey, HashMap<String, i32>>,
    pub ignore_lands: Vec<LandKey>,
    pub priority_lands: Vec<LandKey>,
    pub piece_names: PieceNames,
    /// Annotate display names with the hop distance.
    pub display_name_range: bool,
    /// Tolerate configured lands that are missing from the distance tree.
    pub allow_missing: bool,
    /// Compare hop distance before terrain rank in the land priority key.
    pub distance_first: bool,
    pub force_policy: ForcePolicy,
}

impl Default for LairConf {
    fn default() -> Self {
        Self {
            terrain_priority: String::new(),
            blue: InnateConf::default(),
            orange: InnateConf::default(),
            leave_behind: HashMap::new(),
            ignore_lands: Vec::new(),
            priority_lands: Vec::new(),
            piece_names: PIECE_NAMES_TEXT,
            display_name_range: false,
            allow_missing: false,
            distance_first: true,
            force_policy: ForcePolicy::default(),
        }
    }
}

impl LairConf {
    pub fn innate(&self, faction: Faction) -> InnateConf {
        match faction {
            Faction::Blue => self.blue,
            Faction::Orange => self.orange,
        }
    }

    fn terrain_rank(&self, terrain: char) -> i32 {
        self.terrain_priority
            .chars()
            .position(|c| c == terrain)
            .map(|i| i as i32)
            .unwrap_or(self.terrain_priority.len() as i32)
    }

    /// Clear-priority rank of a land; lower clears first. Lands on the
    /// explicit priority list rank -1; coastal lands are promoted to the
    /// 'C' rank when that beats their terrain.
    pub fn land_rank(&self, key: Option<&str>, terrain: char, coastal: bool) -> i32 {
        if let Some(key) = key {
            if self.priority_lands.iter().any(|k| k == key) {
                return -1;
            }
        }
        let mut rank = self.terrain_rank(terrain);
        if coastal {
            rank = rank.min(self.terrain_rank('C'));
        }
        rank
    }

    pub fn leave_behind(&self, land: &str, piece_text_name: &str) -> i32 {
        self.leave_behind
            .get(land)
            .and_then(|per_kind| per_kind.get(piece_text_name))
            .copied()
            .unwrap_or(0)
    }

    pub fn is_ignored(&self, key: &str) -> bool {
        self.ignore_lands.iter().any(|k| k == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terrain_rank_orders_by_priority_string() {
        let conf = LairConf {
            terrain_priority: "WJS".to_string(),
            ..Default::default()
        };
        assert_eq!(conf.land_rank(None, 'W', false), 0);
        assert_eq!(conf.land_rank(None, 'J', false), 1);
        // Unlisted terrain ranks last
        assert_eq!(conf.land_rank(None, 'M', false), 3);
    }

    #[test]
    fn test_coastal_promotion() {
        let conf = LairConf {
            terrain_priority: "CWJ".to_string(),
            ..Default::default()
        };
        // Mountain is unlisted (rank 3) but coastal promotes it to 'C'
        assert_eq!(conf.land_rank(None, 'M', true), 0);
        // A listed terrain already ahead of 'C' keeps its rank
        let conf = LairConf {
            terrain_priority: "WC".to_string(),
            ..Default::default()
        };
        assert_eq!(conf.land_rank(None, 'W', true), 0);
    }

    #[test]
    fn test_priority_list_overrides_terrain() {
        let conf = LairConf {
            terrain_priority: "WJS".to_string(),
            priority_lands: vec!["A1".to_string()],
            ..Default::default()
        };
        assert_eq!(conf.land_rank(Some("A1"), 'M', false), -1);
        assert_eq!(conf.land_rank(Some("B2"), 'M', false), 3);
    }

    #[test]
    fn test_leave_behind_defaults_to_zero() {
        let mut leave = HashMap::new();
        leave.insert(
            "A1".to_string(),
            HashMap::from([("town".to_string(), 2)]),
        );
        let conf = LairConf {
            leave_behind: leave,
            ..Default::default()
        };
        assert_eq!(conf.leave_behind("A1", "town"), 2);
        assert_eq!(conf.leave_behind("A1", "explorer"), 0);
        assert_eq!(conf.leave_behind("B2", "town"), 0);
    }
}
