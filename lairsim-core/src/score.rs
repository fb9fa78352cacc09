//! Scoring for the phase-ordering search.

use crate::config::LairConf;
use crate::state::{LairState, SINK_KEY};

/// Lexicographic score of a finished run; higher is better. Components:
/// fully cleared priority-terrain lands, invaders pulled into the sink,
/// and (as a tie-break) wasted invader gathers.
pub type Score = (i32, i32, i32);

pub fn score(conf: &LairConf, state: &LairState) -> Score {
    let cleared = state
        .reachable
        .iter()
        .filter_map(|key| state.lands.get(key))
        .filter(|land| conf.terrain_priority.contains(land.terrain))
        .filter(|land| land.total_invaders() == 0)
        .count() as i32;
    let sink_invaders = state
        .lands
        .get(SINK_KEY)
        .map_or(0, |land| land.total_invaders());
    (cleared, sink_invaders, state.wasted_invader_gathers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::EngineBuilder;

    #[test]
    fn test_counts_only_cleared_priority_terrain() {
        let mut engine = EngineBuilder::new()
            .sink([4, 1, 0, 0])
            .terrain_priority("W")
            .land("A1", 'W', 1, [0, 0, 0, 2])
            .land("B2", 'W', 1, [1, 0, 0, 0])
            .land("C3", 'J', 1, [0, 0, 0, 0])
            .build();
        engine.state.wasted_invader_gathers = 3;
        // A1 cleared and priority; B2 priority but occupied; C3 cleared
        // but not priority terrain
        assert_eq!(score(&engine.conf, &engine.state), (1, 5, 3));
    }

    #[test]
    fn test_dahan_do_not_block_clearance() {
        let engine = EngineBuilder::new()
            .terrain_priority("J")
            .land("A1", 'J', 1, [0, 0, 0, 5])
            .build();
        assert_eq!(score(&engine.conf, &engine.state).0, 1);
    }
}
