//! Downgrade phase: spend sink explorers+dahan converting the sink's
//! own heavy invaders into lighter ones.

use crate::engine::Engine;
use crate::error::SimError;
use crate::pieces::PieceKind;
use crate::state::SINK_KEY;

const DOWNGRADE_RATIO: i32 = 3;

pub fn run_downgrade(engine: &mut Engine) -> Result<(), SimError> {
    let sink = engine.state.sink()?;
    let mut budget = (sink.explorers + sink.dahan) / DOWNGRADE_RATIO;
    engine
        .state
        .log
        .comment(format!("available downgrades: {budget}"));
    budget -= engine.downgrade(PieceKind::City, SINK_KEY, budget)?;
    budget -= engine.downgrade(PieceKind::Town, SINK_KEY, budget)?;
    engine.state.wasted_downgrades += budget;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::EngineBuilder;

    #[test]
    fn test_budget_spent_on_towns_when_no_cities() {
        let mut engine = EngineBuilder::new().sink([9, 3, 0, 0]).build();
        run_downgrade(&mut engine).unwrap();
        let sink = engine.state.sink().unwrap();
        assert_eq!(sink.towns, 0);
        // 9 explorers plus 3 downgraded towns
        assert_eq!(sink.explorers, 12);
        assert_eq!(engine.state.wasted_downgrades, 0);
    }

    #[test]
    fn test_cities_consume_budget_before_towns() {
        let mut engine = EngineBuilder::new().sink([6, 4, 4, 3]).build();
        // budget = (6 + 3) / 3 = 3
        run_downgrade(&mut engine).unwrap();
        let sink = engine.state.sink().unwrap();
        assert_eq!(sink.cities, 1);
        // 3 cities became towns; no budget left for towns
        assert_eq!(sink.towns, 7);
        assert_eq!(sink.explorers, 6);
        assert_eq!(engine.state.wasted_downgrades, 0);
    }

    #[test]
    fn test_leftover_budget_is_wasted() {
        let mut engine = EngineBuilder::new().sink([9, 1, 0, 0]).build();
        run_downgrade(&mut engine).unwrap();
        assert_eq!(engine.state.sink().unwrap().towns, 0);
        assert_eq!(engine.state.wasted_downgrades, 2);
    }
}
