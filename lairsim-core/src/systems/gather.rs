//! Small-gather phase: two independent 1-unit budgets pulled from the
//! most defended distance-1 lands straight into the sink.

use crate::engine::Engine;
use crate::error::SimError;
use crate::pieces::PieceKind;

pub fn run_small_gather(engine: &mut Engine) -> Result<(), SimError> {
    let mut gathers = 1;
    for kind in [PieceKind::Explorer, PieceKind::Town] {
        for key in engine.near_most_dahan() {
            gathers -= engine.gather(kind, &key, gathers, true)?;
        }
    }
    engine.state.wasted_invader_gathers += gathers;

    let mut gathers = 1;
    for key in engine.near_most_dahan() {
        gathers -= engine.gather(PieceKind::Dahan, &key, gathers, true)?;
    }
    engine.state.wasted_dahan_gathers += gathers;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::EngineBuilder;

    #[test]
    fn test_pulls_one_invader_and_one_dahan() {
        let mut engine = EngineBuilder::new()
            .land("A1", 'W', 1, [2, 1, 0, 3])
            .land("B2", 'W', 1, [1, 0, 0, 0])
            .build();
        run_small_gather(&mut engine).unwrap();
        let sink = engine.state.sink().unwrap();
        assert_eq!(sink.explorers, 1);
        assert_eq!(sink.dahan, 1);
        // A1 is more defended, so it is drained first
        assert_eq!(engine.state.land("A1").unwrap().explorers, 1);
        assert_eq!(engine.state.land("A1").unwrap().dahan, 2);
        assert_eq!(engine.state.land("B2").unwrap().explorers, 1);
        assert_eq!(engine.state.wasted_invader_gathers, 0);
        assert_eq!(engine.state.wasted_dahan_gathers, 0);
    }

    #[test]
    fn test_town_taken_when_no_explorers() {
        let mut engine = EngineBuilder::new()
            .land("A1", 'W', 1, [0, 2, 0, 0])
            .build();
        run_small_gather(&mut engine).unwrap();
        assert_eq!(engine.state.sink().unwrap().towns, 1);
        assert_eq!(engine.state.land("A1").unwrap().towns, 1);
    }

    #[test]
    fn test_empty_board_wastes_both_budgets() {
        let mut engine = EngineBuilder::new()
            .land("A1", 'W', 1, [0, 0, 0, 0])
            .build();
        run_small_gather(&mut engine).unwrap();
        assert_eq!(engine.state.wasted_invader_gathers, 1);
        assert_eq!(engine.state.wasted_dahan_gathers, 1);
    }
}
