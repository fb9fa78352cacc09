//! Blur phase: sink reinforcement followed immediately by a ravage,
//! all inside one log scope.

use super::ravage;
use crate::engine::Engine;
use crate::error::SimError;
use crate::pieces::PieceKind;
use crate::state::SINK_KEY;

pub fn run_blur(engine: &mut Engine) -> Result<(), SimError> {
    engine.phase_scope("blur", |engine| {
        if engine.state.sink()?.dahan > 0 {
            engine.place(SINK_KEY, PieceKind::Dahan, 1)?;
        }
        reinforce(engine)?;
        ravage::ravage_inner(engine)
    })
}

pub fn run_blur2(engine: &mut Engine) -> Result<(), SimError> {
    run_blur(engine)?;
    run_blur(engine)
}

/// Add one invader to the sink: a city when towns outnumber cities,
/// otherwise a town. An empty sink builds nothing.
fn reinforce(engine: &mut Engine) -> Result<(), SimError> {
    let sink = engine.state.sink()?;
    if sink.total_invaders() == 0 {
        return Ok(());
    }
    let kind = if sink.towns > sink.cities {
        PieceKind::City
    } else {
        PieceKind::Town
    };
    engine.place(SINK_KEY, kind, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::EngineBuilder;

    #[test]
    fn test_builds_city_when_towns_outnumber_cities() {
        let mut engine = EngineBuilder::new()
            .sink([0, 2, 1, 0])
            .land("A1", 'W', 1, [0, 0, 0, 0])
            .build();
        run_blur(&mut engine).unwrap();
        let sink = engine.state.sink().unwrap();
        assert_eq!(sink.cities, 2);
        assert_eq!(sink.towns, 2);
    }

    #[test]
    fn test_builds_town_otherwise() {
        let mut engine = EngineBuilder::new()
            .sink([1, 0, 0, 0])
            .land("A1", 'W', 1, [0, 0, 0, 0])
            .build();
        run_blur(&mut engine).unwrap();
        assert_eq!(engine.state.sink().unwrap().towns, 1);
    }

    #[test]
    fn test_empty_sink_builds_nothing() {
        let mut engine = EngineBuilder::new()
            .land("A1", 'W', 1, [0, 0, 0, 0])
            .build();
        run_blur(&mut engine).unwrap();
        let sink = engine.state.sink().unwrap();
        assert_eq!(sink.total_invaders(), 0);
        assert_eq!(sink.dahan, 0);
    }

    #[test]
    fn test_dahan_added_when_sink_defended() {
        let mut engine = EngineBuilder::new()
            .sink([0, 0, 0, 2])
            .land("A1", 'W', 1, [0, 0, 0, 0])
            .build();
        run_blur(&mut engine).unwrap();
        assert_eq!(engine.state.sink().unwrap().dahan, 3);
    }

    #[test]
    fn test_blur_ravages_after_building() {
        // 2 towns build a city; damage = 2*2 + 3 = 7, enough to clear
        // A1's town and explorers
        let mut engine = EngineBuilder::new()
            .sink([0, 2, 0, 0])
            .land("A1", 'W', 1, [3, 1, 0, 0])
            .build();
        run_blur(&mut engine).unwrap();
        let a1 = engine.state.land("A1").unwrap();
        assert_eq!(a1.towns, 0);
        assert_eq!(a1.explorers, 0);
        assert_eq!(engine.state.wasted_damage, 2);
    }
}
