//! Ravage phase: convert the sink's invader strength into damage dealt
//! across the distance-1 lands, staging military responses that commit
//! only once the whole phase is over.

use crate::engine::Engine;
use crate::error::SimError;
use crate::pieces::PieceKind;

/// Explorers beyond this many contribute 1 damage each.
const FREE_EXPLORERS: i32 = 6;

pub fn run_ravage(engine: &mut Engine) -> Result<(), SimError> {
    engine.phase_scope("ravage", ravage_inner)
}

/// The phase body, also run inside a blur scope.
pub(crate) fn ravage_inner(engine: &mut Engine) -> Result<(), SimError> {
    engine.note_ravage_started();

    let sink = engine.state.sink()?;
    let mut dmg = (sink.explorers - FREE_EXPLORERS).max(0) + sink.towns * 2 + sink.cities * 3;
    let fear_before = engine.state.fear;

    let lands = engine.near_by_priority();
    for key in &lands {
        dmg -= engine.apply_damage(key, PieceKind::Town, dmg)?;
        dmg -= engine.apply_damage(key, PieceKind::City, dmg)?;
    }
    for key in &lands {
        dmg -= engine.apply_damage(key, PieceKind::Explorer, dmg)?;
    }

    engine.commit_buffered();
    engine
        .state
        .log
        .comment(format!("unused damage left at end of ravage: {dmg}"));
    engine.state.log.comment(format!(
        "fear caused by ravage: {}",
        engine.state.fear - fear_before
    ));
    engine.state.wasted_damage += dmg;

    engine.state.sink_mut()?.commit_responses();
    for key in engine.state.near.clone() {
        engine.state.land_mut(&key)?.commit_responses();
    }
    Ok(())
}
