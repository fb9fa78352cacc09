//! Call phase: fixed rulebook budgets pulled from the distance-1 lands.

use crate::engine::Engine;
use crate::error::SimError;
use crate::pieces::PieceKind;

const TOWN_CALLS: i32 = 5;
const EXPLORER_CALLS: i32 = 15;
const DAHAN_CALLS: i32 = 5;

pub fn run_call(engine: &mut Engine) -> Result<(), SimError> {
    engine.phase_scope("call", |engine| {
        let mut wasted = TOWN_CALLS;
        for key in engine.near_most_dahan() {
            wasted -= engine.gather(PieceKind::Town, &key, wasted, true)?;
        }
        let mut explorer_budget = EXPLORER_CALLS;
        for key in engine.near_most_dahan() {
            explorer_budget -= engine.gather(PieceKind::Explorer, &key, explorer_budget, true)?;
        }
        wasted += explorer_budget;
        engine.state.wasted_invader_gathers += wasted;
        engine
            .state
            .log
            .comment(format!("unused gathers left at end of call: {wasted}"));

        let mut dahan_budget = DAHAN_CALLS;
        for key in engine.near_least_dahan() {
            dahan_budget -= engine.gather(PieceKind::Dahan, &key, dahan_budget, true)?;
        }
        engine.state.wasted_dahan_gathers += dahan_budget;
        Ok(())
    })
}
