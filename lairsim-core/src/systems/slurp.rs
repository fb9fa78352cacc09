//! Slurp phase: the large, multi-hop, cost-rationed gather. The budget
//! sweeps all routed lands in priority order, then a second pass spends
//! any remainder on explorers from the distance-1 lands.

use crate::config::InnateConf;
use crate::engine::Engine;
use crate::error::SimError;
use crate::pieces::PieceKind;

const SLURP_RATIO: i32 = 6;

pub fn run_slurp(engine: &mut Engine, innate: InnateConf) -> Result<(), SimError> {
    let sink = engine.state.sink()?;
    let mut gathers = (sink.explorers + sink.dahan) / SLURP_RATIO;
    engine
        .state
        .log
        .comment(format!("available gathers: {gathers}"));
    if innate.reserve_gathers > 0 {
        let reserved = gathers.min(innate.reserve_gathers);
        engine
            .state
            .log
            .indented(|log| log.comment(format!("reserved {reserved} gathers")));
        gathers -= reserved;
    }

    for key in engine.reachable_by_priority() {
        let d = engine.state.dist.get(&key).copied().unwrap_or(u32::MAX);
        if d > innate.max_range {
            continue;
        }
        // Heaviest invaders first
        for kind in PieceKind::INVADERS.into_iter().rev() {
            gathers -= engine.slurp(kind, &key, gathers)?;
        }
    }
    engine.commit_buffered();

    for key in engine.near_most_dahan() {
        gathers -= engine.gather(PieceKind::Explorer, &key, gathers, true)?;
    }
    engine.commit_buffered();

    engine
        .state
        .log
        .comment(format!("unused gathers left at end of slurp: {gathers}"));
    engine.state.wasted_invader_gathers += gathers;
    Ok(())
}
