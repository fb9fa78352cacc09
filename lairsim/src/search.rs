//! Permutation search over phase orderings.
//!
//! Each candidate ordering gets a fresh engine; workers share nothing
//! mutable, so the fan-out is embarrassingly parallel. A worker that
//! fails logs the error and its ordering is dropped from the results.

use crate::loader::Scenario;
use lairsim_core::systems::{self, Phase};
use lairsim_core::{score, LairState, SimError};
use rayon::prelude::*;
use std::collections::BTreeSet;

/// One evaluated ordering with its pre- and post-ravage snapshots.
pub struct SeqResult {
    pub seq: Vec<Phase>,
    pub preravage: LairState,
    pub postravage: LairState,
}

/// All distinct orderings of the action multiset.
pub fn distinct_permutations(actions: &[Phase]) -> Vec<Vec<Phase>> {
    let mut out = BTreeSet::new();
    let mut scratch = actions.to_vec();
    permute(&mut scratch, 0, &mut out);
    out.into_iter().collect()
}

fn permute(items: &mut Vec<Phase>, from: usize, out: &mut BTreeSet<Vec<Phase>>) {
    if from + 1 >= items.len() {
        out.insert(items.clone());
        return;
    }
    for i in from..items.len() {
        items.swap(from, i);
        permute(items, from + 1, out);
        items.swap(from, i);
    }
}

/// Run one full ordering: manual checkpoints fire after each phase, a
/// pre-ravage snapshot is taken, then the closing ravage runs.
pub fn run_sequence(
    scenario: &Scenario,
    seq: &[Phase],
) -> Result<(LairState, LairState), SimError> {
    let (mut engine, mut delayed) = scenario.build()?;
    engine.set_expected_ravages(1 + seq.iter().map(|p| p.ravages()).sum::<i32>());
    delayed.run(&mut engine.state, &engine.conf, "start", true)?;
    for phase in seq {
        systems::run(&mut engine, *phase)?;
        delayed.run(&mut engine.state, &engine.conf, phase.name(), true)?;
    }
    let preravage = engine.state.clone();
    systems::ravage::run_ravage(&mut engine)?;
    Ok((preravage, engine.state))
}

/// Evaluate every ordering in parallel and sort ascending by
/// post-ravage score, ties broken by the ordering itself so the result
/// list is fully reproducible.
pub fn search(scenario: &Scenario, seqs: &[Vec<Phase>]) -> Vec<SeqResult> {
    let mut results: Vec<SeqResult> = seqs
        .par_iter()
        .filter_map(|seq| match run_sequence(scenario, seq) {
            Ok((preravage, postravage)) => Some(SeqResult {
                seq: seq.clone(),
                preravage,
                postravage,
            }),
            Err(err) => {
                log::error!("ordering {:?} failed: {err}", phase_names(seq));
                None
            }
        })
        .collect();
    results.sort_by(|a, b| {
        score(&scenario.conf, &a.postravage)
            .cmp(&score(&scenario.conf, &b.postravage))
            .then_with(|| a.seq.cmp(&b.seq))
    });
    results
}

pub fn phase_names(seq: &[Phase]) -> Vec<&'static str> {
    seq.iter().map(|p| p.name()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinct_permutations_dedupe() {
        let seqs = distinct_permutations(&[Phase::Blur, Phase::Blur, Phase::Call]);
        // 3! = 6 arrangements, but the two blurs are interchangeable
        assert_eq!(seqs.len(), 3);
        for seq in &seqs {
            assert_eq!(seq.len(), 3);
            assert_eq!(seq.iter().filter(|p| **p == Phase::Blur).count(), 2);
        }
    }

    #[test]
    fn test_single_action_permutation() {
        let seqs = distinct_permutations(&[Phase::Call]);
        assert_eq!(seqs, vec![vec![Phase::Call]]);
    }

    #[test]
    fn test_permutations_are_sorted() {
        let seqs = distinct_permutations(&[Phase::Call, Phase::LairBlue]);
        let mut sorted = seqs.clone();
        sorted.sort();
        assert_eq!(seqs, sorted);
    }
}
