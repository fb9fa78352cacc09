//! Out-of-band manual ledger: hand-recorded token movements applied at
//! named checkpoints between phases.
//!
//! Every row is audited: movements out of known lands must not drive a
//! counter negative, while lands outside the simulated region get a
//! shadow record that tracks the running (possibly negative) balance.

use crate::config::LairConf;
use crate::error::SimError;
use crate::log::{ActionKind, LogEntry, PieceMove};
use crate::pieces::PieceKind;
use crate::state::{LairState, Land, LandKey};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

fn to_int(s: &str) -> i32 {
    if s.is_empty() {
        0
    } else {
        s.trim().parse().unwrap_or(0)
    }
}

/// One row of the manual-actions ledger. Count fields stay as strings
/// so blank cells round-trip as blank on re-export.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManualAction {
    #[serde(rename = "Source")]
    pub source_key: String,
    #[serde(rename = "Destination")]
    pub destination_key: String,
    #[serde(rename = "City")]
    pub cities: String,
    #[serde(rename = "Town")]
    pub towns: String,
    #[serde(rename = "Explorer")]
    pub explorers: String,
    #[serde(rename = "Dahan")]
    pub dahan: String,
    #[serde(rename = "Action Name")]
    pub action_name: String,
    #[serde(rename = "Action ID")]
    pub action_id: String,
    #[serde(rename = "Parent")]
    pub parent_action: String,
    #[serde(rename = "Notes")]
    pub notes: String,
    #[serde(rename = "After Toplevel")]
    pub after_toplevel: String,
}

impl ManualAction {
    /// Counts in `(explorers, towns, cities, dahan)` order.
    pub fn counts(&self) -> [i32; 4] {
        [
            to_int(&self.explorers),
            to_int(&self.towns),
            to_int(&self.cities),
            to_int(&self.dahan),
        ]
    }

    pub fn csv_row(&self) -> Vec<String> {
        vec![
            self.source_key.clone(),
            self.destination_key.clone(),
            self.cities.clone(),
            self.towns.clone(),
            self.explorers.clone(),
            self.dahan.clone(),
            self.action_name.clone(),
            self.action_id.clone(),
            self.parent_action.clone(),
            self.notes.clone(),
            self.after_toplevel.clone(),
        ]
    }
}

/// Split a "key plus trailing terrain letter" reference like `A1W` or
/// `LAIRL` into its parts.
fn split_land_ref(reference: &str) -> (&str, char) {
    let terrain = reference.chars().last().unwrap_or('?');
    let key = &reference[..reference.len().saturating_sub(terrain.len_utf8())];
    (key, terrain)
}

fn terrain_emoji_name(terrain: char) -> Option<&'static str> {
    match terrain {
        'J' => Some("Jungle"),
        'M' => Some("Mountain"),
        'S' => Some("Sands"),
        'W' => Some("Wetlands"),
        _ => None,
    }
}

/// Presentation name for a land reference; emoji scheme renders the
/// terrain as a server emoji tag.
pub fn land_display_name(reference: &str, server_emojis: bool) -> String {
    if reference.is_empty() {
        return String::new();
    }
    let (key, terrain) = split_land_ref(reference);
    if server_emojis {
        if let Some(name) = terrain_emoji_name(terrain) {
            return format!("{key}:Land{name}:");
        }
    }
    reference.to_string()
}

/// The ledger, grouped by the checkpoint each row fires after.
#[derive(Debug, Clone, Default)]
pub struct DelayedActions {
    actions: HashMap<String, Vec<ManualAction>>,
    by_id: HashMap<String, ManualAction>,
    /// Shadow lands for movements outside the simulated region.
    pub distant: FxHashMap<LandKey, Land>,
    pub max_action_id: i64,
    pub server_emojis: bool,
}

impl DelayedActions {
    pub fn new(server_emojis: bool) -> Self {
        Self {
            server_emojis,
            max_action_id: -1,
            ..Default::default()
        }
    }

    pub fn push(&mut self, action: ManualAction) {
        if let Ok(id) = action.action_id.parse::<i64>() {
            self.max_action_id = self.max_action_id.max(id);
        }
        // An action split over several rows keeps only its first row as
        // the id anchor for parent-chain lookups.
        self.by_id
            .entry(action.action_id.clone())
            .or_insert_with(|| action.clone());
        self.actions
            .entry(action.after_toplevel.clone())
            .or_default()
            .push(action);
    }

    /// The full parent chain of an action, root first, joined with " - ".
    pub fn action_text(&self, action: &ManualAction) -> String {
        let mut names = vec![action.action_name.clone()];
        let mut parent = action.parent_action.clone();
        while !parent.is_empty() {
            match self.by_id.get(&parent) {
                Some(p) => {
                    names.push(p.action_name.clone());
                    parent = p.parent_action.clone();
                }
                None => break,
            }
        }
        names.reverse();
        names.join(" - ")
    }

    fn apply_one_side(
        &mut self,
        state: &mut LairState,
        action: &ManualAction,
        reference: &str,
        mult: i32,
    ) -> Result<(), SimError> {
        if reference.is_empty() {
            return Ok(());
        }
        let (key, terrain) = split_land_ref(reference);
        let (land, allow_negative) = match state.lands.get_mut(key) {
            Some(land) => {
                debug_assert_eq!(land.terrain, terrain);
                (land, false)
            }
            None => {
                let land = self
                    .distant
                    .entry(key.to_string())
                    .or_insert_with(|| Land::new_shadow(key, terrain));
                (land, true)
            }
        };

        let kinds = [
            PieceKind::Explorer,
            PieceKind::Town,
            PieceKind::City,
            PieceKind::Dahan,
        ];
        for (kind, count) in kinds.into_iter().zip(action.counts()) {
            let delta = mult * count;
            let counter = match land.count_mut(kind) {
                Some(c) => c,
                None => continue,
            };
            *counter += delta;
            if !allow_negative && *counter < 0 {
                return Err(SimError::ManualUnderflow {
                    action_id: action.action_id.clone(),
                    action_name: action.action_name.clone(),
                    land: key.to_string(),
                    kind: kind.name(&crate::pieces::PIECE_NAMES_TEXT).to_string(),
                    have: *counter - delta,
                    take: -delta,
                });
            }
        }
        Ok(())
    }

    fn entry_for(&self, conf: &LairConf, action: &ManualAction) -> LogEntry {
        let names = conf.piece_names;
        let mut entry = LogEntry::action(ActionKind::Manual);
        entry.text = Some(self.action_text(action));
        entry.csv_row = Some(action.csv_row());
        let src = land_display_name(&action.source_key, self.server_emojis);
        let tgt = land_display_name(&action.destination_key, self.server_emojis);
        entry.src_land = if src.is_empty() { None } else { Some(src) };
        entry.tgt_land = if tgt.is_empty() { None } else { Some(tgt) };
        let kinds = [
            PieceKind::Explorer,
            PieceKind::Town,
            PieceKind::City,
            PieceKind::Dahan,
        ];
        for (kind, count) in kinds.into_iter().zip(action.counts()) {
            let piece = kind.name(&names).to_string();
            entry.moves.push(PieceMove {
                src: piece.clone(),
                tgt: piece,
                count,
            });
        }
        entry
    }

    /// Apply every row registered for `checkpoint`, logging each row and
    /// a before/after summary of the sink (suppressed for the silent
    /// pre-start checkpoint).
    pub fn run(
        &mut self,
        state: &mut LairState,
        conf: &LairConf,
        checkpoint: &str,
        log_summary: bool,
    ) -> Result<(), SimError> {
        let batch = match self.actions.remove(checkpoint) {
            Some(batch) => batch,
            None => return Ok(()),
        };
        let names = conf.piece_names;
        let before = state.sink()?.describe(&names);
        let mut sublog = state.log.fork();
        for action in &batch {
            let source = action.source_key.clone();
            let destination = action.destination_key.clone();
            self.apply_one_side(state, action, &source, -1)?;
            self.apply_one_side(state, action, &destination, 1)?;
            sublog.push(self.entry_for(conf, action));
        }
        let after = state.sink()?.describe(&names);
        if log_summary {
            state.log.comment(format!(
                "execute delayed actions for {checkpoint}: ({before}) => ({after})"
            ));
            state.log.absorb(sublog);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::EngineBuilder;

    fn action(
        id: &str,
        name: &str,
        parent: &str,
        src: &str,
        dst: &str,
        explorers: &str,
        checkpoint: &str,
    ) -> ManualAction {
        ManualAction {
            source_key: src.to_string(),
            destination_key: dst.to_string(),
            explorers: explorers.to_string(),
            action_name: name.to_string(),
            action_id: id.to_string(),
            parent_action: parent.to_string(),
            after_toplevel: checkpoint.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_run_moves_pieces_between_known_lands() {
        let mut engine = EngineBuilder::new()
            .land("A1", 'W', 1, [3, 0, 0, 0])
            .build();
        let mut delayed = DelayedActions::new(false);
        delayed.push(action("1", "sacred gather", "", "A1W", "LAIRL", "2", "start"));
        delayed
            .run(&mut engine.state, &engine.conf, "start", true)
            .unwrap();
        assert_eq!(engine.state.land("A1").unwrap().explorers, 1);
        assert_eq!(engine.state.sink().unwrap().explorers, 2);
    }

    #[test]
    fn test_underflow_on_known_land_is_fatal() {
        let mut engine = EngineBuilder::new()
            .land("A1", 'W', 1, [1, 0, 0, 0])
            .build();
        let mut delayed = DelayedActions::new(false);
        delayed.push(action("1", "overdraw", "", "A1W", "LAIRL", "2", "start"));
        let err = delayed
            .run(&mut engine.state, &engine.conf, "start", true)
            .unwrap_err();
        assert!(matches!(err, SimError::ManualUnderflow { .. }));
    }

    #[test]
    fn test_distant_land_gets_shadow_record() {
        let mut engine = EngineBuilder::new()
            .land("A1", 'W', 1, [0, 0, 0, 0])
            .build();
        let mut delayed = DelayedActions::new(false);
        delayed.push(action("1", "far push", "", "ZZ9J", "A1W", "4", "start"));
        delayed
            .run(&mut engine.state, &engine.conf, "start", true)
            .unwrap();
        assert_eq!(engine.state.land("A1").unwrap().explorers, 4);
        assert_eq!(delayed.distant.get("ZZ9").unwrap().explorers, -4);
    }

    #[test]
    fn test_checkpoint_batches_run_independently() {
        let mut engine = EngineBuilder::new()
            .land("A1", 'W', 1, [5, 0, 0, 0])
            .build();
        let mut delayed = DelayedActions::new(false);
        delayed.push(action("1", "early", "", "A1W", "LAIRL", "1", "start"));
        delayed.push(action("2", "late", "", "A1W", "LAIRL", "1", "call"));
        delayed
            .run(&mut engine.state, &engine.conf, "start", true)
            .unwrap();
        assert_eq!(engine.state.sink().unwrap().explorers, 1);
        delayed
            .run(&mut engine.state, &engine.conf, "call", true)
            .unwrap();
        assert_eq!(engine.state.sink().unwrap().explorers, 2);
        // re-running a consumed checkpoint is a no-op
        delayed
            .run(&mut engine.state, &engine.conf, "call", true)
            .unwrap();
        assert_eq!(engine.state.sink().unwrap().explorers, 2);
    }

    #[test]
    fn test_action_text_joins_parent_chain() {
        let mut delayed = DelayedActions::new(false);
        delayed.push(action("1", "root move", "", "", "", "", "start"));
        delayed.push(action("2", "followup", "1", "", "", "", "start"));
        let leaf = action("3", "leaf", "2", "", "", "", "start");
        delayed.push(leaf.clone());
        assert_eq!(delayed.action_text(&leaf), "root move - followup - leaf");
    }

    #[test]
    fn test_max_action_id_tracks_highest() {
        let mut delayed = DelayedActions::new(false);
        delayed.push(action("3", "a", "", "", "", "", ""));
        delayed.push(action("11", "b", "", "", "", "", ""));
        assert_eq!(delayed.max_action_id, 11);
    }
}
