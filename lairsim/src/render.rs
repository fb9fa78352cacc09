//! Presentation layer: turning a committed action log and final land
//! state into text, diff, and CSV outputs. Rendering never mutates the
//! log, so the same committed log renders identically every time.

use anyhow::Result;
use lairsim_core::pieces::stringify_pieces;
use lairsim_core::{
    ActionKind, LairConf, LairState, Land, LogEntry, ManualAction, PieceKind, SINK_KEY,
};
use std::io::Write;

fn src_pieces_text(entry: &LogEntry) -> String {
    stringify_pieces(entry.moves.iter().map(|m| (m.src.as_str(), m.count)))
}

fn tgt_pieces_text(entry: &LogEntry) -> String {
    stringify_pieces(entry.moves.iter().map(|m| (m.tgt.as_str(), m.count)))
}

/// One log entry as a markdown bullet body.
pub fn entry_to_text(entry: &LogEntry) -> String {
    match entry.kind {
        ActionKind::Comment => entry.text.clone().unwrap_or_default(),
        ActionKind::Gather => {
            let intermediate: String = entry
                .via
                .iter()
                .map(|land| format!(" to {land}"))
                .collect();
            format!(
                "gather {} from {}{} to {} (total {})",
                src_pieces_text(entry),
                entry.src_land.as_deref().unwrap_or(""),
                intermediate,
                entry.tgt_land.as_deref().unwrap_or(""),
                entry.total_count()
            )
        }
        ActionKind::Add => format!(
            "add {} in {} (total {})",
            tgt_pieces_text(entry),
            entry.tgt_land.as_deref().unwrap_or(""),
            entry.total_count()
        ),
        ActionKind::Destroy => {
            let response = if entry.moves.iter().any(|m| !m.tgt.is_empty()) {
                format!(
                    ", MR adds {} in {}",
                    tgt_pieces_text(entry),
                    entry.tgt_land.as_deref().unwrap_or("")
                )
            } else {
                String::new()
            };
            format!(
                "destroy {} in {}{}",
                src_pieces_text(entry),
                entry.src_land.as_deref().unwrap_or(""),
                response
            )
        }
        ActionKind::Downgrade => format!(
            "downgrade {} in {} (total {})",
            src_pieces_text(entry),
            entry.src_land.as_deref().unwrap_or(""),
            entry.total_count()
        ),
        ActionKind::Manual => {
            let text = entry
                .text
                .as_deref()
                .map(|t| format!(" {}", t.rsplit(" - ").next().unwrap_or(t)))
                .unwrap_or_default();
            let src = match entry.src_land.as_deref() {
                Some(land) if !land.is_empty() => {
                    format!(" -({}) in {}", src_pieces_text(entry), land)
                }
                _ => String::new(),
            };
            let tgt = match entry.tgt_land.as_deref() {
                Some(land) if !land.is_empty() => {
                    format!(" +({}) in {}", tgt_pieces_text(entry), land)
                }
                _ => String::new(),
            };
            format!("manual action:{text}{src}{tgt}")
        }
    }
}

/// The strip of a summary line used to group entries: everything before
/// the before/after parenthetical.
pub fn cut_toplevel(line: &str) -> &str {
    line.split(": (").next().unwrap_or(line)
}

/// The full indented log. Nested lines must match `filter`; toplevel
/// summaries always show.
pub fn render_log(state: &LairState, filter: &str) -> String {
    let mut lines = Vec::new();
    for (depth, entry) in state.log.entries() {
        let line = entry_to_text(entry);
        if line.is_empty() {
            continue;
        }
        if *depth != 0 && !line.contains(filter) {
            continue;
        }
        lines.push(format!("{}- {}", "  ".repeat(*depth), line));
    }
    lines.join("\n")
}

fn land_diff(before: &Land, after: &Land, conf: &LairConf, show_all: bool) -> Option<String> {
    let names = conf.piece_names;
    let unchanged = before.explorers == after.explorers
        && before.towns == after.towns
        && before.cities == after.cities
        && before.dahan == after.dahan;
    let after_text = if unchanged {
        if !show_all {
            return None;
        }
        "UNCHANGED".to_string()
    } else {
        after.describe(&names)
    };
    Some(format!(
        "{}: ({}) => ({})",
        before.display_name,
        before.describe(&names),
        after_text
    ))
}

pub struct DiffOptions<'a> {
    pub filter: &'a str,
    pub show_all: bool,
    pub sort_by_range: bool,
}

/// Per-land before/after diff, grouped under toplevel bullets by first
/// letter of the land name or by hop distance.
pub fn diff_view(
    conf: &LairConf,
    before: &LairState,
    after: &LairState,
    opts: &DiffOptions,
) -> String {
    let sink_name = after
        .lands
        .get(SINK_KEY)
        .map(|l| l.display_name.clone())
        .unwrap_or_default();

    let mut rows: Vec<(String, u32)> = Vec::new();
    let mut keys = vec![SINK_KEY.to_string()];
    keys.extend(after.reachable.iter().cloned());
    keys.extend(after.unroutable.iter().cloned());
    for key in keys {
        let (Some(a), Some(b)) = (before.lands.get(&key), after.lands.get(&key)) else {
            continue;
        };
        let dist = after.dist.get(&key).copied().unwrap_or(0);
        if let Some(line) = land_diff(a, b, conf, opts.show_all) {
            rows.push((line, dist));
        }
    }
    if opts.sort_by_range {
        rows.sort_by_key(|(_, dist)| *dist);
    } else {
        rows.sort_by(|(a, _), (b, _)| a.cmp(b));
    }

    let mut out = Vec::new();
    let mut last_toplevel: Option<String> = None;
    for (line, dist) in rows {
        if !line.contains(opts.filter) {
            continue;
        }
        let toplevel = if opts.sort_by_range {
            dist.to_string()
        } else {
            line.chars().next().unwrap_or(' ').to_string()
        };
        if last_toplevel.as_deref() != Some(&toplevel) {
            out.push(format!("- {sink_name} {toplevel} diff"));
            last_toplevel = Some(toplevel);
        }
        out.push(format!("  - {line}"));
    }
    out.join("\n")
}

fn csv_count(v: i32) -> String {
    if v == 0 {
        String::new()
    } else {
        v.to_string()
    }
}

/// Flat spreadsheet ledger: one row per transaction touching the sink,
/// with signed deltas and running sink totals.
pub fn write_ledger<W: Write>(
    out: W,
    conf: &LairConf,
    initial_sink: &Land,
    state: &LairState,
) -> Result<()> {
    let names = conf.piece_names;
    let sink_display = state
        .lands
        .get(SINK_KEY)
        .map(|l| l.display_name.clone())
        .unwrap_or_default();
    let mut w = csv::Writer::from_writer(out);

    let mut totals = [
        initial_sink.explorers,
        initial_sink.towns,
        initial_sink.cities,
        initial_sink.dahan,
    ];
    w.write_record([
        csv_count(totals[0]),
        csv_count(totals[1]),
        csv_count(totals[2]),
        csv_count(totals[3]),
        totals[0].to_string(),
        totals[1].to_string(),
        totals[2].to_string(),
        totals[3].to_string(),
        "LAIR".to_string(),
        "From last phase".to_string(),
    ])?;

    let piece_index = |name: &str| -> Option<usize> {
        [
            PieceKind::Explorer,
            PieceKind::Town,
            PieceKind::City,
            PieceKind::Dahan,
        ]
        .into_iter()
        .position(|kind| kind.name(&names) == name)
    };
    let is_sink = |land: Option<&str>| -> bool {
        matches!(land, Some(l) if l == sink_display || l == "LAIRL")
    };

    let mut toplevel = String::new();
    for (depth, entry) in state.log.entries() {
        if *depth == 0 {
            toplevel = cut_toplevel(entry.text.as_deref().unwrap_or("")).to_string();
        }
        let action = match entry.kind {
            ActionKind::Downgrade => format!("{toplevel} - downgrade"),
            ActionKind::Gather => format!("{toplevel} - gather ({})", entry.total_count()),
            ActionKind::Add => format!("{toplevel} - add"),
            ActionKind::Destroy => format!("{toplevel} - military response"),
            ActionKind::Manual => entry.text.clone().unwrap_or_else(|| "UNKNOWN".to_string()),
            ActionKind::Comment => continue,
        };

        let src_mult = i32::from(is_sink(entry.src_land.as_deref()));
        let tgt_mult = i32::from(is_sink(entry.tgt_land.as_deref()));
        if src_mult == 0 && tgt_mult == 0 {
            continue;
        }

        let mut diffs = [0i32; 4];
        for m in &entry.moves {
            if let Some(i) = piece_index(&m.src) {
                diffs[i] -= m.count * src_mult;
            }
            if let Some(i) = piece_index(&m.tgt) {
                diffs[i] += m.count * tgt_mult;
            }
        }
        for (total, diff) in totals.iter_mut().zip(diffs) {
            *total += diff;
        }

        w.write_record([
            csv_count(diffs[0]),
            csv_count(diffs[1]),
            csv_count(diffs[2]),
            csv_count(diffs[3]),
            totals[0].to_string(),
            totals[1].to_string(),
            totals[2].to_string(),
            totals[3].to_string(),
            entry.src_land.clone().unwrap_or_default(),
            action.clone(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

/// Reconstruct the slurp phases of a finished run as manual-ledger rows,
/// appended after the existing ledger's highest action id.
pub fn write_actions_csv<W: Write>(
    out: W,
    conf: &LairConf,
    state: &LairState,
    mut last_action_id: i64,
) -> Result<()> {
    let names = conf.piece_names;
    let sink_display = state
        .lands
        .get(SINK_KEY)
        .map(|l| l.display_name.clone())
        .unwrap_or_default();
    let mut w = csv::Writer::from_writer(out);
    w.write_record([
        "Source",
        "Destination",
        "City",
        "Town",
        "Explorer",
        "Dahan",
        "Action Name",
        "Action ID",
        "Parent",
        "Notes",
        "After Toplevel",
    ])?;

    let mut in_slurp: Option<&'static str> = None;
    for (depth, entry) in state.log.entries() {
        match entry.kind {
            ActionKind::Manual => {
                if let Some(row) = &entry.csv_row {
                    w.write_record(row)?;
                }
            }
            ActionKind::Comment => {
                if *depth == 0 {
                    let text = entry.text.as_deref().unwrap_or("");
                    in_slurp = if text.contains("lair-blue-thresh3") {
                        Some("lair_blue")
                    } else if text.contains("lair-orange-thresh3") {
                        Some("lair_orange")
                    } else {
                        None
                    };
                }
            }
            ActionKind::Gather => {
                let Some(checkpoint) = in_slurp else { continue };
                let mut counts = [0i32; 4]; // explorer, town, city, dahan
                for m in &entry.moves {
                    if m.src == PieceKind::Explorer.name(&names) {
                        counts[0] += m.count;
                    } else if m.src == PieceKind::Town.name(&names) {
                        counts[1] += m.count;
                    } else if m.src == PieceKind::City.name(&names) {
                        counts[2] += m.count;
                    } else if m.src == PieceKind::Dahan.name(&names) {
                        counts[3] += m.count;
                    }
                }
                last_action_id += 1;
                let destination = entry
                    .tgt_land
                    .as_deref()
                    .unwrap_or("")
                    .replace(&sink_display, "LAIRL");
                let row = ManualAction {
                    source_key: entry.src_land.clone().unwrap_or_default(),
                    destination_key: destination,
                    cities: csv_count(counts[2]),
                    towns: csv_count(counts[1]),
                    explorers: csv_count(counts[0]),
                    dahan: csv_count(counts[3]),
                    action_name: "Manual gather".to_string(),
                    action_id: last_action_id.to_string(),
                    parent_action: String::new(),
                    notes: format!(
                        "generated by --output actions-csv: {} gathers",
                        entry.total_count()
                    ),
                    after_toplevel: checkpoint.to_string(),
                };
                w.write_record(row.csv_row())?;
            }
            _ => {}
        }
    }
    w.flush()?;
    Ok(())
}
