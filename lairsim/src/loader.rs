//! Scenario loading: a scenario directory holds the board graph, the
//! starting counts, the run configuration and the manual ledger.
//!
//! Files:
//! - `input.json`: phase list, terrain priority, faction innates, rules
//! - `initial_lair.json`: sink counts and the board land it sits on
//! - `board.json`: land adjacency, terrains, coastal flags, weave edges
//! - `start.csv`: per-land starting counts (key,cities,towns,explorers,dahan)
//! - `actions.csv`: the manual ledger

use anyhow::{bail, Context, Result};
use lairsim_core::manual::{DelayedActions, ManualAction};
use lairsim_core::systems::Phase;
use lairsim_core::{
    ActionLog, Engine, ForcePolicy, InnateConf, LairConf, Land, LandKey, SimError,
    PIECE_NAMES_EMOJI, PIECE_NAMES_TEXT, SINK_KEY,
};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    /// Render piece and land names as server emoji tags.
    pub server_emojis: bool,
    /// Log manual actions applied before the run starts.
    pub log_prestart: bool,
    /// Annotate land display names with their hop distance.
    pub display_name_range: bool,
}

#[derive(Debug, Deserialize)]
struct InputFile {
    #[serde(default)]
    actions: Vec<String>,
    #[serde(default)]
    terrain_priority: String,
    #[serde(default)]
    blue_lair: Option<InnateConf>,
    #[serde(default)]
    orange_lair: Option<InnateConf>,
    #[serde(default)]
    leave_behind: HashMap<String, HashMap<String, i32>>,
    #[serde(default)]
    ignore_lands: Vec<String>,
    #[serde(default)]
    priority_lands: Vec<String>,
    /// Compare hop distance before terrain rank; defaults to true.
    #[serde(default)]
    distance_first: Option<bool>,
    #[serde(default)]
    force_policy: Option<ForcePolicy>,
    #[serde(default)]
    allow_missing: bool,
}

#[derive(Debug, Deserialize)]
struct InitialLair {
    land: String,
    #[serde(default)]
    explorers: i32,
    #[serde(default)]
    towns: i32,
    #[serde(default)]
    cities: i32,
    #[serde(default)]
    dahan: i32,
}

#[derive(Debug, Deserialize)]
struct BoardLand {
    terrain: char,
    #[serde(default)]
    coastal: bool,
    #[serde(default)]
    adjacent: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct BoardFile {
    lands: HashMap<String, BoardLand>,
    /// Extra zero-cost edges from in-game merge effects.
    #[serde(default)]
    weaves: Vec<(String, String)>,
}

#[derive(Debug, Deserialize)]
struct StartRow {
    key: String,
    #[serde(default)]
    cities: Option<i32>,
    #[serde(default)]
    towns: Option<i32>,
    #[serde(default)]
    explorers: Option<i32>,
    #[serde(default)]
    dahan: Option<i32>,
}

struct BoardGraph {
    edges: FxHashMap<String, Vec<(String, u32)>>,
}

impl BoardGraph {
    fn new(board: &BoardFile) -> Self {
        let mut edges: FxHashMap<String, Vec<(String, u32)>> = FxHashMap::default();
        for (key, land) in &board.lands {
            for next in &land.adjacent {
                edges.entry(key.clone()).or_default().push((next.clone(), 1));
                edges.entry(next.clone()).or_default().push((key.clone(), 1));
            }
        }
        for (a, b) in &board.weaves {
            edges.entry(a.clone()).or_default().push((b.clone(), 0));
            edges.entry(b.clone()).or_default().push((a.clone(), 0));
        }
        Self { edges }
    }
}

impl land_routing::Graph<String> for BoardGraph {
    fn neighbors(&self, node: &String) -> Vec<(String, u32)> {
        self.edges.get(node).cloned().unwrap_or_default()
    }
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

fn land_display_name(key: &str, terrain: char, server_emojis: bool) -> String {
    if server_emojis {
        if let Some(name) = terrain_emoji_name(terrain) {
            return format!("{key}:Land{name}:");
        }
    }
    format!("{key}{terrain}")
}

/// Everything loaded from disk, enough to build a fresh engine per
/// search worker. Workers never share mutable state.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub conf: LairConf,
    pub actions: Vec<Phase>,
    pub server_emojis: bool,
    pub log_prestart: bool,
    lands: FxHashMap<LandKey, Land>,
    dist: FxHashMap<LandKey, u32>,
    parent: FxHashMap<LandKey, LandKey>,
    manual_rows: Vec<ManualAction>,
}

impl Scenario {
    pub fn load(dir: &Path, opts: LoadOptions) -> Result<Scenario> {
        let input: InputFile = read_json(&dir.join("input.json"))?;
        let initial: InitialLair = read_json(&dir.join("initial_lair.json"))?;
        let board: BoardFile = read_json(&dir.join("board.json"))?;

        let mut actions = Vec::new();
        for name in &input.actions {
            actions.push(name.parse::<Phase>()?);
        }

        let conf = LairConf {
            terrain_priority: input.terrain_priority,
            blue: input.blue_lair.unwrap_or_default(),
            orange: input.orange_lair.unwrap_or_default(),
            leave_behind: input.leave_behind,
            ignore_lands: input.ignore_lands,
            priority_lands: input.priority_lands,
            piece_names: if opts.server_emojis {
                PIECE_NAMES_EMOJI
            } else {
                PIECE_NAMES_TEXT
            },
            display_name_range: opts.display_name_range,
            allow_missing: input.allow_missing,
            distance_first: input.distance_first.unwrap_or(true),
            force_policy: input.force_policy.unwrap_or_default(),
        };

        let sink_display = if opts.server_emojis {
            ":IncarnaAspectLair:".to_string()
        } else {
            "lair".to_string()
        };
        let mut lands: FxHashMap<LandKey, Land> = FxHashMap::default();
        lands.insert(
            SINK_KEY.to_string(),
            Land::new(
                SINK_KEY,
                sink_display,
                'L',
                initial.explorers,
                initial.towns,
                initial.cities,
                initial.dahan,
            ),
        );

        let start_path = dir.join("start.csv");
        let mut reader = csv::Reader::from_path(&start_path)
            .with_context(|| format!("reading {}", start_path.display()))?;
        for row in reader.deserialize() {
            let row: StartRow = row?;
            let Some(meta) = board.lands.get(&row.key) else {
                bail!("start.csv references unknown land {}", row.key);
            };
            let display = land_display_name(&row.key, meta.terrain, opts.server_emojis);
            let mut land = Land::new(
                row.key.clone(),
                display,
                meta.terrain,
                row.explorers.unwrap_or(0),
                row.towns.unwrap_or(0),
                row.cities.unwrap_or(0),
                row.dahan.unwrap_or(0),
            );
            land.coastal = meta.coastal;
            lands.insert(row.key, land);
        }

        if !board.lands.contains_key(&initial.land) {
            bail!("initial_lair.json names unknown land {}", initial.land);
        }
        let (dist, parent) = build_distance_tree(&conf, &lands, &board, &initial.land);

        let actions_path = dir.join("actions.csv");
        let mut manual_rows = Vec::new();
        let mut reader = csv::Reader::from_path(&actions_path)
            .with_context(|| format!("reading {}", actions_path.display()))?;
        for row in reader.deserialize() {
            manual_rows.push(row?);
        }

        Ok(Scenario {
            conf,
            actions,
            server_emojis: opts.server_emojis,
            log_prestart: opts.log_prestart,
            lands,
            dist,
            parent,
            manual_rows,
        })
    }

    /// A fresh engine and ledger, with the silent pre-start checkpoint
    /// already applied.
    pub fn build(&self) -> Result<(Engine, DelayedActions), SimError> {
        let mut engine = Engine::new(
            self.lands.clone(),
            self.dist.clone(),
            self.parent.clone(),
            self.conf.clone(),
            ActionLog::new(),
        )?;
        let mut delayed = DelayedActions::new(self.server_emojis);
        for row in &self.manual_rows {
            delayed.push(row.clone());
        }
        delayed.run(&mut engine.state, &engine.conf, "", self.log_prestart)?;
        Ok((engine, delayed))
    }

    /// The initial sink, before any manual action fires.
    pub fn initial_sink(&self) -> Option<&Land> {
        self.lands.get(SINK_KEY)
    }
}

/// Grow the distance tree from the sink's board land. The tie-break
/// prefers parents that avoid ignored lands, then lands the clear
/// priority cares least about, then less defended distance-1 branches.
fn build_distance_tree(
    conf: &LairConf,
    lands: &FxHashMap<LandKey, Land>,
    board: &BoardFile,
    src: &str,
) -> (FxHashMap<LandKey, u32>, FxHashMap<LandKey, LandKey>) {
    let graph = BoardGraph::new(board);
    let (dist, parent) = land_routing::distances_from(
        &graph,
        src.to_string(),
        |node: &String,
         dist: &HashMap<String, u32>,
         parent: &HashMap<String, String>|
         -> (bool, i64, i32) {
            let (terrain, coastal) = board
                .lands
                .get(node)
                .map(|l| (l.terrain, l.coastal))
                .unwrap_or(('?', false));
            let rank = conf.land_rank(None, terrain, coastal) as i64;

            // Defender count of the distance-1 land this route enters.
            let mut key = node;
            while dist.get(key).copied().unwrap_or(0) > 1 {
                match parent.get(key) {
                    Some(p) => key = p,
                    None => break,
                }
            }
            let near_dahan = if dist.get(key).copied() == Some(1) {
                lands.get(key).map(|l| l.dahan).unwrap_or(0)
            } else {
                0
            };

            let mut ignored = false;
            let mut cursor = node;
            while cursor != src {
                if conf.is_ignored(cursor) {
                    ignored = true;
                    break;
                }
                match parent.get(cursor) {
                    Some(p) => cursor = p,
                    None => break,
                }
            }

            (ignored, -rank, near_dahan)
        },
    );
    (dist.into_iter().collect(), parent.into_iter().collect())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &PathBuf) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}
