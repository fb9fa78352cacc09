use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use lairsim::loader::{LoadOptions, Scenario};
use lairsim::render::{self, DiffOptions};
use lairsim::search::{self, SeqResult};
use lairsim::split::Splitter;
use lairsim_core::systems::Phase;
use lairsim_core::{score, LairState, SINK_KEY};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Output {
    /// Full action log as markdown bullets
    Log,
    /// Per-land before/after diff
    Diff,
    /// Flat spreadsheet ledger of sink transactions
    Ledger,
    /// Reconstruct slurp gathers as manual-ledger CSV rows
    ActionsCsv,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scenario directory (input.json, board.json, start.csv, ...)
    #[arg(long, default_value = "scenarios/turn0")]
    scenario: PathBuf,

    /// What to print for each displayed result
    #[arg(long, value_enum)]
    output: Option<Output>,

    /// Write the output to DIRECTORY, split into message-sized chunks
    #[arg(long, value_name = "DIRECTORY")]
    split: Option<PathBuf>,

    /// Append a marker to each split file header
    #[arg(long)]
    split_header: Option<String>,

    /// Show only log/diff lines mentioning this text
    #[arg(long, default_value = "")]
    filter: String,

    /// Don't display the per-result summary line
    #[arg(long)]
    no_summary: bool,

    /// Display post-ravage state instead of pre-ravage
    #[arg(long)]
    postravage: bool,

    /// Show unchanged lands in the diff view too
    #[arg(long)]
    diff_all: bool,

    /// Display the N best orderings
    #[arg(long, default_value_t = 1, value_name = "N")]
    best: usize,

    /// Number of search worker threads
    #[arg(long, default_value_t = 32)]
    workers: usize,

    /// Force a specific ordering instead of searching
    #[arg(long, num_args = 1.., value_name = "ACTION")]
    force_line: Vec<String>,

    /// Sort the diff view by hop distance rather than by land name
    #[arg(long)]
    diff_sort_range: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = std::str::FromStr::from_str(&args.log_level).unwrap_or(log::LevelFilter::Warn);
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();

    let opts = LoadOptions {
        server_emojis: args.split.is_some(),
        log_prestart: matches!(args.output, Some(Output::Ledger) | Some(Output::ActionsCsv)),
        display_name_range: args.output != Some(Output::ActionsCsv),
    };
    let scenario = Scenario::load(&args.scenario, opts)
        .with_context(|| format!("loading scenario {}", args.scenario.display()))?;

    let seqs: Vec<Vec<Phase>> = if args.force_line.is_empty() {
        let mut actions = scenario.actions.clone();
        actions.push(Phase::LairBlue);
        actions.push(Phase::LairOrange);
        search::distinct_permutations(&actions)
    } else {
        let mut seq = Vec::new();
        for name in &args.force_line {
            seq.push(name.parse::<Phase>()?);
        }
        vec![seq]
    };

    rayon::ThreadPoolBuilder::new()
        .num_threads(args.workers)
        .build_global()
        .context("initializing worker pool")?;
    let results = search::search(&scenario, &seqs);
    if results.is_empty() {
        anyhow::bail!("every phase ordering failed; see the log");
    }

    let force_no_summary = args.output == Some(Output::ActionsCsv);
    let best = results.len().saturating_sub(args.best);
    for result in &results[best..] {
        let state = if args.postravage {
            &result.postravage
        } else {
            &result.preravage
        };
        if !args.no_summary && !force_no_summary {
            print_summary(&scenario, result, state);
        }
        match args.output {
            None => {}
            Some(Output::Log) => {
                let log = render::render_log(state, &args.filter);
                print_or_split(&args, state, &log, false)?;
            }
            Some(Output::Diff) => {
                // Diff against a fresh pre-run state
                let (orig, _) = scenario.build()?;
                let diff = render::diff_view(
                    &scenario.conf,
                    &orig.state,
                    state,
                    &DiffOptions {
                        filter: &args.filter,
                        show_all: args.diff_all,
                        sort_by_range: args.diff_sort_range,
                    },
                );
                print_or_split(&args, state, &diff, true)?;
            }
            Some(Output::Ledger) => {
                let initial = scenario
                    .initial_sink()
                    .context("scenario has no sink land")?;
                render::write_ledger(std::io::stdout(), &scenario.conf, initial, state)?;
            }
            Some(Output::ActionsCsv) => {
                let (_, delayed) = scenario.build()?;
                render::write_actions_csv(
                    std::io::stdout(),
                    &scenario.conf,
                    state,
                    delayed.max_action_id,
                )?;
            }
        }
    }
    Ok(())
}

fn print_summary(scenario: &Scenario, result: &SeqResult, state: &LairState) {
    let sink = match state.lands.get(SINK_KEY) {
        Some(sink) => sink.describe(&scenario.conf.piece_names),
        None => return,
    };
    println!(
        "{:<58} ({}) wasted_damage={} total_gathers={} wasted_invader_gathers={} wasted_dahan_gathers={} wasted_downgrades={} fear={} score={:?}",
        format!("{:?}", search::phase_names(&result.seq)),
        sink,
        state.wasted_damage,
        state.total_gathers,
        state.wasted_invader_gathers,
        state.wasted_dahan_gathers,
        state.wasted_downgrades,
        state.fear,
        score(&scenario.conf, state),
    );
}

fn print_or_split(
    args: &Args,
    state: &LairState,
    raw: &str,
    force_commit_on_toplevel: bool,
) -> Result<()> {
    match &args.split {
        Some(directory) => {
            let suffix = args
                .split_header
                .as_deref()
                .map(|h| format!(" {h}"))
                .unwrap_or_default();
            let prefix = state
                .lands
                .get(SINK_KEY)
                .map(|l| l.display_name.clone())
                .unwrap_or_default();
            Splitter::new(force_commit_on_toplevel).run(raw, directory, &prefix, &suffix)?;
        }
        None => println!("{raw}"),
    }
    Ok(())
}
