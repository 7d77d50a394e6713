use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use tierboard_layout::{
    BoardClick, BoardSession, DEFAULT_CELL_SIZE, IntakeOutcome, QueueItemSource, SelectionConfig,
    SelectionEffect, SessionError,
};

use crate::error::{BoardCliError, Result};
use crate::script::{ReplayScript, ScriptStep};
use crate::summary::BoardSummary;
use crate::templates::load_catalog;

#[derive(Debug, Clone, Args)]
pub struct ReplayArgs {
    /// Template id from the catalog.
    #[arg(long)]
    pub template: String,

    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Item titles fed to intake, in order. Repeatable.
    #[arg(long = "item")]
    pub items: Vec<String>,

    /// JSON replay script.
    #[arg(long)]
    pub script: PathBuf,

    /// Write the final board snapshot here.
    #[arg(long)]
    pub save: Option<PathBuf>,

    #[arg(long = "cell-size", default_value_t = DEFAULT_CELL_SIZE)]
    pub cell_size: u32,

    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplayCounters {
    pub steps: usize,
    pub staged: usize,
    pub refused_intake: usize,
    pub selections: usize,
    pub moves: usize,
    pub discards: usize,
    pub cancels: usize,
    pub noops: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub counters: ReplayCounters,
    pub board: BoardSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_to: Option<String>,
}

/// Run a script against a fresh session.
pub fn replay(args: &ReplayArgs) -> Result<ReplayReport> {
    if args.cell_size == 0 {
        return Err(BoardCliError::invalid("--cell-size must be > 0"));
    }
    let catalog = load_catalog(args.catalog.as_deref())?;
    let script = ReplayScript::from_path(&args.script)?;
    let mut session = BoardSession::from_catalog(
        &catalog,
        &args.template,
        SelectionConfig {
            cell_size: args.cell_size,
        },
    )?;
    let mut source: QueueItemSource = args.items.iter().map(String::as_str).collect();
    session.set_remaining(args.items.len());

    let mut counters = ReplayCounters::default();
    for (index, step) in script.steps.iter().enumerate() {
        let step_no = index + 1;
        counters.steps += 1;
        apply_step(&mut session, &mut source, &mut counters, step)
            .map_err(|err| script_error(step_no, err))?;
    }

    let saved_to = match &args.save {
        Some(path) => {
            session.save_to_path(path)?;
            Some(path.display().to_string())
        }
        None => None,
    };

    let snapshot = session.export_state();
    Ok(ReplayReport {
        counters,
        board: BoardSummary::from_snapshot(&snapshot, Some(session.template())),
        saved_to,
    })
}

fn apply_step(
    session: &mut BoardSession,
    source: &mut QueueItemSource,
    counters: &mut ReplayCounters,
    step: &ScriptStep,
) -> std::result::Result<(), SessionError> {
    match *step {
        ScriptStep::Intake => match session.draw_next(source)? {
            IntakeOutcome::Staged { .. } => counters.staged += 1,
            outcome => {
                tracing::debug!(?outcome, "intake refused");
                counters.refused_intake += 1;
            }
        },
        ScriptStep::Click { x, y, button } => {
            let transition = session.click(BoardClick { x, y, button })?;
            match transition.effect {
                SelectionEffect::Selected { .. } => counters.selections += 1,
                SelectionEffect::Moved { .. } => counters.moves += 1,
                SelectionEffect::Discarded { .. } => counters.discards += 1,
                SelectionEffect::Canceled { .. } => counters.cancels += 1,
                SelectionEffect::Noop { .. } => counters.noops += 1,
            }
        }
        ScriptStep::Cancel => {
            if session.cancel_selection().is_some() {
                counters.cancels += 1;
            }
        }
    }
    Ok(())
}

fn script_error(step: usize, err: SessionError) -> BoardCliError {
    BoardCliError::ScriptStep {
        step,
        message: err.to_string(),
    }
}

pub fn run_replay(args: ReplayArgs) -> Result<()> {
    let report = replay(&args)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    let c = &report.counters;
    println!(
        "steps={} staged={} refused_intake={} selections={} moves={} discards={} cancels={} noops={}",
        c.steps, c.staged, c.refused_intake, c.selections, c.moves, c.discards, c.cancels, c.noops
    );
    print!("{}", report.board.render_text());
    if let Some(path) = &report.saved_to {
        println!("saved {path}");
    }
    Ok(())
}
