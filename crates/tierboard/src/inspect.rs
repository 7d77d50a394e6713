use std::path::PathBuf;

use clap::Args;
use tierboard_layout::{BoardSession, BoardSnapshot, SelectionConfig};

use crate::error::{BoardCliError, Result};
use crate::summary::BoardSummary;
use crate::templates::load_catalog;

#[derive(Debug, Clone, Args)]
pub struct InspectArgs {
    /// Saved board snapshot (JSON).
    pub file: PathBuf,

    /// Catalog used to resolve the saved template's labels.
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    #[arg(long)]
    pub json: bool,
}

/// Load and validate a saved board.
///
/// When the saved template is in the catalog the board is fully restored,
/// which also checks that its shape matches the template.
pub fn inspect(args: &InspectArgs) -> Result<BoardSummary> {
    if !args.file.exists() {
        return Err(BoardCliError::MissingPath {
            path: args.file.clone(),
        });
    }
    let snapshot = BoardSnapshot::read_from_path(&args.file)?;
    snapshot.validate()?;

    let catalog = load_catalog(args.catalog.as_deref())?;
    let Some(template) = catalog.get(&snapshot.template_id) else {
        tracing::warn!(
            template = %snapshot.template_id,
            "saved template is not in the catalog; labels fall back to tier numbers"
        );
        return Ok(BoardSummary::from_snapshot(&snapshot, None));
    };

    let session = BoardSession::restore(snapshot, &catalog, SelectionConfig::default())?;
    Ok(BoardSummary::from_snapshot(
        &session.export_state(),
        Some(template),
    ))
}

pub fn run_inspect(args: InspectArgs) -> Result<()> {
    let summary = inspect(&args)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", summary.render_text());
    }
    Ok(())
}
