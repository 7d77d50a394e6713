use std::path::{Path, PathBuf};

use clap::Args;
use serde::Serialize;
use tierboard_layout::TemplateCatalog;

use crate::error::{BoardCliError, Result};

#[derive(Debug, Clone, Args)]
pub struct TemplatesArgs {
    /// TOML or JSON template catalog; defaults to the built-in templates.
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateListing {
    pub id: String,
    pub tier_count: usize,
    pub columns: u16,
    pub labels: Vec<String>,
}

/// Built-in catalog, or a validated catalog file.
pub fn load_catalog(path: Option<&Path>) -> Result<TemplateCatalog> {
    let Some(path) = path else {
        return Ok(TemplateCatalog::default());
    };
    if !path.exists() {
        return Err(BoardCliError::MissingPath {
            path: path.to_path_buf(),
        });
    }
    let catalog = TemplateCatalog::from_file(path)?.into_validated()?;
    tracing::debug!(
        path = %path.display(),
        templates = catalog.templates.len(),
        "template catalog loaded"
    );
    Ok(catalog)
}

#[must_use]
pub fn list_templates(catalog: &TemplateCatalog) -> Vec<TemplateListing> {
    catalog
        .templates
        .iter()
        .map(|template| TemplateListing {
            id: template.id.clone(),
            tier_count: template.tier_count(),
            columns: template.columns,
            labels: template.tiers.iter().map(|style| style.name.clone()).collect(),
        })
        .collect()
}

pub fn run_templates(args: TemplatesArgs) -> Result<()> {
    let catalog = load_catalog(args.catalog.as_deref())?;
    let listings = list_templates(&catalog);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&listings)?);
        return Ok(());
    }
    for listing in listings {
        println!(
            "{:<12} tiers={:<3} columns={:<3} {}",
            listing.id,
            listing.tier_count,
            listing.columns,
            listing.labels.join(" / ")
        );
    }
    Ok(())
}
