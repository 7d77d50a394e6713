//! Board templates as data.
//!
//! A [`TemplateCatalog`] lists the boards a session can be created from. The
//! engine only needs `(tier_count, columns)` from a template; tier names,
//! scores and colors are carried for the renderer.
//!
//! # Loading
//!
//! ```toml
//! [[templates]]
//! id = "Classique"
//! columns = 20
//!
//! [[templates.tiers]]
//! name = "S"
//! color = "#DC6384"
//! ```
//!
//! ```rust,ignore
//! let catalog = TemplateCatalog::from_toml_file("boards.toml")?.into_validated()?;
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::tier_layout::{MIN_GRID_COLUMNS, MIN_TIER_COUNT};

/// Grid width shared by the built-in templates.
pub const DEFAULT_GRID_COLUMNS: u16 = 20;

/// Display style for one ranking tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierStyle {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<String>,
    /// `#rrggbb` label background.
    pub color: String,
}

impl TierStyle {
    fn new(name: &str, score: Option<&str>, color: &str) -> Self {
        Self {
            name: name.to_string(),
            score: score.map(str::to_string),
            color: color.to_string(),
        }
    }
}

/// One board template: ranking tiers, best first. The staging tier is implied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierTemplate {
    pub id: String,
    #[serde(default = "default_columns")]
    pub columns: u16,
    pub tiers: Vec<TierStyle>,
}

fn default_columns() -> u16 {
    DEFAULT_GRID_COLUMNS
}

impl TierTemplate {
    /// Ranking tiers plus the staging tier.
    #[must_use]
    pub fn tier_count(&self) -> usize {
        self.tiers.len() + 1
    }

    #[must_use]
    pub fn ranking_tiers(&self) -> usize {
        self.tiers.len()
    }

    #[must_use]
    pub fn style(&self, tier: usize) -> Option<&TierStyle> {
        self.tiers.get(tier)
    }

    fn validate_into(&self, errors: &mut Vec<String>) {
        let id = &self.id;
        if id.trim().is_empty() {
            errors.push("template id must not be empty".into());
        }
        if self.tier_count() < MIN_TIER_COUNT {
            errors.push(format!("template {id:?} needs at least one ranking tier"));
        }
        if self.columns < MIN_GRID_COLUMNS {
            errors.push(format!(
                "template {id:?} columns must be >= {MIN_GRID_COLUMNS}, got {}",
                self.columns
            ));
        }
        for (tier, style) in self.tiers.iter().enumerate() {
            if style.name.trim().is_empty() {
                errors.push(format!("template {id:?} tier {tier} has an empty name"));
            }
            if !is_hex_color(&style.color) {
                errors.push(format!(
                    "template {id:?} tier {tier} color must be #rrggbb, got {:?}",
                    style.color
                ));
            }
        }
    }
}

fn is_hex_color(value: &str) -> bool {
    value
        .strip_prefix('#')
        .is_some_and(|hex| hex.len() == 6 && hex.bytes().all(|b| b.is_ascii_hexdigit()))
}

/// Errors that can occur when loading a template catalog.
#[derive(Debug, thiserror::Error)]
pub enum TemplateConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}

/// Ordered set of templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateCatalog {
    pub templates: Vec<TierTemplate>,
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        Self {
            templates: vec![kpop(), kpop_v2(), classique(), autre()],
        }
    }
}

impl TemplateCatalog {
    /// Load from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, TemplateConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load from a TOML file on disk.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, TemplateConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, TemplateConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, TemplateConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Load by file extension: `.json` is JSON, anything else TOML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TemplateConfigError> {
        let path = path.as_ref();
        if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")) {
            Self::from_json_file(path)
        } else {
            Self::from_toml_file(path)
        }
    }

    /// Validate every template.
    ///
    /// Returns a list of validation errors. An empty list means the catalog
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.templates.is_empty() {
            errors.push("catalog must contain at least one template".into());
        }
        let mut seen = BTreeSet::new();
        for template in &self.templates {
            if !seen.insert(template.id.as_str()) {
                errors.push(format!("duplicate template id {:?}", template.id));
            }
            template.validate_into(&mut errors);
        }
        errors
    }

    /// Reject the catalog if [`validate`](Self::validate) finds anything.
    pub fn into_validated(self) -> Result<Self, TemplateConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(TemplateConfigError::Validation(errors))
        }
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&TierTemplate> {
        self.templates.iter().find(|template| template.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.templates.iter().map(|template| template.id.as_str())
    }
}

fn template(id: &str, tiers: Vec<TierStyle>) -> TierTemplate {
    TierTemplate {
        id: id.to_string(),
        columns: DEFAULT_GRID_COLUMNS,
        tiers,
    }
}

fn scored(rows: &[(&str, &str, &str)]) -> Vec<TierStyle> {
    rows.iter()
        .map(|&(name, score, color)| TierStyle::new(name, Some(score), color))
        .collect()
}

fn plain(rows: &[(&str, &str)]) -> Vec<TierStyle> {
    rows.iter()
        .map(|&(name, color)| TierStyle::new(name, None, color))
        .collect()
}

fn kpop() -> TierTemplate {
    template(
        "K-POP",
        scored(&[
            ("LÉGENDAIRE", "10", "#DC6384"),
            ("PARFAIT", "9,5", "#e06666"),
            ("ÉMOTIONNEL", "9", "#e69138"),
            ("EXCELLENT", "8,5", "#ffd966"),
            ("STANDARD", "8", "#93c47d"),
            ("DE QUALITÉ", "7,5", "#6aa84f"),
            ("AGRÉABLE", "7", "#76a5af"),
            ("BIEN", "6,5", "#3d85c6"),
            ("LIMITE", "6", "#8e7cc3"),
        ]),
    )
}

fn kpop_v2() -> TierTemplate {
    template(
        "K-POP 2.0",
        scored(&[
            ("LÉGENDAIRE", "10", "#f04357"),
            ("PARFAIT", "9,75", "#f04377"),
            ("ÉMOTIONNEL", "9,5", "#f043bc"),
            ("CHEF D'OEUVRE", "9,25", "#aa46e3"),
            ("EXCELLENT", "9", "#704fdb"),
            ("TRÈS BON", "8,75", "#3068e3"),
            ("STANDARD", "8,5", "#449fdb"),
            ("UNIQUE", "8,25", "#34d6d9"),
            ("BANGER", "8", "#34d994"),
            ("BON", "7,75", "#34d94d"),
            ("ADDICTIF", "7,5", "#73d934"),
            ("AGRÉABLE", "7", "#b3d934"),
            ("BIEN", "6,5", "#d9c334"),
            ("LIMITE", "6", "#d97c34"),
        ]),
    )
}

fn classique() -> TierTemplate {
    template(
        "Classique",
        plain(&[
            ("S", "#DC6384"),
            ("A", "#e06666"),
            ("B", "#e69138"),
            ("C", "#ffd966"),
            ("D", "#93c47d"),
        ]),
    )
}

fn autre() -> TierTemplate {
    template(
        "Autre",
        plain(&[
            ("10", "#DC6384"),
            ("9", "#e06666"),
            ("8", "#e69138"),
            ("7", "#ffd966"),
            ("6", "#93c47d"),
            ("5", "#6aa84f"),
            ("4", "#76a5af"),
            ("3", "#3d85c6"),
            ("2", "#8e7cc3"),
            ("1", "#0d8c77"),
        ]),
    )
}
