//! Replay scripts: a JSON list of intake requests and raw clicks.
//!
//! ```json
//! {
//!   "steps": [
//!     { "op": "intake" },
//!     { "op": "click", "x": 140, "y": 300 },
//!     { "op": "click", "x": 140, "y": 300, "button": "secondary" }
//!   ]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tierboard_layout::{BoardClick, PointerButton};

use crate::error::{BoardCliError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScriptStep {
    /// Draw the next item into staging.
    Intake,
    /// Click at board pixel coordinates.
    Click {
        x: u32,
        y: u32,
        #[serde(default = "primary")]
        button: PointerButton,
    },
    /// Drop any pending selection.
    Cancel,
}

fn primary() -> PointerButton {
    PointerButton::Primary
}

impl ScriptStep {
    #[must_use]
    pub fn as_click(&self) -> Option<BoardClick> {
        match *self {
            Self::Click { x, y, button } => Some(BoardClick { x, y, button }),
            Self::Intake | Self::Cancel => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayScript {
    pub steps: Vec<ScriptStep>,
}

impl ReplayScript {
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(BoardCliError::MissingPath {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }
}
