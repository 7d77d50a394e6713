use std::path::PathBuf;

use thiserror::Error;
use tierboard_layout::{SessionError, SnapshotError, TemplateConfigError};

pub type Result<T> = std::result::Result<T, BoardCliError>;

#[derive(Debug, Error)]
pub enum BoardCliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("template catalog error: {0}")]
    Catalog(#[from] TemplateConfigError),

    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("board error: {0}")]
    Session(#[from] SessionError),

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("required path does not exist: {path}")]
    MissingPath { path: PathBuf },

    #[error("script step {step} failed: {message}")]
    ScriptStep { step: usize, message: String },
}

impl BoardCliError {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidArgument { .. } | Self::MissingPath { .. } => 2,
            Self::Snapshot(_) | Self::Catalog(_) => 3,
            _ => 1,
        }
    }

    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}
