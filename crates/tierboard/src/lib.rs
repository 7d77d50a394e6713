#![forbid(unsafe_code)]

pub mod cli;
pub mod error;
pub mod inspect;
pub mod replay;
pub mod script;
pub mod summary;
pub mod templates;

pub use cli::run_from_env;
pub use error::{BoardCliError, Result};
