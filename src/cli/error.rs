//! CLI-level errors (wraps domain and settings errors)

use std::path::PathBuf;

use thiserror::Error;

use crate::config::SettingsError;
use crate::domain::BuildError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Build(#[from] BuildError),

    #[error("{0}")]
    Settings(#[from] SettingsError),

    #[error("cannot read {}: {source}", .path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write output: {0}")]
    Output(#[source] std::io::Error),

    #[error("invalid record input: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) => crate::exitcode::USAGE,
            CliError::Build(BuildError::Config { .. }) => crate::exitcode::CONFIG,
            CliError::Build(_) | CliError::Json(_) => crate::exitcode::DATAERR,
            CliError::Settings(_) => crate::exitcode::CONFIG,
            CliError::Input { .. } => crate::exitcode::NOINPUT,
            CliError::Output(_) => crate::exitcode::IOERR,
        }
    }
}
