use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GuardianError {
    #[error("Countermeasure media unavailable: {0}")]
    MediaUnavailable(PathBuf),

    #[error("Launch failed: {0}")]
    Launch(String),

    #[error("Terminate failed: {0}")]
    Terminate(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, GuardianError>;
