use std::path::PathBuf;

use thiserror::Error;

use crate::input::InputError;
use crate::state_machine::Phase;

/// Exit status for operator cancellation, completed runs and exports.
pub const EXIT_OK: u8 = 0;
/// Exit status for every fatal condition.
pub const EXIT_FATAL: u8 = 1;
/// Exit status when filtering leaves nothing to type.
pub const EXIT_NO_WORK: u8 = 3;

#[derive(Debug, Error)]
pub enum ZeroEntryError {
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("No valid identifiers found.")]
    NoWork,

    #[error("Dispatch failed at item {index}/{total} ({identifier})")]
    Dispatch {
        index: usize,
        total: usize,
        identifier: String,
        #[source]
        source: InputError,
    },

    #[error("Illegal phase transition: {from} -> {to}")]
    IllegalTransition { from: Phase, to: Phase },

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ZeroEntryError {
    /// Process exit status reported to the shell for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            ZeroEntryError::NoWork => EXIT_NO_WORK,
            _ => EXIT_FATAL,
        }
    }
}
