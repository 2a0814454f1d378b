//! Errors reported by the shell and the exit statuses they map to.

use crate::command::{
    EXIT_FAILURE, EXIT_ILLEGAL_NUMBER, EXIT_NOT_FOUND, EXIT_PERMISSION_DENIED, ExitCode,
};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShellError {
    /// The command name resolved to nothing executable.
    #[error("not found")]
    NotFound,

    /// A resolved path exists but may not be executed.
    #[error("Permission denied")]
    PermissionDenied,

    /// Argument to `exit` is not a non-negative integer in range.
    #[error("Illegal number: {0}")]
    IllegalNumber(String),

    /// Wrong arguments to a builtin.
    #[error("{0}")]
    Usage(String),

    /// Malformed variable name.
    #[error("invalid variable name: {0}")]
    InvalidName(String),

    #[error("can't cd to {path}")]
    ChangeDir {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Replacing the child image failed for a reason other than permissions.
    #[error("cannot execute: {0}")]
    Exec(#[source] io::Error),

    /// The process could not be created at all.
    #[error("cannot create process: {0}")]
    Spawn(#[source] io::Error),

    /// The startup script could not be opened.
    #[error("Can't open {}", path.display())]
    CantOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ShellError {
    /// Status the shell records after reporting this error.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            ShellError::NotFound => EXIT_NOT_FOUND,
            ShellError::PermissionDenied => EXIT_PERMISSION_DENIED,
            ShellError::IllegalNumber(_) => EXIT_ILLEGAL_NUMBER,
            ShellError::CantOpen { source, .. } => match source.kind() {
                io::ErrorKind::PermissionDenied => EXIT_PERMISSION_DENIED,
                io::ErrorKind::NotFound => EXIT_NOT_FOUND,
                _ => EXIT_FAILURE,
            },
            ShellError::Usage(_)
            | ShellError::InvalidName(_)
            | ShellError::ChangeDir { .. }
            | ShellError::Exec(_)
            | ShellError::Spawn(_)
            | ShellError::Io(_) => EXIT_FAILURE,
        }
    }
}

/// Exit status for any error reaching the command loop.
pub fn exit_code_of(err: &anyhow::Error) -> ExitCode {
    err.downcast_ref::<ShellError>()
        .map(ShellError::exit_code)
        .unwrap_or(EXIT_FAILURE)
}

/// Render an error line: `<program>: <line>: <command>: <message>`.
pub fn format_error(program: &str, line: usize, command: &str, message: &str) -> String {
    format!("{program}: {line}: {command}: {message}")
}
