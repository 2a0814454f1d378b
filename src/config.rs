use crate::env::Environment;
use crate::history::{HISTORY_FILE_NAME, HISTORY_LIMIT};
use argh::FromArgs;
use std::path::PathBuf;

#[derive(FromArgs, Debug)]
/// A small command-line shell with `;`, `&&` and `||` chaining, aliases and
/// `$VAR` substitution.
pub struct Args {
    #[argh(positional)]
    /// script file to read commands from instead of standard input.
    pub script: Option<PathBuf>,
}

/// Settings fixed for the lifetime of one shell.
#[derive(Debug, Clone)]
pub struct ShellConfig {
    /// Name the shell was invoked as; first field of every error line.
    pub program_name: String,
    /// History file to use instead of `$HOME/.simple_shell_history`.
    pub history_file: Option<PathBuf>,
    /// Maximum number of history entries kept.
    pub history_limit: usize,
    /// Whether history is loaded at startup and written at exit.
    pub persist_history: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            program_name: env!("CARGO_PKG_NAME").to_owned(),
            history_file: None,
            history_limit: HISTORY_LIMIT,
            persist_history: true,
        }
    }
}

impl ShellConfig {
    /// Configuration for a shell invoked as `program_name`.
    pub fn for_program(program_name: impl Into<String>) -> Self {
        Self {
            program_name: program_name.into(),
            ..Self::default()
        }
    }

    /// Location of the history file: the override, else under `HOME` from the
    /// session environment, else under the platform home directory.
    pub fn history_path(&self, env: &Environment) -> Option<PathBuf> {
        if !self.persist_history {
            return None;
        }
        if let Some(path) = &self.history_file {
            return Some(path.clone());
        }
        env.get_var("HOME")
            .filter(|home| !home.is_empty())
            .map(PathBuf::from)
            .or_else(dirs::home_dir)
            .map(|home| home.join(HISTORY_FILE_NAME))
    }
}
