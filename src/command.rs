use crate::session::Session;
use anyhow::Result;
use std::io::Write;
use std::process::Stdio;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line tools.
pub type ExitCode = i32;

/// Generic failure.
pub const EXIT_FAILURE: ExitCode = 1;
/// Illegal argument to `exit`.
pub const EXIT_ILLEGAL_NUMBER: ExitCode = 2;
/// A resolved path could not be executed.
pub const EXIT_PERMISSION_DENIED: ExitCode = 126;
/// Command or file not found.
pub const EXIT_NOT_FOUND: ExitCode = 127;

/// One command of a chain: the command name followed by its arguments.
///
/// Produced fresh for each sub-command and dropped once it has been dispatched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Command {
    argv: Vec<String>,
}

impl Command {
    /// Split raw command text on blanks and tabs. No quoting is recognised.
    pub fn parse(text: &str) -> Self {
        let argv = text
            .split([' ', '\t'])
            .filter(|word| !word.is_empty())
            .map(str::to_owned)
            .collect();
        Self { argv }
    }

    /// The command name, if there is one.
    pub fn name(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }

    pub fn args(&self) -> &[String] {
        self.argv.get(1..).unwrap_or(&[])
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn argv_mut(&mut self) -> &mut [String] {
        &mut self.argv
    }

    pub fn is_empty(&self) -> bool {
        self.argv.is_empty()
    }
}

/// Result of handing a command to the builtin dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinOutcome {
    /// No builtin carries this name; resolve it on the search path instead.
    NotBuiltin,
    Success,
    /// The builtin ran and failed with the given status.
    Failure(ExitCode),
    /// The shell should terminate with the given status.
    ExitRequested(ExitCode),
}

impl BuiltinOutcome {
    /// Status recorded in the session once the builtin has run.
    pub fn status(self) -> Option<ExitCode> {
        match self {
            BuiltinOutcome::NotBuiltin => None,
            BuiltinOutcome::Success => Some(0),
            BuiltinOutcome::Failure(code) | BuiltinOutcome::ExitRequested(code) => Some(code),
        }
    }
}

/// Abstraction over the shell's standard output.
///
/// Builtins write into it directly. External commands either get a [`Stdio`] handle
/// for it or, when it has none, have their output piped back and copied into it.
pub trait Stdout: Write {
    /// Handle to give a child process, or `None` if child output must be copied through.
    fn stdio(&self) -> Option<Stdio>;
}

impl Stdout for std::io::Stdout {
    fn stdio(&self) -> Option<Stdio> {
        Some(Stdio::inherit())
    }
}

/// Object-safe trait for a builtin ready to run against the session.
pub trait ExecutableCommand {
    /// Executes the command.
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        session: &mut Session,
    ) -> Result<BuiltinOutcome>;
}

/// Factory that tries to create a command from a name and its arguments.
///
/// Returns `None` when the factory doesn't recognize the `name`.
pub trait CommandFactory {
    /// Name the factory answers to.
    fn name(&self) -> &'static str;

    /// Attempt to create a command instance for the provided name and arguments.
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>>;

    /// Generated usage text of the command.
    fn usage(&self) -> String;
}
