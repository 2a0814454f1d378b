use crate::alias::Aliases;
use crate::chain::{ChainMode, ChainSplitter};
use crate::command::{Command, ExitCode};
use crate::env::Environment;
use crate::history::History;
use crate::substitute;
use std::path::PathBuf;

/// All mutable state of one shell invocation.
///
/// Owned by the single control thread; builtins receive it by mutable reference.
#[derive(Debug)]
pub struct Session {
    /// Command being executed in the current cycle.
    pub(crate) command: Command,
    /// Executable the current command resolved to.
    pub(crate) path: Option<PathBuf>,
    /// Status of the most recently completed command.
    pub(crate) status: ExitCode,
    pub(crate) chain: ChainSplitter,
    pub env: Environment,
    pub aliases: Aliases,
    pub history: History,
    /// Input lines read so far; the line number of error reports.
    pub(crate) line_count: usize,
    pub(crate) interactive: bool,
}

impl Session {
    /// A non-interactive session over the given environment.
    pub fn new(env: Environment) -> Self {
        Self {
            command: Command::default(),
            path: None,
            status: 0,
            chain: ChainSplitter::new(),
            env,
            aliases: Aliases::new(),
            history: History::default(),
            line_count: 0,
            interactive: false,
        }
    }

    pub fn status(&self) -> ExitCode {
        self.status
    }

    pub fn set_status(&mut self, status: ExitCode) {
        self.status = status;
    }

    pub fn command(&self) -> &Command {
        &self.command
    }

    pub fn chain_mode(&self) -> ChainMode {
        self.chain.mode()
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// Begin a new execution cycle with freshly split command text.
    pub(crate) fn load_command(&mut self, text: &str) {
        self.command = Command::parse(text);
        self.path = None;
    }

    /// End the cycle, discarding the command.
    pub(crate) fn clear_command(&mut self) {
        self.command = Command::default();
        self.path = None;
    }

    pub fn substitute_alias(&mut self) -> bool {
        substitute::substitute_alias(&self.aliases, &mut self.command)
    }

    pub fn substitute_variables(&mut self) {
        substitute::substitute_variables(
            &self.env,
            self.status,
            std::process::id(),
            &mut self.command,
        );
    }
}
