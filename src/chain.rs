//! Splitting one input line into chained sub-commands.
//!
//! A line such as `make && ./run || echo failed; ls` is consumed one sub-command at a
//! time. The delimiter that ends a sub-command decides, together with the status of
//! the sub-command that just ran, whether the next one runs at all.

use crate::command::ExitCode;

/// How the upcoming sub-command is chained to the previous one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChainMode {
    /// Not chained; the line is exhausted.
    #[default]
    None,
    /// `&&`: run only if the previous status is 0.
    And,
    /// `||`: run only if the previous status is non-zero.
    Or,
    /// `;`: always run.
    Sequence,
}

impl ChainMode {
    /// Whether a sub-command chained with this mode is skipped given the previous status.
    pub fn skips(self, last_status: ExitCode) -> bool {
        match self {
            ChainMode::And => last_status != 0,
            ChainMode::Or => last_status == 0,
            ChainMode::None | ChainMode::Sequence => false,
        }
    }
}

/// One sub-command handed out by the [`ChainSplitter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubCommand {
    /// Text of the sub-command. Empty when it was short-circuited.
    pub text: String,
    /// Mode set by the delimiter that ended this sub-command.
    pub mode: ChainMode,
}

/// Stateful cursor over the current input line.
#[derive(Debug, Default)]
pub struct ChainSplitter {
    buffer: String,
    cursor: usize,
    mode: ChainMode,
    pending: bool,
}

impl ChainSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start splitting a fresh line.
    pub fn load(&mut self, line: impl Into<String>) {
        self.buffer = line.into();
        self.cursor = 0;
        self.mode = ChainMode::None;
        self.pending = true;
    }

    /// Whether sub-commands remain in the current line.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Mode recorded by the last delimiter consumed.
    pub fn mode(&self) -> ChainMode {
        self.mode
    }

    /// Hand out the next sub-command, or `None` once the line is exhausted.
    ///
    /// A sub-command that the pending mode short-circuits comes back with empty
    /// text, so running it is a no-op that leaves `last_status` untouched.
    pub fn next_subcommand(&mut self, last_status: ExitCode) -> Option<SubCommand> {
        if !self.pending {
            return None;
        }

        let skipped = self.mode.skips(last_status);
        let bytes = self.buffer.as_bytes();
        let start = self.cursor;
        let mut found = None;
        let mut i = start;
        while i < bytes.len() {
            match (bytes[i], bytes.get(i + 1)) {
                (b'&', Some(b'&')) => {
                    found = Some((i, 2, ChainMode::And));
                    break;
                }
                (b'|', Some(b'|')) => {
                    found = Some((i, 2, ChainMode::Or));
                    break;
                }
                (b';', _) => {
                    found = Some((i, 1, ChainMode::Sequence));
                    break;
                }
                _ => i += 1,
            }
        }

        let (end, next, mode) = match found {
            Some((at, width, mode)) => (at, at + width, mode),
            None => (bytes.len(), bytes.len(), ChainMode::None),
        };
        let text = if skipped {
            String::new()
        } else {
            self.buffer[start..end].to_owned()
        };
        log::trace!("chain: {:?} after {:?} (skipped: {skipped})", mode, self.mode);

        if next >= self.buffer.len() {
            self.reset();
        } else {
            self.cursor = next;
            self.mode = mode;
        }
        Some(SubCommand { text, mode })
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
        self.mode = ChainMode::None;
        self.pending = false;
    }
}

/// Cut a line at the first `#` that starts the line or follows a space.
pub fn strip_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'#' && (i == 0 || bytes[i - 1] == b' ') {
            return &line[..i];
        }
    }
    line
}
