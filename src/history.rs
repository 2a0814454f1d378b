//! Command history: an indexed, bounded list of past input lines that is loaded
//! from and rewritten to a newline-delimited file.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Name of the history file inside the user's home directory.
pub const HISTORY_FILE_NAME: &str = ".simple_shell_history";
/// Default maximum number of entries kept.
pub const HISTORY_LIMIT: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub index: usize,
    pub line: String,
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.index, self.line)
    }
}

#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<HistoryEntry>,
    next_index: usize,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::with_limit(HISTORY_LIMIT)
    }
}

impl History {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            next_index: 0,
            limit,
        }
    }

    /// Record a line under the next sequential index. Blank lines are not recorded.
    pub fn push(&mut self, line: &str) {
        if line.trim().is_empty() {
            return;
        }
        self.entries.push(HistoryEntry {
            index: self.next_index,
            line: line.to_owned(),
        });
        self.next_index += 1;
        if self.entries.len() > self.limit {
            let excess = self.entries.len() - self.limit;
            self.entries.drain(..excess);
            self.renumber();
        }
    }

    /// Reassign indices sequentially from 0. Returns the entry count.
    pub fn renumber(&mut self) -> usize {
        for (index, entry) in self.entries.iter_mut().enumerate() {
            entry.index = index;
        }
        self.next_index = self.entries.len();
        self.next_index
    }

    /// Append the records of a history file. A missing file loads nothing.
    pub fn load(&mut self, path: &Path) -> io::Result<usize> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e),
        };
        let before = self.entries.len();
        for line in content.lines() {
            self.push(line);
        }
        self.renumber();
        let loaded = self.entries.len().saturating_sub(before);
        log::debug!("loaded {loaded} history entries from {}", path.display());
        Ok(loaded)
    }

    /// Rewrite the history file in full, one record per line.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let mut file = io::BufWriter::new(fs::File::create(path)?);
        for entry in &self.entries {
            writeln!(file, "{}", entry.line)?;
        }
        file.into_inner().map_err(|e| e.into_error())?.sync_all()?;
        log::debug!("saved {} history entries to {}", self.entries.len(), path.display());
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_then_load_round_trips_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(HISTORY_FILE_NAME);

        let mut history = History::default();
        for line in ["ls -l", "cd /tmp", "echo $?"] {
            history.push(line);
        }
        history.save(&path).unwrap();

        let mut reloaded = History::default();
        assert_eq!(reloaded.load(&path).unwrap(), 3);
        let entries: Vec<String> = reloaded.iter().map(|e| e.to_string()).collect();
        assert_eq!(entries, ["0: ls -l", "1: cd /tmp", "2: echo $?"]);
    }

    #[test]
    fn loading_a_missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut history = History::default();
        assert_eq!(history.load(&dir.path().join("absent")).unwrap(), 0);
        assert!(history.is_empty());
    }

    #[test]
    fn oldest_entries_are_dropped_past_the_limit() {
        let mut history = History::with_limit(2);
        history.push("a");
        history.push("b");
        history.push("c");
        let entries: Vec<&HistoryEntry> = history.iter().collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].to_string(), "0: b");
        assert_eq!(entries[1].to_string(), "1: c");

        history.push("d");
        assert_eq!(history.iter().last().map(|e| e.index), Some(1));
    }

    #[test]
    fn load_is_bounded_and_renumbered() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hist");
        fs::write(&path, "one\n\ntwo\nthree\nfour").unwrap();

        let mut history = History::with_limit(3);
        history.load(&path).unwrap();
        let lines: Vec<(usize, &str)> = history.iter().map(|e| (e.index, e.line.as_str())).collect();
        assert_eq!(lines, [(0, "two"), (1, "three"), (2, "four")]);
    }

    #[test]
    fn blank_lines_are_not_recorded() {
        let mut history = History::default();
        history.push("   ");
        history.push("");
        assert_eq!(history.len(), 0);
    }
}
