use indexmap::IndexMap;
use std::fmt;

/// User-defined replacements for the first word of a command.
#[derive(Debug, Clone, Default)]
pub struct Aliases {
    entries: IndexMap<String, String>,
}

impl Aliases {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Define or redefine an alias. A redefined alias moves to the end of the list.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.entries.shift_remove(&name);
        self.entries.insert(name, value.into());
    }

    pub fn unset(&mut self, name: &str) -> bool {
        self.entries.shift_remove(name).is_some()
    }

    /// Apply a `name=value` definition. An empty value removes the alias.
    ///
    /// Returns `false` when `definition` has no `=`.
    pub fn define(&mut self, definition: &str) -> bool {
        let Some((name, value)) = definition.split_once('=') else {
            return false;
        };
        let value = strip_quotes(value);
        if value.is_empty() {
            self.unset(name);
        } else {
            self.set(name, value);
        }
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = AliasEntry<'_>> {
        self.entries
            .iter()
            .map(|(name, value)| AliasEntry { name, value })
    }

    pub fn entry(&self, name: &str) -> Option<AliasEntry<'_>> {
        self.entries
            .get_key_value(name)
            .map(|(name, value)| AliasEntry { name, value })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// An alias displayed as `name='value'`.
#[derive(Debug, Clone, Copy)]
pub struct AliasEntry<'a> {
    pub name: &'a str,
    pub value: &'a str,
}

impl fmt::Display for AliasEntry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}='{}'", self.name, self.value)
    }
}

fn strip_quotes(value: &str) -> &str {
    for quote in ['\'', '"'] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_set_and_replace() {
        let mut aliases = Aliases::new();
        assert!(aliases.define("ll=ls"));
        assert!(aliases.define("la=ls"));
        assert!(aliases.define("ll='/bin/ls'"));

        assert_eq!(aliases.get("ll"), Some("/bin/ls"));
        let shown: Vec<String> = aliases.iter().map(|a| a.to_string()).collect();
        assert_eq!(shown, ["la='ls'", "ll='/bin/ls'"]);
    }

    #[test]
    fn empty_value_removes() {
        let mut aliases = Aliases::new();
        aliases.set("x", "y");
        assert!(aliases.define("x="));
        assert!(aliases.is_empty());
    }

    #[test]
    fn definition_without_equals_is_rejected() {
        let mut aliases = Aliases::new();
        assert!(!aliases.define("ll"));
        assert!(aliases.entry("ll").is_none());
    }

    #[test]
    fn double_quotes_are_stripped_too() {
        let mut aliases = Aliases::new();
        aliases.define("g=\"grep\"");
        assert_eq!(aliases.entry("g").map(|e| e.to_string()), Some("g='grep'".into()));
    }
}
