use indexmap::IndexMap;
use std::env as stdenv;
use std::fmt;
use std::path::PathBuf;

/// Mutable, user-level view of the process environment used by the shell.
///
/// The environment contains:
/// - `vars`: variables visible to `$NAME` substitution and to executed commands,
///   kept in insertion order so `env` prints them the way they were defined.
/// - `current_dir`: the working directory for command execution.
///
/// This store is authoritative: child processes receive exactly these variables.
#[derive(Debug, Clone)]
pub struct Environment {
    vars: IndexMap<String, String>,
    /// The current working directory for command execution.
    pub current_dir: PathBuf,
}

impl Environment {
    /// Capture the current process state into a new `Environment` instance.
    ///
    /// This copies variables from `std::env::vars_os()` and initializes `current_dir`
    /// from `std::env::current_dir()`.
    pub fn from_process() -> Self {
        let vars = stdenv::vars_os()
            .map(|(k, v)| {
                (
                    k.to_string_lossy().into_owned(),
                    v.to_string_lossy().into_owned(),
                )
            })
            .collect();
        Self {
            vars,
            current_dir: current_dir(),
        }
    }

    /// An environment holding only the given variables.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            current_dir: current_dir(),
        }
    }

    /// Get the value of an environment variable.
    pub fn get_var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Set or override an environment variable. A new name goes to the end.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// Remove a variable, keeping the order of the rest. Returns whether it existed.
    pub fn unset_var(&mut self, key: &str) -> bool {
        self.vars.shift_remove(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Entries in `name=value` form, in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = Entry<'_>> {
        self.iter().map(|(name, value)| Entry { name, value })
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// A variable displayed as `name=value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry<'a> {
    pub name: &'a str,
    pub value: &'a str,
}

impl fmt::Display for Entry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

fn current_dir() -> PathBuf {
    stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use crate::env::Environment;

    #[test]
    fn test_env_set_and_get_var() {
        let mut env = Environment::from_pairs(Vec::<(String, String)>::new());

        // initially absent
        assert_eq!(env.get_var("SOME_RANDOM_ENV_VAR_12345"), None);

        env.set_var("KEY", "VALUE");

        assert_eq!(env.get_var("KEY"), Some("VALUE"));
    }

    #[test]
    fn test_env_reads_from_process_env() {
        let env = Environment::from_process();
        assert!(env.get_var("PATH").is_some());
    }

    #[test]
    fn overwrite_keeps_position_and_unset_keeps_order() {
        let mut env = Environment::from_pairs([("A", "1"), ("B", "2"), ("C", "3")]);
        env.set_var("A", "10");
        assert!(env.unset_var("B"));
        assert!(!env.unset_var("B"));

        let listed: Vec<String> = env.entries().map(|e| e.to_string()).collect();
        assert_eq!(listed, ["A=10", "C=3"]);
        assert_eq!(env.len(), 2);
    }

    #[test]
    fn value_may_contain_equals() {
        let mut env = Environment::from_pairs([("X", "a=b")]);
        assert_eq!(env.get_var("X"), Some("a=b"));
        env.set_var("Y", "");
        assert_eq!(env.get_var("Y"), Some(""));
    }
}
