//! Alias and variable substitution on a tokenized command.

use crate::alias::Aliases;
use crate::command::{Command, ExitCode};
use crate::env::Environment;

/// Maximum number of alias hops applied to one command.
pub const ALIAS_HOP_LIMIT: usize = 10;

/// Replace the command name by its alias, following alias-of-alias chains.
///
/// Stops silently after [`ALIAS_HOP_LIMIT`] hops, so a cyclic alias leaves whatever
/// name the last hop produced. Returns whether any replacement happened.
pub fn substitute_alias(aliases: &Aliases, command: &mut Command) -> bool {
    let Some(name) = command.argv_mut().first_mut() else {
        return false;
    };
    let mut hops = 0;
    while hops < ALIAS_HOP_LIMIT {
        let Some(value) = aliases.get(name) else {
            break;
        };
        log::trace!("alias: {name} -> {value}");
        *name = value.to_owned();
        hops += 1;
    }
    hops > 0
}

/// Rewrite `$?`, `$$` and `$NAME` tokens. Whole tokens only.
///
/// An unknown `NAME` becomes the empty string. A lone `$` is left as is.
pub fn substitute_variables(
    env: &Environment,
    last_status: ExitCode,
    pid: u32,
    command: &mut Command,
) {
    for token in command.argv_mut() {
        let Some(name) = token.strip_prefix('$') else {
            continue;
        };
        if name.is_empty() {
            continue;
        }
        let value = match name {
            "?" => last_status.to_string(),
            "$" => pid.to_string(),
            name => env.get_var(name).unwrap_or_default().to_owned(),
        };
        *token = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aliases(defs: &[(&str, &str)]) -> Aliases {
        let mut aliases = Aliases::new();
        for (name, value) in defs {
            aliases.set(*name, *value);
        }
        aliases
    }

    #[test]
    fn alias_chain_is_followed() {
        let aliases = aliases(&[("l", "ll"), ("ll", "ls")]);
        let mut cmd = Command::parse("l -a");
        assert!(substitute_alias(&aliases, &mut cmd));
        assert_eq!(cmd.argv(), ["ls", "-a"]);
    }

    #[test]
    fn only_the_command_name_is_replaced() {
        let aliases = aliases(&[("ll", "ls")]);
        let mut cmd = Command::parse("echo ll");
        assert!(!substitute_alias(&aliases, &mut cmd));
        assert_eq!(cmd.argv(), ["echo", "ll"]);
    }

    #[test]
    fn self_referential_alias_terminates() {
        let aliases = aliases(&[("ll", "ll")]);
        let mut cmd = Command::parse("ll");
        assert!(substitute_alias(&aliases, &mut cmd));
        assert_eq!(cmd.name(), Some("ll"));
    }

    #[test]
    fn cycle_stops_after_the_hop_limit() {
        // a -> b -> a ...; ten hops from `a` land back on `a`.
        let aliases = aliases(&[("a", "b"), ("b", "a")]);
        let mut cmd = Command::parse("a");
        assert!(substitute_alias(&aliases, &mut cmd));
        assert_eq!(cmd.name(), Some("a"));
    }

    #[test]
    fn empty_command_is_untouched() {
        let aliases = aliases(&[("ll", "ls")]);
        let mut cmd = Command::parse("");
        assert!(!substitute_alias(&aliases, &mut cmd));
    }

    #[test]
    fn variables() {
        let env = Environment::from_pairs([("HOME", "/home/me"), ("EMPTY", "")]);
        let mut cmd = Command::parse("echo $? $$ $HOME $MISSING $ a$HOME $EMPTY");
        substitute_variables(&env, 7, 4242, &mut cmd);
        assert_eq!(
            cmd.argv(),
            ["echo", "7", "4242", "/home/me", "", "$", "a$HOME", ""]
        );
    }
}
