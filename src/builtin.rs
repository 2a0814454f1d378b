use crate::command::{BuiltinOutcome, CommandFactory, EXIT_FAILURE, ExecutableCommand, ExitCode};
use crate::error::ShellError;
use crate::interpreter::Factory;
use crate::session::Session;
use anyhow::{Context, Result, anyhow, bail};
use argh::{EarlyExit, FromArgs};
use regex::Regex;
use std::env;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::LazyLock;

static VARIABLE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("variable name pattern is valid")
});

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process against the [`Session`], without spawning a child process.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "exit" or "cd".
    fn name() -> &'static str;

    /// Executes the command, writing any regular output to `stdout`.
    ///
    /// Errors are reported by the caller, which records the status they map to.
    fn execute(self, stdout: &mut dyn Write, session: &mut Session) -> Result<BuiltinOutcome>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        session: &mut Session,
    ) -> Result<BuiltinOutcome> {
        log::trace!("builtin {}", T::name());
        T::execute(*self, stdout, session)
    }
}

struct InvalidArgs {
    output: String,
    is_error: bool,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        _session: &mut Session,
    ) -> Result<BuiltinOutcome> {
        if self.is_error {
            return Err(ShellError::Usage(self.output.trim_end().to_owned()).into());
        }
        stdout.write_all(self.output.as_bytes())?;
        Ok(BuiltinOutcome::Success)
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn name(&self) -> &'static str {
        T::name()
    }

    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>> {
        if name != T::name() {
            return None;
        }
        // Everything but a lone `--help` is positional, so `cd -` and `exit -1` reach the builtin.
        let parsed = if args == ["--help"] {
            T::from_args(&[name], args)
        } else {
            let mut positional = Vec::with_capacity(args.len() + 1);
            positional.push("--");
            positional.extend_from_slice(args);
            T::from_args(&[name], &positional)
        };
        Some(match parsed {
            Ok(cmd) => Box::new(cmd),
            Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                output,
                is_error: status.is_err(),
            }),
        })
    }

    fn usage(&self) -> String {
        match T::from_args(&[T::name()], &["--help"]) {
            Ok(_) => String::new(),
            Err(EarlyExit { output, .. }) => output,
        }
    }
}

/// The fixed table of builtins.
pub(crate) fn builtin_table() -> Vec<Box<dyn CommandFactory>> {
    vec![
        Box::new(Factory::<Cd>::default()),
        Box::new(Factory::<Exit>::default()),
        Box::new(Factory::<Env>::default()),
        Box::new(Factory::<SetEnv>::default()),
        Box::new(Factory::<UnsetEnv>::default()),
        Box::new(Factory::<Alias>::default()),
        Box::new(Factory::<History>::default()),
        Box::new(Factory::<Help>::default()),
    ]
}

/// Matches command names against the builtin table.
pub struct Builtins {
    table: Vec<Box<dyn CommandFactory>>,
}

impl Default for Builtins {
    fn default() -> Self {
        Self {
            table: builtin_table(),
        }
    }
}

impl Builtins {
    /// Run the session's current command if it names a builtin.
    ///
    /// Yields [`BuiltinOutcome::NotBuiltin`] for any other name, including an empty command.
    pub fn dispatch(&self, session: &mut Session, stdout: &mut dyn Write) -> Result<BuiltinOutcome> {
        let argv = session.command().argv().to_vec();
        let Some((name, args)) = argv.split_first() else {
            return Ok(BuiltinOutcome::NotBuiltin);
        };
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        for factory in &self.table {
            if let Some(cmd) = factory.try_create(name, &args) {
                return cmd.execute(stdout, session);
            }
        }
        Ok(BuiltinOutcome::NotBuiltin)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.table.iter().map(|factory| factory.name())
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
/// Without a target, changes to $HOME (or $PWD, or /). `cd -` returns to $OLDPWD.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute, relative to the current directory, or `-`.
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self, stdout: &mut dyn Write, session: &mut Session) -> Result<BuiltinOutcome> {
        let vars = &mut session.env;
        let previous = vars.current_dir.clone();
        let non_empty = |key: &str| vars.get_var(key).filter(|v| !v.is_empty()).map(PathBuf::from);

        let (target, announce) = match self.target.as_deref() {
            None | Some("") => {
                let home = non_empty("HOME")
                    .or_else(|| non_empty("PWD"))
                    .unwrap_or_else(|| PathBuf::from("/"));
                (home, false)
            }
            Some("-") => match non_empty("OLDPWD") {
                Some(old) => (old, true),
                None => {
                    writeln!(stdout, "{}", previous.display())?;
                    return Ok(BuiltinOutcome::Failure(EXIT_FAILURE));
                }
            },
            Some(dir) => (PathBuf::from(dir), false),
        };

        let shown = target.display().to_string();
        let new_dir = if target.is_absolute() {
            target
        } else {
            previous.join(target)
        };
        let canonical = fs::canonicalize(&new_dir)
            .and_then(|dir| env::set_current_dir(&dir).map(|_| dir))
            .map_err(|source| ShellError::ChangeDir {
                path: shown,
                source,
            })?;

        if announce {
            writeln!(stdout, "{}", canonical.display())?;
        }
        vars.set_var("OLDPWD", previous.display().to_string());
        vars.set_var("PWD", canonical.display().to_string());
        vars.current_dir = canonical;
        Ok(BuiltinOutcome::Success)
    }
}

#[derive(FromArgs)]
/// Exit the shell with the given status, or with the status of the last command.
pub struct Exit {
    #[argh(positional)]
    /// exit status; a non-negative integer.
    pub status: Option<String>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(self, _stdout: &mut dyn Write, session: &mut Session) -> Result<BuiltinOutcome> {
        match self.status {
            None => Ok(BuiltinOutcome::ExitRequested(session.status())),
            Some(arg) => match parse_status(&arg) {
                Some(code) => Ok(BuiltinOutcome::ExitRequested(code)),
                None => Err(ShellError::IllegalNumber(arg).into()),
            },
        }
    }
}

/// Parse an optionally `+`-prefixed decimal that fits an [`ExitCode`].
fn parse_status(text: &str) -> Option<ExitCode> {
    let digits = text.strip_prefix('+').unwrap_or(text);
    if digits.is_empty() {
        return None;
    }
    let mut value: ExitCode = 0;
    for b in digits.bytes() {
        if !b.is_ascii_digit() {
            return None;
        }
        value = value.checked_mul(10)?.checked_add(ExitCode::from(b - b'0'))?;
    }
    Some(value)
}

#[derive(FromArgs)]
/// Print the environment, one `NAME=value` per line.
pub struct Env {}

impl BuiltinCommand for Env {
    fn name() -> &'static str {
        "env"
    }

    fn execute(self, stdout: &mut dyn Write, session: &mut Session) -> Result<BuiltinOutcome> {
        for entry in session.env.entries() {
            writeln!(stdout, "{entry}").context("failed to print environment")?;
        }
        Ok(BuiltinOutcome::Success)
    }
}

#[derive(FromArgs)]
/// Set an environment variable, creating it if needed.
pub struct SetEnv {
    #[argh(positional)]
    /// variable name.
    pub name: String,

    #[argh(positional)]
    /// new value.
    pub value: String,
}

impl BuiltinCommand for SetEnv {
    fn name() -> &'static str {
        "setenv"
    }

    fn execute(self, _stdout: &mut dyn Write, session: &mut Session) -> Result<BuiltinOutcome> {
        if !VARIABLE_NAME.is_match(&self.name) {
            return Err(ShellError::InvalidName(self.name).into());
        }
        session.env.set_var(self.name, self.value);
        Ok(BuiltinOutcome::Success)
    }
}

#[derive(FromArgs)]
/// Remove environment variables.
pub struct UnsetEnv {
    #[argh(positional)]
    /// names of the variables to remove.
    pub names: Vec<String>,
}

impl BuiltinCommand for UnsetEnv {
    fn name() -> &'static str {
        "unsetenv"
    }

    fn execute(self, _stdout: &mut dyn Write, session: &mut Session) -> Result<BuiltinOutcome> {
        if self.names.is_empty() {
            return Err(ShellError::Usage("Too few arguments.".to_owned()).into());
        }
        for name in &self.names {
            session.env.unset_var(name);
        }
        Ok(BuiltinOutcome::Success)
    }
}

#[derive(FromArgs)]
/// Define or print aliases.
/// Without arguments, prints every alias as name='value'.
pub struct Alias {
    #[argh(positional)]
    /// definitions as `name=value` (an empty value removes it), or a `name` to print.
    pub definitions: Vec<String>,
}

impl BuiltinCommand for Alias {
    fn name() -> &'static str {
        "alias"
    }

    fn execute(self, stdout: &mut dyn Write, session: &mut Session) -> Result<BuiltinOutcome> {
        if self.definitions.is_empty() {
            for alias in session.aliases.iter() {
                writeln!(stdout, "{alias}")?;
            }
            return Ok(BuiltinOutcome::Success);
        }

        let mut missing = Vec::new();
        for arg in &self.definitions {
            if session.aliases.define(arg) {
                continue;
            }
            match session.aliases.entry(arg) {
                Some(alias) => writeln!(stdout, "{alias}")?,
                None => missing.push(arg.as_str()),
            }
        }
        if !missing.is_empty() {
            bail!("{} not found", missing.join(" "));
        }
        Ok(BuiltinOutcome::Success)
    }
}

#[derive(FromArgs)]
/// List the command history with its line numbers.
pub struct History {}

impl BuiltinCommand for History {
    fn name() -> &'static str {
        "history"
    }

    fn execute(self, stdout: &mut dyn Write, session: &mut Session) -> Result<BuiltinOutcome> {
        for entry in session.history.iter() {
            writeln!(stdout, "{entry}").context("failed to print history")?;
        }
        Ok(BuiltinOutcome::Success)
    }
}

#[derive(FromArgs)]
/// Show the builtin commands, or the usage of one of them.
pub struct Help {
    #[argh(positional)]
    /// builtin to describe.
    pub topic: Option<String>,
}

impl BuiltinCommand for Help {
    fn name() -> &'static str {
        "help"
    }

    fn execute(self, stdout: &mut dyn Write, _session: &mut Session) -> Result<BuiltinOutcome> {
        let table = builtin_table();
        match self.topic {
            None => {
                let mut names: Vec<&str> = table.iter().map(|factory| factory.name()).collect();
                names.sort_unstable();
                writeln!(stdout, "Builtin commands:")?;
                writeln!(stdout, "  {}", names.join("  "))?;
                writeln!(stdout, "Type `help NAME` for details.")?;
            }
            Some(topic) => {
                let factory = table
                    .iter()
                    .find(|factory| factory.name() == topic)
                    .ok_or_else(|| anyhow!("no help topics match `{topic}`"))?;
                write!(stdout, "{}", factory.usage())?;
            }
        }
        Ok(BuiltinOutcome::Success)
    }
}
