use crate::builtin::Builtins;
use crate::chain::strip_comment;
use crate::command::{BuiltinOutcome, ExitCode, Stdout};
use crate::config::ShellConfig;
use crate::env::Environment;
use crate::error::{ShellError, exit_code_of, format_error};
use crate::external::ExternalCommand;
use crate::history::History;
use crate::resolve::{is_regular_file, resolve};
use crate::session::Session;
use anyhow::{Context, Result};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use signal_hook::consts::SIGINT;
use std::fmt::Display;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

const PROMPT: &str = "$ ";

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports the builtins defined in this crate.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// Where command lines come from.
enum Input {
    /// A terminal, read through a line editor that prints the prompt.
    Editor(DefaultEditor),
    /// A script or pipe; no prompt.
    Reader(Box<dyn BufRead>),
}

impl Input {
    /// Next line without its terminator, or `None` at end of input.
    fn next_line(&mut self) -> Result<Option<String>> {
        match self {
            Input::Editor(editor) => loop {
                match editor.readline(PROMPT) {
                    Ok(line) => {
                        if !line.trim().is_empty() {
                            editor.add_history_entry(line.as_str())?;
                        }
                        return Ok(Some(line));
                    }
                    // Abandon the pending line and prompt again.
                    Err(ReadlineError::Interrupted) => continue,
                    Err(ReadlineError::Eof) => return Ok(None),
                    Err(err) => return Err(err.into()),
                }
            },
            Input::Reader(reader) => {
                let mut raw = Vec::new();
                if reader.read_until(b'\n', &mut raw)? == 0 {
                    return Ok(None);
                }
                let line = String::from_utf8_lossy(&raw);
                Ok(Some(line.trim_end_matches(['\n', '\r']).to_owned()))
            }
        }
    }
}

/// The read / chain / dispatch loop of one shell invocation.
///
/// Each input line has its comment stripped, is recorded in the history and is then
/// split into chained sub-commands. Every sub-command goes through alias and variable
/// substitution, then the builtin table, then path resolution and a child process.
/// Errors are printed as `<program>: <line>: <command>: <message>` and turned into
/// the status the next sub-command sees as `$?`.
///
/// Example
/// ```
/// use simple_shell::{Environment, Interpreter, MemWriter, ShellConfig};
/// let mut config = ShellConfig::default();
/// config.persist_history = false;
/// let (out, _captured) = MemWriter::with_handle();
/// let mut sh = Interpreter::with_output(
///     config,
///     Environment::from_pairs([("GREETING", "hi")]),
///     Box::new(out),
///     Box::new(std::io::sink()),
/// );
/// let code = sh.run_reader(std::io::Cursor::new("alias\nexit 3\n")).unwrap();
/// assert_eq!(code, 3);
/// ```
pub struct Interpreter {
    session: Session,
    builtins: Builtins,
    stdout: Box<dyn Stdout>,
    stderr: Box<dyn Write>,
    config: ShellConfig,
    interrupted: Arc<AtomicBool>,
}

impl Interpreter {
    /// An interpreter writing to the process's standard output and error.
    pub fn new(config: ShellConfig, env: Environment) -> Self {
        Self::with_output(config, env, Box::new(io::stdout()), Box::new(io::stderr()))
    }

    /// An interpreter writing to the given sinks.
    pub fn with_output(
        config: ShellConfig,
        env: Environment,
        stdout: Box<dyn Stdout>,
        stderr: Box<dyn Write>,
    ) -> Self {
        let mut session = Session::new(env);
        session.history = History::with_limit(config.history_limit);
        Self {
            session,
            builtins: Builtins::default(),
            stdout,
            stderr,
            config,
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Read commands from the terminal with line editing and a `$ ` prompt.
    ///
    /// Returns the status to exit with: the `exit` argument, or 0 at end of input.
    pub fn run_interactive(&mut self) -> Result<ExitCode> {
        self.session.interactive = true;
        signal_hook::flag::register(SIGINT, Arc::clone(&self.interrupted))
            .context("failed to install interrupt handler")?;
        log::debug!("starting interactive session");

        self.load_history();
        let mut editor = DefaultEditor::new()?;
        for entry in self.session.history.iter() {
            editor.add_history_entry(entry.line.as_str())?;
        }
        self.run(Input::Editor(editor))
    }

    /// Read commands from a script or pipe without prompting.
    ///
    /// Returns the status to exit with: the `exit` argument, or the last status at end of input.
    pub fn run_reader(&mut self, reader: impl BufRead + 'static) -> Result<ExitCode> {
        self.session.interactive = false;
        log::debug!("starting non-interactive session");

        self.load_history();
        self.run(Input::Reader(Box::new(reader)))
    }

    fn run(&mut self, mut input: Input) -> Result<ExitCode> {
        let outcome = self.read_eval_loop(&mut input);
        self.teardown();
        outcome
    }

    fn read_eval_loop(&mut self, input: &mut Input) -> Result<ExitCode> {
        loop {
            let Some(line) = input.next_line()? else {
                if self.session.interactive {
                    writeln!(self.stdout)?;
                    return Ok(0);
                }
                return Ok(self.session.status);
            };
            if let Some(code) = self.execute_line(&line)? {
                return Ok(code);
            }
            if self.interrupted.swap(false, Ordering::Relaxed) {
                log::debug!("interrupt delivered while a command ran");
            }
        }
    }

    /// Run every sub-command of one input line.
    ///
    /// Returns `Some(status)` as soon as `exit` runs; the rest of the line is dropped.
    pub fn execute_line(&mut self, line: &str) -> Result<Option<ExitCode>> {
        self.session.line_count += 1;
        let line = strip_comment(line);
        self.session.history.push(line);
        self.session.chain.load(line);

        while let Some(sub) = self.session.chain.next_subcommand(self.session.status) {
            let requested = self.execute_subcommand(&sub.text);
            self.session.clear_command();
            if let Some(code) = requested? {
                return Ok(Some(code));
            }
        }
        Ok(None)
    }

    fn execute_subcommand(&mut self, text: &str) -> Result<Option<ExitCode>> {
        self.session.load_command(text);
        self.session.substitute_alias();
        self.session.substitute_variables();
        // Short-circuited and blank sub-commands leave the status alone.
        if self.session.command().name().is_none_or(str::is_empty) {
            return Ok(None);
        }

        match self.builtins.dispatch(&mut self.session, &mut self.stdout) {
            Ok(BuiltinOutcome::NotBuiltin) => {}
            Ok(BuiltinOutcome::ExitRequested(code)) => {
                self.session.status = code;
                return Ok(Some(code));
            }
            Ok(outcome) => {
                if let Some(status) = outcome.status() {
                    self.session.status = status;
                }
                return Ok(None);
            }
            Err(err) => {
                self.report(&err);
                self.session.status = exit_code_of(&err);
                return Ok(None);
            }
        }

        self.session.status = match self.run_external() {
            Ok(code) => code,
            Err(err) => {
                self.report(&err);
                err.exit_code()
            }
        };
        Ok(None)
    }

    fn run_external(&mut self) -> Result<ExitCode, ShellError> {
        let session = &self.session;
        let name = session.command().name().unwrap_or_default();
        let search_path = session.env.get_var("PATH");

        let local = session.env.current_dir.join(name);
        let path = match resolve(search_path, name) {
            Some(path) => path.into_owned(),
            None if (session.interactive || search_path.is_some() || name.starts_with('/'))
                && is_regular_file(&local) =>
            {
                local
            }
            None => return Err(ShellError::NotFound),
        };

        self.session.path = Some(path.clone());
        ExternalCommand::new(&path, self.session.command().argv())
            .run(&self.session.env, self.stdout.as_mut())
    }

    fn report(&mut self, message: &dyn Display) {
        let line = format_error(
            &self.config.program_name,
            self.session.line_count,
            self.session.command().name().unwrap_or_default(),
            &message.to_string(),
        );
        if let Err(e) = self.stdout.flush().and_then(|_| writeln!(self.stderr, "{line}")) {
            log::warn!("failed to report error: {e}");
        }
    }

    fn load_history(&mut self) {
        let Some(path) = self.config.history_path(&self.session.env) else {
            return;
        };
        if let Err(e) = self.session.history.load(&path) {
            log::warn!("failed to load history from {}: {e}", path.display());
        }
    }

    fn teardown(&mut self) {
        if let Some(path) = self.config.history_path(&self.session.env) {
            if let Err(e) = self.session.history.save(&path) {
                log::warn!("failed to save history to {}: {e}", path.display());
            }
        }
        if let Err(e) = self.stdout.flush().and_then(|_| self.stderr.flush()) {
            log::warn!("failed to flush output: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io_adapters::MemWriter;
    use std::cell::RefCell;
    use std::fs;
    use std::io::Cursor;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;
    use std::rc::Rc;

    struct Run {
        code: ExitCode,
        stdout: String,
        stderr: String,
        interpreter: Interpreter,
    }

    fn shell(config: ShellConfig) -> (Interpreter, Rc<RefCell<Vec<u8>>>, Rc<RefCell<Vec<u8>>>) {
        let mut env = Environment::from_pairs([("PATH", "/bin:/usr/bin")]);
        env.current_dir = PathBuf::from("/");
        let (out, out_handle) = MemWriter::with_handle();
        let (err, err_handle) = MemWriter::with_handle();
        let interpreter = Interpreter::with_output(config, env, Box::new(out), Box::new(err));
        (interpreter, out_handle, err_handle)
    }

    fn run_script(script: &str) -> Run {
        let mut config = ShellConfig::for_program("hsh");
        config.persist_history = false;
        let (mut interpreter, out, err) = shell(config);
        let code = interpreter
            .run_reader(Cursor::new(script.to_owned()))
            .expect("script runs");
        let stdout = String::from_utf8(out.borrow().clone()).expect("utf8");
        let stderr = String::from_utf8(err.borrow().clone()).expect("utf8");
        Run {
            code,
            stdout,
            stderr,
            interpreter,
        }
    }

    #[test]
    fn and_chain_runs_both() {
        let run = run_script("echo hello && echo world\n");
        assert_eq!(run.stdout, "hello\nworld\n");
        assert_eq!(run.code, 0);
    }

    #[test]
    fn or_after_failed_and_runs() {
        let run = run_script("false && echo no || echo yes\n");
        assert_eq!(run.stdout, "yes\n");
    }

    #[test]
    fn and_skips_until_sequence() {
        let run = run_script("false && echo a && echo b; echo c\n");
        assert_eq!(run.stdout, "c\n");
    }

    #[test]
    fn or_skipped_after_success() {
        let run = run_script("true || echo no; echo $?\n");
        assert_eq!(run.stdout, "0\n");
    }

    #[test]
    fn status_is_visible_across_sequence() {
        let run = run_script("false; echo $?\n");
        assert_eq!(run.stdout, "1\n");
        assert_eq!(run.code, 0);
    }

    #[test]
    fn end_of_input_exits_with_last_status() {
        let run = run_script("true\nfalse\n");
        assert_eq!(run.code, 1);
    }

    #[test]
    fn exit_stops_the_script() {
        let run = run_script("echo before\nexit 42\necho after\n");
        assert_eq!(run.code, 42);
        assert_eq!(run.stdout, "before\n");
    }

    #[test]
    fn exit_mid_line_drops_the_rest() {
        let run = run_script("exit 5; echo never\n");
        assert_eq!(run.code, 5);
        assert_eq!(run.stdout, "");
    }

    #[test]
    fn illegal_exit_number_is_reported() {
        let run = run_script("exit abc; echo $?\n");
        assert_eq!(run.stdout, "2\n");
        assert_eq!(run.stderr, "hsh: 1: exit: Illegal number: abc\n");
        assert_eq!(run.code, 0);
    }

    #[test]
    fn unknown_command_is_not_found() {
        let run = run_script("\n\nno_such_command_for_shell_test; echo $?\n");
        assert_eq!(run.stdout, "127\n");
        assert_eq!(run.stderr, "hsh: 3: no_such_command_for_shell_test: not found\n");
    }

    #[test]
    fn missing_path_reports_not_found() {
        let mut config = ShellConfig::for_program("hsh");
        config.persist_history = false;
        let (mut interpreter, _, err) = shell(config);
        interpreter.session_mut().env.unset_var("PATH");
        let code = interpreter.run_reader(Cursor::new("ls\n")).unwrap();
        assert_eq!(code, 127);
        assert_eq!(String::from_utf8(err.borrow().clone()).unwrap(), "hsh: 1: ls: not found\n");
    }

    #[test]
    fn absolute_paths_run_without_search() {
        let run = run_script("/bin/sh -c exit\n");
        assert_eq!(run.code, 0);
    }

    #[test]
    fn aliases_and_variables_are_substituted() {
        // An unset variable still leaves an empty argument behind.
        let run = run_script("alias say=echo\nsetenv WHO world\nsay hello $WHO $MISSING\n");
        assert_eq!(run.stdout, "hello world \n");
    }

    #[test]
    fn cyclic_alias_terminates() {
        let run = run_script("alias a=b\nalias b=a\na; echo $?\n");
        assert_eq!(run.stdout, "127\n");
        assert!(run.stderr.ends_with(": not found\n"));
    }

    #[test]
    fn comments_are_stripped() {
        let run = run_script("# full line\necho hi # trailing\necho a#b\n");
        assert_eq!(run.stdout, "hi\na#b\n");
    }

    #[test]
    fn history_records_stripped_non_blank_lines() {
        let run = run_script("echo one # note\n\nhistory\n");
        assert_eq!(run.stdout, "one\n0: echo one \n1: history\n");
        assert_eq!(run.interpreter.session().history.len(), 2);
    }

    #[test]
    fn builtin_failures_set_status() {
        let run = run_script("cd -; echo $?\nunsetenv; echo $?\n");
        assert!(run.stdout.ends_with("1\n1\n"));
        assert_eq!(run.stderr, "hsh: 2: unsetenv: Too few arguments.\n");
    }

    #[test]
    fn trailing_delimiter_ends_the_line() {
        let run = run_script("echo a;\necho b &&\n");
        assert_eq!(run.stdout, "a\nb\n");
    }

    #[test]
    fn unset_variable_alone_keeps_status() {
        let run = run_script("true\n$UNSET_FOR_SHELL_TEST; echo $?\nfalse\n$UNSET_FOR_SHELL_TEST\n");
        assert_eq!(run.stdout, "0\n");
        assert_eq!(run.stderr, "");
        assert_eq!(run.code, 1);
    }

    #[test]
    fn invalid_utf8_line_does_not_stop_the_shell() {
        let mut config = ShellConfig::for_program("hsh");
        config.persist_history = false;
        let (mut interpreter, out, _) = shell(config);
        let script: Vec<u8> = b"echo one\necho \xff\xfe\necho two\n".to_vec();
        let code = interpreter.run_reader(Cursor::new(script)).unwrap();

        let stdout = String::from_utf8_lossy(&out.borrow()).into_owned();
        assert_eq!(code, 0);
        assert!(stdout.starts_with("one\n"));
        assert!(stdout.ends_with("two\n"));
        assert_eq!(stdout.lines().count(), 3);
    }

    #[test]
    fn bare_name_runs_file_in_session_directory() {
        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("local_tool_for_shell_test");
        fs::write(&tool, "#!/bin/sh\necho local\n").unwrap();
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();

        let mut config = ShellConfig::for_program("hsh");
        config.persist_history = false;
        let (mut interpreter, out, err) = shell(config);
        interpreter.session_mut().env.current_dir = fs::canonicalize(dir.path()).unwrap();
        let code = interpreter
            .run_reader(Cursor::new("local_tool_for_shell_test\n"))
            .unwrap();

        assert_eq!(String::from_utf8(err.borrow().clone()).unwrap(), "");
        assert_eq!(code, 0);
        assert_eq!(
            String::from_utf8(out.borrow().clone()).unwrap(),
            "local\n"
        );
    }

    #[test]
    fn history_is_persisted_at_exit() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("hist");
        fs::write(&file, "old command\n").unwrap();

        let mut config = ShellConfig::for_program("hsh");
        config.history_file = Some(file.clone());
        let (mut interpreter, out, _) = shell(config);
        interpreter.run_reader(Cursor::new("history\n")).unwrap();

        assert_eq!(
            String::from_utf8(out.borrow().clone()).unwrap(),
            "0: old command\n1: history\n"
        );
        assert_eq!(fs::read_to_string(&file).unwrap(), "old command\nhistory\n");
    }
}
