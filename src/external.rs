use crate::command::{ExitCode, Stdout};
use crate::env::Environment;
use crate::error::ShellError;
use std::io::{self, Read};
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Child, ExitStatus, Stdio};

/// Lifecycle of one external command.
#[derive(Debug)]
enum ProcessState {
    Spawning,
    Running(Child),
    CollectingStatus(ExitStatus),
    Done(ExitCode),
    SpawnFailed(io::Error),
}

/// Runs a resolved executable as a child process and waits for it.
pub struct ExternalCommand<'a> {
    path: &'a Path,
    argv: &'a [String],
}

impl<'a> ExternalCommand<'a> {
    /// `argv[0]` is passed to the child as its own name; `path` is what gets executed.
    pub fn new(path: &'a Path, argv: &'a [String]) -> Self {
        Self { path, argv }
    }

    /// Run to completion with the session's environment and working directory.
    ///
    /// Child output goes straight to `stdout` when it can hand out a handle, otherwise
    /// it is piped and copied into it. Returns the child's exit status, or 128+N when
    /// killed by signal N.
    pub fn run(&self, env: &Environment, stdout: &mut dyn Stdout) -> Result<ExitCode, ShellError> {
        stdout.flush()?;
        let mut handle = stdout.stdio();
        let capture = handle.is_none();

        let mut state = ProcessState::Spawning;
        loop {
            state = match state {
                ProcessState::Spawning => {
                    let mut cmd = std::process::Command::new(self.path);
                    if let Some((name, args)) = self.argv.split_first() {
                        cmd.arg0(name).args(args);
                    }
                    let spawned = cmd
                        .env_clear()
                        .envs(env.iter())
                        .current_dir(&env.current_dir)
                        .stdin(Stdio::inherit())
                        .stdout(handle.take().unwrap_or_else(Stdio::piped))
                        .spawn();
                    match spawned {
                        Ok(child) => {
                            log::debug!("spawned {} as pid {}", self.path.display(), child.id());
                            ProcessState::Running(child)
                        }
                        Err(e) => ProcessState::SpawnFailed(e),
                    }
                }
                ProcessState::Running(mut child) => {
                    if capture {
                        if let Some(mut out) = child.stdout.take() {
                            let mut buf = Vec::new();
                            out.read_to_end(&mut buf)?;
                            stdout.write_all(&buf)?;
                        }
                    }
                    ProcessState::CollectingStatus(child.wait()?)
                }
                ProcessState::CollectingStatus(exit_status) => {
                    let code = exit_status
                        .code()
                        .unwrap_or_else(|| terminated_by_signal(exit_status));
                    log::debug!("{} exited with {code}", self.path.display());
                    ProcessState::Done(code)
                }
                ProcessState::Done(code) => return Ok(code),
                ProcessState::SpawnFailed(e) => return Err(spawn_error(e)),
            };
        }
    }
}

/// Map a failed spawn onto the shell's error taxonomy.
fn spawn_error(e: io::Error) -> ShellError {
    match e.kind() {
        io::ErrorKind::PermissionDenied => ShellError::PermissionDenied,
        io::ErrorKind::NotFound => ShellError::NotFound,
        io::ErrorKind::OutOfMemory | io::ErrorKind::WouldBlock => ShellError::Spawn(e),
        _ => ShellError::Exec(e),
    }
}

fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}
