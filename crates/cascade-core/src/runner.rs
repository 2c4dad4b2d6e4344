use std::path::Path;
use std::process::Command;

use tracing::{error, info};

use crate::command::CommandLine;

/// What an external command reported back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutcome {
    /// Exit code; `None` when the process never started or died from a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutcome {
    pub fn success() -> Self {
        Self {
            code: Some(0),
            ..Self::default()
        }
    }

    pub fn failure(code: i32) -> Self {
        Self {
            code: Some(code),
            ..Self::default()
        }
    }

    pub fn with_stdout(mut self, stdout: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Executes external commands on behalf of the workflow.
///
/// Implementations never fail: a command that cannot be started or exits
/// non-zero is reported through [`CommandOutcome`] and the caller decides
/// whether that is fatal.
pub trait CommandRunner {
    /// Runs `cmd` in `cwd` with captured output.
    fn run(&self, cmd: &CommandLine, cwd: &Path) -> CommandOutcome;

    /// Runs `cmd` in `cwd` attached to the operator's terminal.
    fn run_interactive(&self, cmd: &CommandLine, cwd: &Path) -> CommandOutcome;

    /// Whether commands are only being logged.
    fn is_dry_run(&self) -> bool {
        false
    }
}

/// Runs commands as child processes of the current process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner {
    dry_run: bool,
}

impl ProcessRunner {
    pub fn live() -> Self {
        Self { dry_run: false }
    }

    pub fn dry_run() -> Self {
        Self { dry_run: true }
    }

    fn command(cmd: &CommandLine, cwd: &Path) -> Command {
        let mut command = Command::new(&cmd.program);
        command.args(&cmd.args).envs(&cmd.env).current_dir(cwd);
        command
    }

    fn skip(cmd: &CommandLine, cwd: &Path) -> CommandOutcome {
        info!(target: "cascade", "dry-run: would run `{}` in {}", cmd, cwd.display());
        CommandOutcome::success()
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, cmd: &CommandLine, cwd: &Path) -> CommandOutcome {
        if self.dry_run {
            return Self::skip(cmd, cwd);
        }

        let output = match Self::command(cmd, cwd).output() {
            Ok(output) => output,
            Err(e) => {
                error!(target: "cascade", "failed to start `{}` in {}: {}", cmd, cwd.display(), e);
                return CommandOutcome {
                    code: None,
                    stdout: String::new(),
                    stderr: e.to_string(),
                };
            }
        };

        let outcome = CommandOutcome {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !outcome.is_success() {
            error!(target: "cascade",
                "`{}` failed with status {}: {}",
                cmd,
                output.status,
                outcome.stderr.trim()
            );
        }

        outcome
    }

    fn run_interactive(&self, cmd: &CommandLine, cwd: &Path) -> CommandOutcome {
        if self.dry_run {
            return Self::skip(cmd, cwd);
        }

        match Self::command(cmd, cwd).status() {
            Ok(status) => CommandOutcome {
                code: status.code(),
                ..CommandOutcome::default()
            },
            Err(e) => {
                error!(target: "cascade", "failed to start `{}` in {}: {}", cmd, cwd.display(), e);
                CommandOutcome {
                    code: None,
                    stdout: String::new(),
                    stderr: e.to_string(),
                }
            }
        }
    }

    fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}
