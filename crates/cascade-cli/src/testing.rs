//! Test doubles for driving the workflow without processes.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use cascade_core::config::CascadeConfig;
use cascade_core::{CommandLine, CommandOutcome, CommandRunner};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub line: String,
    pub cwd: PathBuf,
    pub interactive: bool,
}

/// Records every command and answers with scripted outcomes.
///
/// Outcomes are matched by command-line prefix. The last queued outcome for a
/// prefix is sticky; unmatched commands succeed with no output.
#[derive(Debug, Default)]
pub struct FakeRunner {
    calls: RefCell<Vec<RecordedCall>>,
    responses: RefCell<Vec<(String, VecDeque<CommandOutcome>)>>,
    dry_run: bool,
}

impl FakeRunner {
    /// A runner that reports itself as dry-run, like `ProcessRunner::dry_run`.
    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            ..Self::default()
        }
    }

    pub fn respond(&self, prefix: &str, outcome: CommandOutcome) -> &Self {
        let mut responses = self.responses.borrow_mut();
        match responses.iter_mut().find(|(p, _)| p == prefix) {
            Some((_, queue)) => queue.push_back(outcome),
            None => responses.push((prefix.to_string(), VecDeque::from([outcome]))),
        }
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|c| c.line.clone()).collect()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.line.starts_with(prefix))
            .count()
    }

    fn answer(&self, cmd: &CommandLine, cwd: &Path, interactive: bool) -> CommandOutcome {
        let line = cmd.to_string();
        self.calls.borrow_mut().push(RecordedCall {
            line: line.clone(),
            cwd: cwd.to_path_buf(),
            interactive,
        });

        let mut responses = self.responses.borrow_mut();
        let Some((_, queue)) = responses
            .iter_mut()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
        else {
            return CommandOutcome::success();
        };
        if queue.len() > 1 {
            queue.pop_front().unwrap_or_default()
        } else {
            queue.front().cloned().unwrap_or_default()
        }
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, cmd: &CommandLine, cwd: &Path) -> CommandOutcome {
        self.answer(cmd, cwd, false)
    }

    fn run_interactive(&self, cmd: &CommandLine, cwd: &Path) -> CommandOutcome {
        self.answer(cmd, cwd, true)
    }

    fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}

pub fn changed_artifacts() -> CommandOutcome {
    CommandOutcome::success().with_stdout("?? deployments/sepolia/JBController.json\n")
}

/// A config rooted in `dir` with no delays and the sample catalog.
pub fn config_in(dir: &Path) -> CascadeConfig {
    let mut cfg = CascadeConfig::from_toml(
        r#"
        [repositories."org/alpha"]

        [repositories."org/beta"]
        depends_on = ["org/alpha"]

        [repositories."org/gamma"]
        depends_on = ["org/beta"]

        [[sets]]
        name = "all"
        from = ["org/alpha"]

        [[sets]]
        name = "gamma"
        from = ["org/gamma"]
        "#,
    )
    .expect("test config should parse");

    cfg.workspace.root = dir.join("temp_repos");
    cfg.workspace.env_file = dir.join(".env");
    cfg.workflow.settle_delay_secs = 0;
    cfg.workflow.push_delay_secs = 0;
    std::fs::write(&cfg.workspace.env_file, "PRIVATE_KEY=0x01\n").expect("write env file");
    cfg
}

/// Pretends `git clone` already ran for `name`.
pub fn seed_working_copy(cfg: &CascadeConfig, name: &str, version: &str) -> PathBuf {
    let path = cfg.workspace.root.join(name);
    std::fs::create_dir_all(&path).expect("create working copy");
    std::fs::write(
        path.join(&cfg.workflow.manifest),
        format!("{{\n  \"name\": \"{name}\",\n  \"version\": \"{version}\"\n}}\n"),
    )
    .expect("write manifest");
    path
}

pub fn manifest_version(path: &Path) -> String {
    let manifest = cascade_core::VersionManifest::load(&path.join("package.json"))
        .expect("manifest should load");
    manifest.version().unwrap_or_default().to_string()
}
