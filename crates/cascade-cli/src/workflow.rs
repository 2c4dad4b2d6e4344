use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use tracing::{debug, info, instrument, warn};

use cascade_core::config::CascadeConfig;
use cascade_core::workspace::{self, WorkingCopy};
use cascade_core::{CommandLine, CommandRunner, ToolStep, ToolchainRegistry, VersionManifest};
use cascade_git::GitClient;

use crate::prompt::Prompter;

/// Operator choice when a deployment produced no artifact changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactDecision {
    Retry,
    Continue,
    Exit,
}

impl ArtifactDecision {
    /// `r` retries, `c` or nothing continues, anything else exits.
    pub fn parse(answer: &str) -> Self {
        match answer.to_ascii_lowercase().as_str() {
            "r" => Self::Retry,
            "c" | "" => Self::Continue,
            _ => Self::Exit,
        }
    }
}

/// Operator choice after the version bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitDecision {
    Next,
    CommitAndStop,
    Exit,
}

impl CommitDecision {
    /// `e` exits, `c` commits and stops, anything else commits and moves on.
    pub fn parse(answer: &str) -> Self {
        match answer.to_ascii_lowercase().as_str() {
            "e" => Self::Exit,
            "c" => Self::CommitAndStop,
            _ => Self::Next,
        }
    }
}

/// Where a repository is in its workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Cloned,
    Prepared,
    DeployTriggered,
    AwaitingConfirmation,
    ArtifactCheck,
    VersionDecision,
}

/// Why a session stopped early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// The deployment tool exited non-zero or never started.
    DeployFailed { code: Option<i32> },
    /// The operator chose exit when no artifacts changed.
    NoArtifacts,
    /// The operator chose exit after the version bump.
    ExitBeforeCommit { manifest: PathBuf, reverted: bool },
}

impl Display for AbortReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DeployFailed { code: Some(code) } => {
                write!(f, "deployment failed or was cancelled (exit code {code})")
            }
            Self::DeployFailed { code: None } => {
                write!(f, "deployment failed or was cancelled")
            }
            Self::NoArtifacts => write!(f, "exited after no artifact changes were found"),
            Self::ExitBeforeCommit {
                manifest,
                reverted: false,
            } => write!(
                f,
                "exited without committing; {} keeps the new version",
                manifest.display()
            ),
            Self::ExitBeforeCommit {
                manifest,
                reverted: true,
            } => write!(
                f,
                "exited without committing; {} was restored",
                manifest.display()
            ),
        }
    }
}

/// How one repository's workflow ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoOutcome {
    Committed {
        version: String,
        pushed: bool,
        stop: bool,
    },
    /// No artifacts changed and the operator moved on; nothing was written.
    Skipped,
    Aborted(AbortReason),
}

#[derive(Debug)]
enum ArtifactStatus {
    Changed(Vec<String>),
    Accepted,
    Exit,
}

#[derive(Debug)]
struct VersionBump {
    manifest_path: PathBuf,
    version: String,
    /// The manifest as read, before the new version was written.
    original: Option<VersionManifest>,
}

/// The per-repository pipeline: clone, prepare, deploy, verify, bump, commit.
pub struct RepositoryWorkflow<'a> {
    cfg: &'a CascadeConfig,
    runner: &'a dyn CommandRunner,
    toolchains: &'a ToolchainRegistry,
    git: GitClient<'a>,
}

impl<'a> RepositoryWorkflow<'a> {
    pub fn new(
        cfg: &'a CascadeConfig,
        runner: &'a dyn CommandRunner,
        toolchains: &'a ToolchainRegistry,
    ) -> Self {
        Self {
            cfg,
            runner,
            toolchains,
            git: GitClient::new(runner),
        }
    }

    /// Runs the whole workflow for `copy`.
    ///
    /// Errors are reserved for prompt and manifest I/O; command failures are
    /// either logged or turned into [`RepoOutcome::Aborted`].
    #[instrument(skip(self, clone_url, prompter), fields(repo = %copy.repo))]
    pub fn run(
        &self,
        copy: &WorkingCopy,
        clone_url: &str,
        prompter: &mut dyn Prompter,
    ) -> Result<RepoOutcome> {
        self.clone_repo(copy, clone_url, prompter);
        self.enter(copy, Stage::Cloned);

        self.prepare(copy, prompter)?;
        self.enter(copy, Stage::Prepared);

        if let Some(reason) = self.trigger_deploy(copy, prompter)? {
            return Ok(RepoOutcome::Aborted(reason));
        }
        self.enter(copy, Stage::DeployTriggered);

        self.enter(copy, Stage::AwaitingConfirmation);
        self.await_confirmation(prompter)?;

        self.enter(copy, Stage::ArtifactCheck);
        match self.verify_artifacts(copy, prompter)? {
            ArtifactStatus::Changed(paths) => {
                info!(target: "cascade", "{} artifact change(s) in {}", paths.len(), copy.repo);
            }
            ArtifactStatus::Accepted => return Ok(RepoOutcome::Skipped),
            ArtifactStatus::Exit => return Ok(RepoOutcome::Aborted(AbortReason::NoArtifacts)),
        }

        self.enter(copy, Stage::VersionDecision);
        let bump = self.bump_version(copy, prompter)?;
        self.commit(copy, bump, prompter)
    }

    fn enter(&self, copy: &WorkingCopy, stage: Stage) {
        debug!(target: "cascade", "{} -> {:?}", copy.repo, stage);
    }

    fn tool(&self, step: ToolStep) -> Result<CommandLine> {
        let name = &self.cfg.toolchain.name;
        self.toolchains
            .build_action(name, step)
            .ok_or_else(|| anyhow!("toolchain '{name}' has no command for '{step}'"))
    }

    fn clone_repo(&self, copy: &WorkingCopy, url: &str, prompter: &mut dyn Prompter) {
        prompter.say(&format!("Cloning {url}..."));
        let root = &self.cfg.workspace.root;
        if !self.git.clone(url, root, copy.dir_name()).is_success() {
            warn!(target: "cascade", "clone of {} failed; continuing with {}", url, copy.path.display());
        }

        if let Some(branch) = &self.cfg.git.branch {
            if !self.git.checkout(&copy.path, branch).is_success() {
                warn!(target: "cascade", "checkout of '{}' failed in {}", branch, copy.repo);
            }
        }
    }

    /// Best-effort setup: every failure is logged and the workflow carries on.
    fn prepare(&self, copy: &WorkingCopy, prompter: &mut dyn Prompter) -> Result<()> {
        prompter.say("Installing packages, this may take a while...");
        self.run_setup(copy, ToolStep::Install)?;

        let env_file = &self.cfg.workspace.env_file;
        if self.runner.is_dry_run() {
            info!(target: "cascade", "dry-run: would copy {} into {}", env_file.display(), copy.path.display());
        } else if let Err(e) = workspace::copy_env_file(env_file, &copy.path) {
            warn!(target: "cascade", "{:#}", e);
        }

        prompter.say("Updating the deployment tool...");
        self.run_setup(copy, ToolStep::Bootstrap)?;

        let cache = copy.path.join(&self.cfg.workspace.cache_dir);
        if self.runner.is_dry_run() {
            info!(target: "cascade", "dry-run: would ensure {} exists", cache.display());
        } else {
            match workspace::ensure_dir(&cache) {
                Ok(true) => prompter.say(&format!("Created '{}' folder.", self.cfg.workspace.cache_dir)),
                Ok(false) => {}
                Err(e) => warn!(target: "cascade", "{:#}", e),
            }
        }
        Ok(())
    }

    fn run_setup(&self, copy: &WorkingCopy, step: ToolStep) -> Result<()> {
        let cmd = self.tool(step)?;
        let outcome = self.runner.run(&cmd, &copy.path);
        if !outcome.is_success() {
            warn!(target: "cascade", "{} step failed for {}; continuing", step, copy.repo);
        }
        Ok(())
    }

    fn trigger_deploy(
        &self,
        copy: &WorkingCopy,
        prompter: &mut dyn Prompter,
    ) -> Result<Option<AbortReason>> {
        let cmd = self.tool(ToolStep::Deploy)?.wrapped_in(&self.cfg.toolchain.terminal);
        if self.cfg.toolchain.terminal.is_empty() {
            prompter.say("Starting the deployment...");
        } else {
            prompter.say("Starting the deployment in a new window...");
        }

        let outcome = self.runner.run_interactive(&cmd, &copy.path);
        if outcome.is_success() {
            return Ok(None);
        }
        prompter.say("Deployment failed or cancelled...");
        Ok(Some(AbortReason::DeployFailed { code: outcome.code }))
    }

    fn await_confirmation(&self, prompter: &mut dyn Prompter) -> Result<()> {
        prompter.say("Press Enter when the deployment is done...");
        let delay = self.cfg.workflow.settle_delay();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        prompter.ask("")?;
        Ok(())
    }

    /// Fetches artifacts until they show up in `git status` or the operator gives up.
    fn verify_artifacts(
        &self,
        copy: &WorkingCopy,
        prompter: &mut dyn Prompter,
    ) -> Result<ArtifactStatus> {
        let fetch = self.tool(ToolStep::FetchArtifacts)?;
        let artifacts_dir = &self.cfg.workflow.artifacts_dir;
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            prompter.say("Fetching artifacts...");
            if !self.runner.run(&fetch, &copy.path).is_success() {
                warn!(target: "cascade", "fetching artifacts failed for {} (attempt {})", copy.repo, attempt);
            }

            let changed = self.git.status_porcelain(&copy.path, artifacts_dir);
            if !changed.is_empty() {
                return Ok(ArtifactStatus::Changed(changed));
            }

            prompter.say("No change in deployment artifacts...");
            prompter.say("Options");
            prompter.say("r - Retry fetching artifacts");
            prompter.say("c - Continue without fetching artifacts (aka this was expected)");
            prompter.say("e - Exit");

            match ArtifactDecision::parse(&prompter.ask("What do you wish to do (r/C/e): ")?) {
                ArtifactDecision::Retry => {
                    prompter.say("Retrying...");
                }
                ArtifactDecision::Continue => {
                    prompter.say("Continuing...");
                    return Ok(ArtifactStatus::Accepted);
                }
                ArtifactDecision::Exit => {
                    prompter.say("Exiting...");
                    return Ok(ArtifactStatus::Exit);
                }
            }
        }
    }

    fn bump_version(&self, copy: &WorkingCopy, prompter: &mut dyn Prompter) -> Result<VersionBump> {
        let manifest_path = self.cfg.workflow.manifest_path(&copy.path);
        let original = match VersionManifest::load(&manifest_path) {
            Ok(manifest) => Some(manifest),
            Err(e) if self.runner.is_dry_run() => {
                warn!(target: "cascade", "dry-run: {:#}", e);
                None
            }
            Err(e) => return Err(e),
        };

        let current = original
            .as_ref()
            .and_then(VersionManifest::version)
            .unwrap_or("<unset>");
        prompter.say(&format!(
            "Current version of {} is {}.",
            copy.dir_name(),
            current
        ));

        let version = loop {
            let answer = prompter.ask("What should the new version number be? ")?;
            if !answer.is_empty() {
                break answer;
            }
            prompter.say("A version is required.");
        };

        match &original {
            Some(_) if self.runner.is_dry_run() => {
                info!(target: "cascade", "dry-run: would set version {} in {}", version, manifest_path.display());
            }
            Some(manifest) => {
                let mut updated = manifest.clone();
                updated.set_version(&version);
                updated.save()?;
                prompter.say(&format!(
                    "Updated {} with version {}",
                    self.cfg.workflow.manifest, version
                ));
            }
            None => {}
        }

        Ok(VersionBump {
            manifest_path,
            version,
            original,
        })
    }

    fn commit(
        &self,
        copy: &WorkingCopy,
        bump: VersionBump,
        prompter: &mut dyn Prompter,
    ) -> Result<RepoOutcome> {
        prompter.say("What do you wish to do:");
        prompter.say("n - Commit & Push changes to the remote, then perform next deployment");
        prompter.say("c - Commit & Push changes to the remote, but do not continue to next deployment");
        prompter.say("e - Exit without committing");

        let decision = CommitDecision::parse(&prompter.ask("What do you wish to do (N/c/e): ")?);
        if decision == CommitDecision::Exit {
            let reverted = self.abandon(&bump)?;
            return Ok(RepoOutcome::Aborted(AbortReason::ExitBeforeCommit {
                manifest: bump.manifest_path,
                reverted,
            }));
        }

        let manifest = self.cfg.workflow.manifest.as_str();
        let artifacts_dir = self.cfg.workflow.artifacts_dir.as_str();
        for path in [manifest, artifacts_dir] {
            if !self.git.add(&copy.path, &[path]).is_success() {
                warn!(target: "cascade", "staging {} failed in {}", path, copy.repo);
            }
        }

        if !self
            .git
            .commit(&copy.path, &self.cfg.git.commit_message)
            .is_success()
        {
            warn!(target: "cascade", "commit failed in {}", copy.repo);
        }

        let pushed = self.git.push(&copy.path).is_success();
        if pushed {
            info!(target: "cascade", "pushed {} at version {}", copy.repo, bump.version);
        } else {
            warn!(target: "cascade", "push failed for {}; the commit is local only", copy.repo);
        }

        Ok(RepoOutcome::Committed {
            version: bump.version,
            pushed,
            stop: decision == CommitDecision::CommitAndStop,
        })
    }

    /// Leaves or restores the bumped manifest. Returns whether it was restored.
    fn abandon(&self, bump: &VersionBump) -> Result<bool> {
        let Some(original) = &bump.original else {
            return Ok(false);
        };

        if self.cfg.workflow.revert_version_on_abort && !self.runner.is_dry_run() {
            original.save()?;
            info!(target: "cascade", "restored {}", bump.manifest_path.display());
            return Ok(true);
        }

        warn!(target: "cascade",
            "{} now says version {} (was {}) and is not committed",
            bump.manifest_path.display(),
            bump.version,
            original.version().unwrap_or("<unset>")
        );
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedPrompter;
    use crate::testing::{changed_artifacts, config_in, manifest_version, seed_working_copy, FakeRunner};
    use cascade_core::{CommandOutcome, RepositoryRef};
    use cascade_ext_node::NodeToolchain;

    fn toolchains() -> ToolchainRegistry {
        let mut registry = ToolchainRegistry::default();
        registry.register(Box::new(NodeToolchain::new()));
        registry
    }

    fn alpha(cfg: &CascadeConfig) -> WorkingCopy {
        let repo: RepositoryRef = "org/alpha".parse().unwrap();
        WorkingCopy::new(repo, &cfg.workspace.root)
    }

    const URL: &str = "git@github.com:org/alpha";

    #[test]
    fn parses_artifact_decisions() {
        assert_eq!(ArtifactDecision::parse("r"), ArtifactDecision::Retry);
        assert_eq!(ArtifactDecision::parse("C"), ArtifactDecision::Continue);
        assert_eq!(ArtifactDecision::parse(""), ArtifactDecision::Continue);
        assert_eq!(ArtifactDecision::parse("e"), ArtifactDecision::Exit);
        assert_eq!(ArtifactDecision::parse("whatever"), ArtifactDecision::Exit);
    }

    #[test]
    fn parses_commit_decisions() {
        assert_eq!(CommitDecision::parse(""), CommitDecision::Next);
        assert_eq!(CommitDecision::parse("n"), CommitDecision::Next);
        assert_eq!(CommitDecision::parse("c"), CommitDecision::CommitAndStop);
        assert_eq!(CommitDecision::parse("E"), CommitDecision::Exit);
    }

    #[test]
    fn commits_and_pushes_when_artifacts_changed() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config_in(dir.path());
        let path = seed_working_copy(&cfg, "alpha", "1.0.0");
        let runner = FakeRunner::default();
        runner.respond("git status", changed_artifacts());
        let tools = toolchains();
        let mut prompter = ScriptedPrompter::new(["", "1.0.1", "n"]);

        let outcome = RepositoryWorkflow::new(&cfg, &runner, &tools)
            .run(&alpha(&cfg), URL, &mut prompter)
            .unwrap();

        assert_eq!(
            outcome,
            RepoOutcome::Committed {
                version: "1.0.1".to_string(),
                pushed: true,
                stop: false,
            }
        );
        assert_eq!(manifest_version(&path), "1.0.1");
        assert_eq!(
            runner.lines(),
            vec![
                "git clone git@github.com:org/alpha alpha",
                "npm i",
                "npx sphinx install",
                "npm run deploy:testnets",
                "npm run artifacts",
                "git status --porcelain deployments",
                "git add package.json",
                "git add deployments",
                "git commit -m 'ci: bump version and deployment'",
                "git push",
            ]
        );
        let calls = runner.calls();
        assert_eq!(calls[0].cwd, cfg.workspace.root);
        assert!(calls[3].interactive);
        assert!(calls.iter().skip(1).all(|c| c.cwd == path));
        assert!(path.join(".env").exists());
        assert!(path.join("cache").is_dir());
        assert_eq!(prompter.remaining(), 0);
    }

    #[test]
    fn deploy_failure_aborts_before_confirmation() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config_in(dir.path());
        let path = seed_working_copy(&cfg, "alpha", "1.0.0");
        let runner = FakeRunner::default();
        runner.respond("npm run deploy", CommandOutcome::failure(130));
        let tools = toolchains();
        let mut prompter = ScriptedPrompter::new(Vec::<String>::new());

        let outcome = RepositoryWorkflow::new(&cfg, &runner, &tools)
            .run(&alpha(&cfg), URL, &mut prompter)
            .unwrap();

        assert_eq!(
            outcome,
            RepoOutcome::Aborted(AbortReason::DeployFailed { code: Some(130) })
        );
        assert_eq!(runner.count("npm run artifacts"), 0);
        assert_eq!(runner.count("git commit"), 0);
        assert_eq!(manifest_version(&path), "1.0.0");
    }

    #[test]
    fn setup_failures_are_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config_in(dir.path());
        cfg.workspace.env_file = dir.path().join("missing.env");
        seed_working_copy(&cfg, "alpha", "1.0.0");
        let runner = FakeRunner::default();
        runner
            .respond("git clone", CommandOutcome::failure(128))
            .respond("npm i", CommandOutcome::failure(1))
            .respond("npx sphinx", CommandOutcome::failure(1))
            .respond("git status", changed_artifacts());
        let tools = toolchains();
        let mut prompter = ScriptedPrompter::new(["", "1.1.0", "c"]);

        let outcome = RepositoryWorkflow::new(&cfg, &runner, &tools)
            .run(&alpha(&cfg), URL, &mut prompter)
            .unwrap();

        assert!(matches!(outcome, RepoOutcome::Committed { stop: true, .. }));
    }

    #[test]
    fn retry_refetches_until_operator_continues() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config_in(dir.path());
        let path = seed_working_copy(&cfg, "alpha", "1.0.0");
        let runner = FakeRunner::default();
        let tools = toolchains();
        let mut prompter = ScriptedPrompter::new(["", "r", "r", "c"]);

        let outcome = RepositoryWorkflow::new(&cfg, &runner, &tools)
            .run(&alpha(&cfg), URL, &mut prompter)
            .unwrap();

        assert_eq!(outcome, RepoOutcome::Skipped);
        assert_eq!(runner.count("npm run artifacts"), 3);
        assert_eq!(runner.count("git status --porcelain deployments"), 3);
        assert_eq!(prompter.count("What do you wish to do (r/C/e)"), 3);
        assert_eq!(prompter.count("No change in deployment artifacts"), 3);
        assert_eq!(prompter.count("new version number"), 0);
        assert_eq!(runner.count("git add"), 0);
        assert_eq!(manifest_version(&path), "1.0.0");
    }

    #[test]
    fn retry_picks_up_late_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config_in(dir.path());
        let path = seed_working_copy(&cfg, "alpha", "1.0.0");
        let runner = FakeRunner::default();
        runner
            .respond("git status", CommandOutcome::success())
            .respond("git status", changed_artifacts());
        let tools = toolchains();
        let mut prompter = ScriptedPrompter::new(["", "r", "2.0.0", "n"]);

        let outcome = RepositoryWorkflow::new(&cfg, &runner, &tools)
            .run(&alpha(&cfg), URL, &mut prompter)
            .unwrap();

        assert!(matches!(outcome, RepoOutcome::Committed { ref version, .. } if version == "2.0.0"));
        assert_eq!(runner.count("npm run artifacts"), 2);
        assert_eq!(manifest_version(&path), "2.0.0");
    }

    #[test]
    fn exit_on_missing_artifacts_leaves_manifest_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config_in(dir.path());
        let path = seed_working_copy(&cfg, "alpha", "1.0.0");
        let runner = FakeRunner::default();
        let tools = toolchains();
        let mut prompter = ScriptedPrompter::new(["", "e"]);

        let outcome = RepositoryWorkflow::new(&cfg, &runner, &tools)
            .run(&alpha(&cfg), URL, &mut prompter)
            .unwrap();

        assert_eq!(outcome, RepoOutcome::Aborted(AbortReason::NoArtifacts));
        assert_eq!(manifest_version(&path), "1.0.0");
    }

    #[test]
    fn exit_before_commit_keeps_bumped_manifest_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config_in(dir.path());
        let path = seed_working_copy(&cfg, "alpha", "1.0.0");
        let runner = FakeRunner::default();
        runner.respond("git status", changed_artifacts());
        let tools = toolchains();
        let mut prompter = ScriptedPrompter::new(["", "", "1.0.1", "e"]);

        let outcome = RepositoryWorkflow::new(&cfg, &runner, &tools)
            .run(&alpha(&cfg), URL, &mut prompter)
            .unwrap();

        assert!(matches!(
            outcome,
            RepoOutcome::Aborted(AbortReason::ExitBeforeCommit { reverted: false, .. })
        ));
        assert_eq!(prompter.count("A version is required"), 1);
        assert_eq!(manifest_version(&path), "1.0.1");
        assert_eq!(runner.count("git add"), 0);
        assert_eq!(runner.count("git push"), 0);
    }

    #[test]
    fn exit_before_commit_can_restore_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config_in(dir.path());
        cfg.workflow.revert_version_on_abort = true;
        let path = seed_working_copy(&cfg, "alpha", "1.0.0");
        let before = std::fs::read_to_string(path.join("package.json")).unwrap();
        let runner = FakeRunner::default();
        runner.respond("git status", changed_artifacts());
        let tools = toolchains();
        let mut prompter = ScriptedPrompter::new(["", "1.0.1", "e"]);

        let outcome = RepositoryWorkflow::new(&cfg, &runner, &tools)
            .run(&alpha(&cfg), URL, &mut prompter)
            .unwrap();

        assert!(matches!(
            outcome,
            RepoOutcome::Aborted(AbortReason::ExitBeforeCommit { reverted: true, .. })
        ));
        let after = std::fs::read_to_string(path.join("package.json")).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn dry_run_exit_before_commit_leaves_manifest_alone() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config_in(dir.path());
        cfg.workflow.revert_version_on_abort = true;
        let path = seed_working_copy(&cfg, "alpha", "1.0.0");
        let runner = FakeRunner::dry_run();
        runner.respond("git status", changed_artifacts());
        let tools = toolchains();
        let mut prompter = ScriptedPrompter::new(["", "1.0.1", "e"]);

        let outcome = RepositoryWorkflow::new(&cfg, &runner, &tools)
            .run(&alpha(&cfg), URL, &mut prompter)
            .unwrap();

        assert!(matches!(
            outcome,
            RepoOutcome::Aborted(AbortReason::ExitBeforeCommit { reverted: false, .. })
        ));
        assert_eq!(manifest_version(&path), "1.0.0");
        assert_eq!(prompter.count("Updated package.json"), 0);
        assert!(!path.join(".env").exists());
    }

    #[test]
    fn checks_out_configured_branch_and_uses_terminal_launcher() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config_in(dir.path());
        cfg.git.branch = Some("feat/sphinx".to_string());
        cfg.toolchain.terminal = vec!["alacritty".to_string(), "-e".to_string()];
        seed_working_copy(&cfg, "alpha", "1.0.0");
        let runner = FakeRunner::default();
        let tools = toolchains();
        let mut prompter = ScriptedPrompter::new(["", "c"]);

        RepositoryWorkflow::new(&cfg, &runner, &tools)
            .run(&alpha(&cfg), URL, &mut prompter)
            .unwrap();

        let lines = runner.lines();
        assert_eq!(lines[1], "git checkout feat/sphinx");
        assert!(lines.contains(&"alacritty -e npm run deploy:testnets".to_string()));
    }

    #[test]
    fn missing_manifest_is_an_error_outside_dry_run() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config_in(dir.path());
        std::fs::create_dir_all(cfg.workspace.root.join("alpha")).unwrap();
        let runner = FakeRunner::default();
        runner.respond("git status", changed_artifacts());
        let tools = toolchains();
        let mut prompter = ScriptedPrompter::new([""]);

        let err = RepositoryWorkflow::new(&cfg, &runner, &tools)
            .run(&alpha(&cfg), URL, &mut prompter)
            .expect_err("must fail");
        assert!(err.to_string().contains("failed to read manifest"));
    }
}
