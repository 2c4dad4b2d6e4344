use std::collections::HashSet;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Result};
use tracing::{info, instrument, warn};

use cascade_core::config::CascadeConfig;
use cascade_core::workspace::{self, WorkingCopy};
use cascade_core::{CommandRunner, Protocol, RepositoryRef, ToolchainRegistry};
use cascade_registry::{DeploymentSet, Registry};

use crate::prompt::Prompter;
use crate::workflow::{AbortReason, RepoOutcome, RepositoryWorkflow};

/// Answers supplied up front instead of at the prompt.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub protocol: Option<Protocol>,
    pub set: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Every repository in the set was processed.
    Completed,
    /// The operator committed `repo` and asked to stop there.
    Stopped { repo: RepositoryRef },
    /// The session ended at `repo`; later repositories were not touched.
    Aborted {
        repo: RepositoryRef,
        reason: AbortReason,
    },
}

impl SessionOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Aborted { .. })
    }

    pub fn exit_code(&self) -> ExitCode {
        if self.is_success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }
}

#[derive(Debug)]
pub struct SessionReport {
    pub set: String,
    pub outcome: SessionOutcome,
    pub results: Vec<(RepositoryRef, RepoOutcome)>,
    pub cleaned_up: bool,
}

/// Drives one deployment set through the repository workflow, in order.
pub struct Session<'a> {
    cfg: &'a CascadeConfig,
    registry: &'a Registry,
    runner: &'a dyn CommandRunner,
    toolchains: &'a ToolchainRegistry,
}

impl<'a> Session<'a> {
    pub fn new(
        cfg: &'a CascadeConfig,
        registry: &'a Registry,
        runner: &'a dyn CommandRunner,
        toolchains: &'a ToolchainRegistry,
    ) -> Self {
        Self {
            cfg,
            registry,
            runner,
            toolchains,
        }
    }

    #[instrument(skip_all)]
    pub fn run(
        &self,
        options: &SessionOptions,
        prompter: &mut dyn Prompter,
    ) -> Result<SessionReport> {
        let protocol = self.resolve_protocol(options, prompter)?;
        let set = self.select_set(options, prompter)?;
        info!(target: "cascade",
            "deploying set '{}' ({} repositories) over {}",
            set.name,
            set.repositories.len(),
            protocol
        );

        let root = &self.cfg.workspace.root;
        if !self.runner.is_dry_run() {
            workspace::ensure_dir(root)?;
        }

        let processed = self.deploy_all(set, protocol, prompter);
        let cleaned_up = match self.offer_cleanup(prompter) {
            Ok(cleaned_up) => cleaned_up,
            Err(e) if processed.is_err() => {
                warn!(target: "cascade", "cleanup skipped: {:#}", e);
                false
            }
            Err(e) => return Err(e),
        };
        let (outcome, results) = processed?;

        Ok(SessionReport {
            set: set.name.clone(),
            outcome,
            results,
            cleaned_up,
        })
    }

    fn resolve_protocol(
        &self,
        options: &SessionOptions,
        prompter: &mut dyn Prompter,
    ) -> Result<Protocol> {
        if let Some(protocol) = options.protocol.or(self.cfg.git.protocol) {
            return Ok(protocol);
        }
        let answer = prompter.ask("Use SSH for git repositories? (YES/no): ")?;
        if answer.eq_ignore_ascii_case("no") || answer.eq_ignore_ascii_case("n") {
            Ok(Protocol::Https)
        } else {
            Ok(Protocol::Ssh)
        }
    }

    fn select_set(
        &self,
        options: &SessionOptions,
        prompter: &mut dyn Prompter,
    ) -> Result<&'a DeploymentSet> {
        if let Some(name) = &options.set {
            return Ok(self.registry.resolve(name)?);
        }

        let sets = self.registry.list_options();
        if sets.is_empty() {
            bail!("no deployment sets are configured");
        }

        prompter.say("Please select an option:");
        for (i, set) in sets.iter().enumerate() {
            prompter.say(&format!("{}. {}", i + 1, set.name));
        }

        loop {
            let answer = prompter.ask("Enter the number of your choice: ")?;
            match answer.parse::<usize>() {
                Ok(n) if (1..=sets.len()).contains(&n) => return Ok(&sets[n - 1]),
                _ => prompter.say(&format!("Please enter a number from 1 to {}.", sets.len())),
            }
        }
    }

    fn deploy_all(
        &self,
        set: &DeploymentSet,
        protocol: Protocol,
        prompter: &mut dyn Prompter,
    ) -> Result<(SessionOutcome, Vec<(RepositoryRef, RepoOutcome)>)> {
        let workflow = RepositoryWorkflow::new(self.cfg, self.runner, self.toolchains);
        let total = set.repositories.len();
        let mut seen = HashSet::new();
        let mut results = Vec::with_capacity(total);

        for (index, repo) in set.repositories.iter().enumerate() {
            if !seen.insert(repo) {
                warn!(target: "cascade", "{} is listed twice in '{}'; skipping", repo, set.name);
                continue;
            }

            prompter.heading(&format!("[{}/{}] {}", index + 1, total, repo));
            let copy = WorkingCopy::new(repo.clone(), &self.cfg.workspace.root);
            let url = repo.clone_url(protocol, &self.cfg.git.host);
            let outcome = workflow.run(&copy, &url, prompter)?;
            results.push((repo.clone(), outcome.clone()));
            let pause = self.push_pause(&outcome, index + 1 == total);

            match outcome {
                RepoOutcome::Aborted(reason) => {
                    warn!(target: "cascade", "{}: {}", repo, reason);
                    let outcome = SessionOutcome::Aborted {
                        repo: repo.clone(),
                        reason,
                    };
                    return Ok((outcome, results));
                }
                RepoOutcome::Committed { stop: true, .. } => {
                    let outcome = SessionOutcome::Stopped { repo: repo.clone() };
                    return Ok((outcome, results));
                }
                RepoOutcome::Committed { .. } | RepoOutcome::Skipped => {
                    if let Some(delay) = pause {
                        std::thread::sleep(delay);
                    }
                }
            }
        }

        Ok((SessionOutcome::Completed, results))
    }

    /// Pause owed after `outcome`: only a successful push with more repositories to go.
    fn push_pause(&self, outcome: &RepoOutcome, is_last: bool) -> Option<Duration> {
        let delay = self.cfg.workflow.push_delay();
        match outcome {
            RepoOutcome::Committed {
                pushed: true,
                stop: false,
                ..
            } if !is_last && !delay.is_zero() => Some(delay),
            _ => None,
        }
    }

    /// Asks whether to delete the workspace root. Returns whether it was removed.
    fn offer_cleanup(&self, prompter: &mut dyn Prompter) -> Result<bool> {
        let root = &self.cfg.workspace.root;
        let answer = prompter.ask("Remove the temporary directory? (yes/no): ")?;
        if !answer.eq_ignore_ascii_case("yes") {
            return Ok(false);
        }

        if self.runner.is_dry_run() {
            info!(target: "cascade", "dry-run: would remove {}", root.display());
            return Ok(false);
        }
        workspace::remove_workspace(root)?;
        prompter.say("Temporary directory removed.");
        Ok(true)
    }
}
