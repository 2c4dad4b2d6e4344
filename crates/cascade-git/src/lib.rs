//! Version-control operations over the shared command runner.

use std::path::Path;

use cascade_core::{CommandLine, CommandOutcome, CommandRunner};
use tracing::{debug, instrument, warn};

/// Thin `git` client; every call goes through the session's [`CommandRunner`].
pub struct GitClient<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> GitClient<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    /// Clones `url` into `parent/dir_name`.
    #[instrument(skip(self))]
    pub fn clone(&self, url: &str, parent: &Path, dir_name: &str) -> CommandOutcome {
        self.git(parent, ["clone", url, dir_name])
    }

    pub fn checkout(&self, repo: &Path, branch: &str) -> CommandOutcome {
        self.git(repo, ["checkout", branch])
    }

    /// Paths under `pathspec` that differ from `HEAD` or are untracked.
    ///
    /// A failing status call yields whatever it printed, usually nothing.
    #[instrument(skip(self))]
    pub fn status_porcelain(&self, repo: &Path, pathspec: &str) -> Vec<String> {
        let outcome = self.git(repo, ["status", "--porcelain", pathspec]);
        if !outcome.is_success() {
            warn!("git status failed in {}", repo.display());
        }
        let changed = parse_porcelain(&outcome.stdout);
        debug!("{} changed path(s) under {}", changed.len(), pathspec);
        changed
    }

    pub fn add(&self, repo: &Path, paths: &[&str]) -> CommandOutcome {
        let mut args = vec!["add"];
        args.extend_from_slice(paths);
        self.git(repo, args)
    }

    pub fn commit(&self, repo: &Path, message: &str) -> CommandOutcome {
        self.git(repo, ["commit", "-m", message])
    }

    pub fn push(&self, repo: &Path) -> CommandOutcome {
        self.git(repo, ["push"])
    }

    fn git<I, S>(&self, cwd: &Path, args: I) -> CommandOutcome
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.runner.run(&CommandLine::new("git").args(args), cwd)
    }
}

/// Parses `git status --porcelain` (v1) output into paths.
///
/// Renames and copies report their destination path.
pub fn parse_porcelain(output: &str) -> Vec<String> {
    output
        .lines()
        .filter(|line| line.len() > 3)
        .map(|line| {
            let path = &line[3..];
            let path = path.rsplit_once(" -> ").map_or(path, |(_, to)| to);
            path.trim_matches('"').to_string()
        })
        .collect()
}
