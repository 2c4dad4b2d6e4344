use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;

use crate::command::{CommandLine, ToolStep};
use crate::constants::*;
use crate::protocol::Protocol;
use crate::repo::RepositoryRef;

#[derive(Debug, Clone, Deserialize)]
pub struct CascadeConfig {
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub git: GitConfig,
    #[serde(default)]
    pub toolchain: ToolchainConfig,
    #[serde(default)]
    pub workflow: WorkflowConfig,
    #[serde(default)]
    pub repositories: BTreeMap<RepositoryRef, RepositoryConfig>,
    #[serde(default)]
    pub sets: Vec<SetConfig>,
}

impl CascadeConfig {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {path}"))?;
        Self::from_toml(&text).with_context(|| format!("invalid config: {path}"))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let cfg = toml::from_str::<Self>(text).context("failed to parse TOML config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Checks references between sections; graph acyclicity is checked by the registry.
    pub fn validate(&self) -> Result<()> {
        let mut working_copies: HashMap<&str, &RepositoryRef> = HashMap::new();
        for (repo, entry) in &self.repositories {
            if let Some(first) = working_copies.insert(repo.name(), repo) {
                bail!(
                    "repositories '{first}' and '{repo}' would share working copy '{}'",
                    repo.name()
                );
            }
            for dep in &entry.depends_on {
                if !self.repositories.contains_key(dep) {
                    bail!("repository '{repo}' depends on undeclared repository '{dep}'");
                }
                if dep == repo {
                    bail!("repository '{repo}' depends on itself");
                }
            }
        }

        let mut names = HashSet::new();
        for set in &self.sets {
            if set.name.trim().is_empty() {
                bail!("deployment set names must not be empty");
            }
            if !names.insert(set.name.as_str()) {
                bail!("deployment set '{}' is declared twice", set.name);
            }
            if set.from.is_empty() {
                bail!("deployment set '{}' lists no repositories", set.name);
            }
            for root in &set.from {
                if !self.repositories.contains_key(root) {
                    bail!(
                        "deployment set '{}' references undeclared repository '{root}'",
                        set.name
                    );
                }
            }
        }

        self.toolchain.overrides()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkspaceConfig {
    #[serde(default = "default_root")]
    pub root: PathBuf,
    #[serde(default = "default_env_file")]
    pub env_file: PathBuf,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            env_file: default_env_file(),
            cache_dir: default_cache_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitConfig {
    #[serde(default = "default_host")]
    pub host: String,
    /// When unset the operator is asked once per session.
    pub protocol: Option<Protocol>,
    /// Branch to check out right after cloning.
    pub branch: Option<String>,
    #[serde(default = "default_commit_message")]
    pub commit_message: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            protocol: None,
            branch: None,
            commit_message: default_commit_message(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolchainConfig {
    #[serde(default = "default_toolchain")]
    pub name: String,
    /// Launcher prepended to the deploy command, e.g. `["alacritty", "-e"]`.
    #[serde(default)]
    pub terminal: Vec<String>,
    /// Per-step argv overrides keyed by step name.
    #[serde(default)]
    pub commands: BTreeMap<String, Vec<String>>,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            name: default_toolchain(),
            terminal: Vec::new(),
            commands: BTreeMap::new(),
        }
    }
}

impl ToolchainConfig {
    pub fn overrides(&self) -> Result<HashMap<ToolStep, CommandLine>> {
        self.commands
            .iter()
            .map(|(key, argv)| {
                let step = ToolStep::from_str(key)
                    .map_err(|e| anyhow!("invalid [toolchain.commands] entry: {e}"))?;
                let cmd = CommandLine::from_argv(argv)
                    .ok_or_else(|| anyhow!("[toolchain.commands] {key} must not be empty"))?;
                Ok((step, cmd))
            })
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowConfig {
    #[serde(default = "default_manifest")]
    pub manifest: String,
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: String,
    #[serde(default = "default_settle_delay")]
    pub settle_delay_secs: u64,
    #[serde(default = "default_push_delay")]
    pub push_delay_secs: u64,
    /// Restore the previous version when the operator exits after the bump.
    #[serde(default)]
    pub revert_version_on_abort: bool,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            manifest: default_manifest(),
            artifacts_dir: default_artifacts_dir(),
            settle_delay_secs: default_settle_delay(),
            push_delay_secs: default_push_delay(),
            revert_version_on_abort: false,
        }
    }
}

impl WorkflowConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }

    pub fn push_delay(&self) -> Duration {
        Duration::from_secs(self.push_delay_secs)
    }

    pub fn manifest_path(&self, working_copy: &Path) -> PathBuf {
        working_copy.join(&self.manifest)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepositoryConfig {
    /// Repositories that must be deployed before this one.
    #[serde(default)]
    pub depends_on: Vec<RepositoryRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetConfig {
    pub name: String,
    pub from: Vec<RepositoryRef>,
    /// Pull in every transitive dependent of `from`.
    #[serde(default = "default_true")]
    pub include_dependents: bool,
}

fn default_root() -> PathBuf {
    PathBuf::from(WORKSPACE_ROOT)
}

fn default_env_file() -> PathBuf {
    PathBuf::from(ENV_FILE)
}

fn default_cache_dir() -> String {
    CACHE_DIR.to_string()
}

fn default_host() -> String {
    GIT_HOST.to_string()
}

fn default_commit_message() -> String {
    COMMIT_MESSAGE.to_string()
}

fn default_toolchain() -> String {
    DEFAULT_TOOLCHAIN.to_string()
}

fn default_manifest() -> String {
    MANIFEST_NODE.to_string()
}

fn default_artifacts_dir() -> String {
    ARTIFACTS_DIR.to_string()
}

fn default_settle_delay() -> u64 {
    SETTLE_DELAY_SECS
}

fn default_push_delay() -> u64 {
    PUSH_DELAY_SECS
}

fn default_true() -> bool {
    true
}
