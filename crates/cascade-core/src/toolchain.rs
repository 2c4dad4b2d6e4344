use std::collections::{BTreeMap, HashMap, HashSet};

use anyhow::{bail, Result};
use tracing::{debug, instrument};

use crate::command::{CommandLine, ToolStep};

/// A contract for package-manager/deployment-tool integrations.
pub trait Toolchain: std::fmt::Debug {
    /// Unique name of the toolchain.
    fn name(&self) -> &str;
    /// The workflow steps this toolchain has a default command for.
    fn capabilities(&self) -> HashSet<ToolStep>;
    /// Maps a workflow step to the command that performs it.
    fn build_action(&self, step: ToolStep) -> Option<CommandLine>;

    /// Environment variables applied to every command of this toolchain.
    fn env_vars(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }
}

/// All known toolchains plus the operator's per-step overrides.
#[derive(Debug, Default)]
pub struct ToolchainRegistry {
    toolchains: HashMap<String, Box<dyn Toolchain>>,
    overrides: HashMap<ToolStep, CommandLine>,
}

impl ToolchainRegistry {
    pub fn with_overrides(overrides: HashMap<ToolStep, CommandLine>) -> Self {
        Self {
            toolchains: HashMap::new(),
            overrides,
        }
    }

    /// Registers a new toolchain into the registry.
    pub fn register(&mut self, toolchain: Box<dyn Toolchain>) {
        self.toolchains
            .insert(toolchain.name().to_string(), toolchain);
    }

    /// Verifies every workflow step resolves to a command for toolchain `name`.
    ///
    /// # Errors
    /// Returns an error naming the uncovered steps.
    #[instrument(skip(self))]
    pub fn ensure_supports(&self, name: &str) -> Result<()> {
        let capabilities = self
            .toolchains
            .get(name)
            .map(|t| t.capabilities())
            .unwrap_or_default();
        debug!("toolchain '{}' capabilities: {:?}", name, capabilities);

        let missing: Vec<&str> = ToolStep::ALL
            .into_iter()
            .filter(|step| !self.overrides.contains_key(step) && !capabilities.contains(step))
            .map(|step| step.as_str())
            .collect();

        if missing.is_empty() {
            return Ok(());
        }

        if !self.toolchains.contains_key(name) {
            bail!(
                "toolchain '{}' is not built in; [toolchain.commands] must define: {}",
                name,
                missing.join(", ")
            );
        }

        bail!(
            "toolchain '{}' has no command for: {}",
            name,
            missing.join(", ")
        )
    }

    /// Resolves the command for `step`, preferring an override over the toolchain default.
    pub fn build_action(&self, name: &str, step: ToolStep) -> Option<CommandLine> {
        let toolchain = self.toolchains.get(name);
        let mut action = match self.overrides.get(&step) {
            Some(cmd) => cmd.clone(),
            None => toolchain?.build_action(step)?,
        };

        if let Some(toolchain) = toolchain {
            // Toolchain-wide envs first so action-specific envs win.
            let mut merged_env = toolchain.env_vars();
            merged_env.extend(action.env);
            action.env = merged_env;
        }
        Some(action)
    }
}
