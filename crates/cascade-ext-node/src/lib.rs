use std::collections::HashSet;

use cascade_core::{CommandLine, ToolStep, Toolchain};

/// npm-driven projects deployed with Sphinx.
#[derive(Debug, Default)]
pub struct NodeToolchain;

impl NodeToolchain {
    pub fn new() -> Self {
        Self
    }
}

impl Toolchain for NodeToolchain {
    fn name(&self) -> &str {
        "node"
    }

    fn capabilities(&self) -> HashSet<ToolStep> {
        ToolStep::ALL.into_iter().collect()
    }

    fn build_action(&self, step: ToolStep) -> Option<CommandLine> {
        Some(build_command(step))
    }
}

pub fn build_command(step: ToolStep) -> CommandLine {
    match step {
        ToolStep::Install => CommandLine::new("npm").arg("i"),
        ToolStep::Bootstrap => CommandLine::new("npx").args(["sphinx", "install"]),
        ToolStep::FetchArtifacts => CommandLine::new("npm").args(["run", "artifacts"]),
        ToolStep::Deploy => CommandLine::new("npm").args(["run", "deploy:testnets"]),
    }
}
