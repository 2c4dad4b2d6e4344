use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A toolchain-provided step of the per-repository workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStep {
    /// Install package dependencies.
    Install,
    /// Bring the deployment tool up to date inside the working copy.
    Bootstrap,
    /// Pull deployment artifacts into the artifacts directory.
    #[serde(rename = "artifacts")]
    FetchArtifacts,
    /// Trigger the deployment itself.
    Deploy,
}

impl ToolStep {
    pub const ALL: [ToolStep; 4] = [
        ToolStep::Install,
        ToolStep::Bootstrap,
        ToolStep::FetchArtifacts,
        ToolStep::Deploy,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Bootstrap => "bootstrap",
            Self::FetchArtifacts => "artifacts",
            Self::Deploy => "deploy",
        }
    }
}

impl Display for ToolStep {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StepParseError {
    #[error("unknown toolchain step '{0}' (expected install, bootstrap, artifacts or deploy)")]
    Unknown(String),
}

impl FromStr for ToolStep {
    type Err = StepParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "install" => Ok(Self::Install),
            "bootstrap" => Ok(Self::Bootstrap),
            "artifacts" => Ok(Self::FetchArtifacts),
            "deploy" => Ok(Self::Deploy),
            other => Err(StepParseError::Unknown(other.to_string())),
        }
    }
}

/// An external program invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandLine {
    /// The executable program (e.g., "git", "npm").
    pub program: String,
    /// The arguments to pass to the program.
    #[serde(default)]
    pub args: Vec<String>,
    /// Extra environment variables for the child process.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Builds a command from a full argv; `None` when `argv` is empty.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(program.clone()).args(args.iter().cloned()))
    }

    /// Prepends a launcher such as `["alacritty", "-e"]` to this command.
    ///
    /// An empty prefix returns the command unchanged.
    pub fn wrapped_in(&self, prefix: &[String]) -> Self {
        let Some((launcher, launcher_args)) = prefix.split_first() else {
            return self.clone();
        };

        let mut wrapped = Self::new(launcher.clone()).args(launcher_args.iter().cloned());
        wrapped.args.push(self.program.clone());
        wrapped.args.extend(self.args.iter().cloned());
        wrapped.env = self.env.clone();
        wrapped
    }
}

impl Display for CommandLine {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{}'", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}
