use std::fmt::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use clap::Parser;

use cascade_core::{constants, CascadeConfig, ProcessRunner, Protocol, ToolchainRegistry};
use cascade_registry::Registry;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod init;
mod prompt;
mod session;
mod styles;
#[cfg(test)]
mod testing;
mod workflow;

use prompt::TerminalPrompter;
use session::{Session, SessionOptions, SessionOutcome, SessionReport};
use styles as s;
use workflow::RepoOutcome;

/// The command-line interface for Cascade.
#[derive(Debug, Parser)]
#[command(name = "cascade")]
#[command(version)]
#[command(styles = s::get_clap_styles())]
#[command(
    help_template = "{bin} {version}\n\n{about-with-newline}{usage-heading} {usage}\n\n{all-args}{after-help}"
)]
#[command(about = "Operator-driven deployment of dependent repositories")]
#[command(
    long_about = "Cascade walks an ordered set of repositories and, for each one, clones it,
prepares it, launches its deployment, verifies the deployment artifacts, bumps
its version and commits the result. Every checkpoint waits for the operator.

Common Commands:
  deploy            Run a deployment session (default)
  list              Show every deployment set in the order it deploys
  init              Write a starter cascade.toml in the current directory
"
)]
#[command(
    after_help = "\x1b[1;32mExamples:\x1b[0m\n  \x1b[36mcascade init\x1b[0m                      \x1b[2m# Write the default catalog\x1b[0m\n  \x1b[36mcascade list\x1b[0m                      \x1b[2m# Review deployment sets\x1b[0m\n  \x1b[36mcascade deploy nana-core\x1b[0m          \x1b[2m# Deploy nana-core and its dependents\x1b[0m\n  \x1b[36mcascade --dry-run --set revnet-core\x1b[0m \x1b[2m# Walk a set without running anything\x1b[0m"
)]
pub(crate) struct Cli {
    /// One of `deploy`, `list` or `init`. Defaults to `deploy`.
    command: Option<String>,
    /// Deployment set for `deploy`, template for `init` (supports `cascade deploy nana-core`)
    selector: Option<String>,
    /// Path to cascade config file.
    #[arg(long, default_value = constants::CONFIG_FILE)]
    config: String,
    /// Log every command instead of running it; no files are written.
    #[arg(long, default_value_t = false)]
    dry_run: bool,
    /// Deployment set to run, skipping the selection menu.
    #[arg(long)]
    set: Option<String>,
    /// Git transport, skipping the protocol question.
    #[arg(long)]
    protocol: Option<Protocol>,
    /// Override the workspace root from the config.
    #[arg(long)]
    workspace: Option<PathBuf>,
    /// Overwrite generated files if they already exist.
    #[arg(long, default_value_t = false)]
    force: bool,
    /// Print the generated config to stdout instead of writing it.
    #[arg(long, default_value_t = false)]
    stdout: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Deploy,
    List,
    Init,
}

impl FromStr for Action {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "deploy" => Ok(Self::Deploy),
            "list" => Ok(Self::List),
            "init" => Ok(Self::Init),
            other => Err(anyhow!(
                "unknown command '{}' (supported: deploy,list,init)",
                other
            )),
        }
    }
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();
    debug!("parsed cli arguments: {:?}", cli);

    let action = match &cli.command {
        Some(cmd) => Action::from_str(cmd)?,
        None => Action::Deploy,
    };

    match action {
        Action::Init => {
            init::run(&cli, cli.selector.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
        Action::List => {
            let cfg = load_config(&cli)?;
            let registry = Registry::from_config(&cfg)?;
            print!("{}", render_sets(&registry));
            Ok(ExitCode::SUCCESS)
        }
        Action::Deploy => deploy(&cli),
    }
}

fn load_config(cli: &Cli) -> Result<CascadeConfig> {
    let mut cfg = CascadeConfig::load_from_file(&cli.config)
        .with_context(|| format!("unable to load config '{}'", cli.config))?;
    if let Some(root) = &cli.workspace {
        cfg.workspace.root = root.clone();
    }
    Ok(cfg)
}

fn build_toolchains(cfg: &CascadeConfig) -> Result<ToolchainRegistry> {
    let mut toolchains = ToolchainRegistry::with_overrides(cfg.toolchain.overrides()?);
    toolchains.register(Box::new(cascade_ext_node::NodeToolchain::new()));
    toolchains.ensure_supports(&cfg.toolchain.name)?;
    Ok(toolchains)
}

fn deploy(cli: &Cli) -> Result<ExitCode> {
    let cfg = load_config(cli)?;
    let registry = Registry::from_config(&cfg)?;
    let toolchains = build_toolchains(&cfg)?;
    let runner = if cli.dry_run {
        ProcessRunner::dry_run()
    } else {
        ProcessRunner::live()
    };

    let options = SessionOptions {
        protocol: cli.protocol,
        set: cli.set.clone().or_else(|| cli.selector.clone()),
    };
    let mut prompter = TerminalPrompter::stdin();
    let report = Session::new(&cfg, &registry, &runner, &toolchains).run(&options, &mut prompter)?;

    print!("{}", render_report(&report));
    Ok(report.outcome.exit_code())
}

/// Lists every deployment set with its repositories in deployment order.
fn render_sets(registry: &Registry) -> String {
    let mut out = String::new();
    for (i, set) in registry.list_options().iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, set.name);
        for repo in &set.repositories {
            let _ = writeln!(out, "     {repo}");
        }
    }
    out
}

fn render_report(report: &SessionReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "set '{}':", report.set);
    for (repo, outcome) in &report.results {
        let line = match outcome {
            RepoOutcome::Committed {
                version,
                pushed: true,
                ..
            } => format!("committed {version} and pushed"),
            RepoOutcome::Committed {
                version,
                pushed: false,
                ..
            } => format!("committed {version} locally (push failed)"),
            RepoOutcome::Skipped => "no artifact changes; nothing committed".to_string(),
            RepoOutcome::Aborted(reason) => reason.to_string(),
        };
        let _ = writeln!(out, " - {repo}: {line}");
    }

    let summary = match &report.outcome {
        SessionOutcome::Completed => "session complete".to_string(),
        SessionOutcome::Stopped { repo } => format!("session stopped after {repo}"),
        SessionOutcome::Aborted { repo, .. } => format!("session aborted at {repo}"),
    };
    let _ = writeln!(out, "{summary}");
    if report.cleaned_up {
        let _ = writeln!(out, "workspace removed");
    }
    out
}
