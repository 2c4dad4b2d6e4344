use std::{fs, path::Path};

use anyhow::{anyhow, Context, Result};

use crate::Cli;
use tracing::{info, instrument};

/// Runs the `init` command to write a starter `cascade.toml`.
#[instrument(skip(cli))]
pub fn run(cli: &Cli, template_selector: Option<&str>) -> Result<()> {
    let template = match template_selector {
        Some(value) => InitTemplate::from_str(value)?,
        None => InitTemplate::Sphinx,
    };

    let config_content = template.render_config();
    if cli.stdout {
        print!("{config_content}");
        return Ok(());
    }

    write_if_absent(&cli.config, config_content, cli.force)
        .with_context(|| format!("failed to write '{}'", cli.config))?;

    info!(target: "cascade",
        "init complete: template={}, config={}",
        template.as_str(),
        cli.config
    );
    println!("next: run 'cascade list' to review the deployment sets");

    Ok(())
}

/// Starter catalogs for `init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitTemplate {
    /// The Bananapus protocol family deployed with Sphinx.
    Sphinx,
    /// A single repository driven by make targets.
    Minimal,
}

impl InitTemplate {
    fn from_str(value: &str) -> Result<Self> {
        match value {
            "sphinx" | "nana" => Ok(Self::Sphinx),
            "minimal" => Ok(Self::Minimal),
            other => Err(anyhow!(
                "unknown init template '{}' (supported: sphinx,minimal)",
                other
            )),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Sphinx => "sphinx",
            Self::Minimal => "minimal",
        }
    }

    pub fn render_config(self) -> &'static str {
        match self {
            Self::Sphinx => SPHINX_CATALOG,
            Self::Minimal => MINIMAL_CATALOG,
        }
    }
}

const SPHINX_CATALOG: &str = r#"[workspace]
root = "temp_repos"
env_file = ".env"
cache_dir = "cache"

[git]
host = "github.com"
# protocol = "ssh"
# branch = "feat/sphinx"
commit_message = "ci: bump version and deployment"

[toolchain]
name = "node"
terminal = ["alacritty", "-e"]

[workflow]
manifest = "package.json"
artifacts_dir = "deployments"
settle_delay_secs = 5
push_delay_secs = 5
revert_version_on_abort = false

[repositories."Bananapus/nana-core"]

[repositories."Bananapus/nana-721-hook"]
depends_on = ["Bananapus/nana-core"]

[repositories."Bananapus/nana-suckers"]
depends_on = ["Bananapus/nana-core"]

[repositories."xBA5ED/croptop-core"]
depends_on = ["Bananapus/nana-721-hook", "Bananapus/nana-suckers"]

[repositories."rev-net/revnet-core"]
depends_on = ["xBA5ED/croptop-core"]

[repositories."mejango/bannyverse-core"]

[repositories."Bananapus/fee-project-deployer"]

[[sets]]
name = "nana-core"
from = ["Bananapus/nana-core"]

[[sets]]
name = "nana-721"
from = ["Bananapus/nana-721-hook"]

[[sets]]
name = "nana-suckers"
from = ["Bananapus/nana-suckers"]

[[sets]]
name = "croptop-core"
from = ["xBA5ED/croptop-core"]

[[sets]]
name = "revnet-core"
from = ["rev-net/revnet-core"]

[[sets]]
name = "special: create bannyverse project"
from = ["mejango/bannyverse-core"]
include_dependents = false

[[sets]]
name = "special: create fee project (nana)"
from = ["Bananapus/fee-project-deployer"]
include_dependents = false
"#;

const MINIMAL_CATALOG: &str = r#"[workspace]
root = "temp_repos"

[git]
protocol = "ssh"

[toolchain]
name = "make"

# Targets without a built-in toolchain spell out every step.
[toolchain.commands]
install = ["make", "install"]
bootstrap = ["make", "bootstrap"]
artifacts = ["make", "artifacts"]
deploy = ["make", "deploy"]

[repositories."my-org/my-contracts"]

[[sets]]
name = "my-contracts"
from = ["my-org/my-contracts"]
"#;

fn write_if_absent(path: &str, content: &str, force: bool) -> Result<()> {
    let output = Path::new(path);

    if output.exists() && !force {
        return Err(anyhow!(
            "'{}' already exists. Re-run with --force to overwrite",
            path
        ));
    }

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory '{}'", parent.display()))?;
    }

    fs::write(output, content)
        .with_context(|| format!("failed to write file '{}'", output.display()))
}
