//! Constants used across the Cascade workspace.

/// The filename for Cascade's primary configuration.
pub const CONFIG_FILE: &str = "cascade.toml";

/// Directory under which every working copy of a session is cloned.
pub const WORKSPACE_ROOT: &str = "temp_repos";

/// Environment file copied from the orchestrator's directory into each working copy.
pub const ENV_FILE: &str = ".env";

/// Cache directory the deployment tool expects inside a working copy.
pub const CACHE_DIR: &str = "cache";

/// Package manifest carrying the version field.
pub const MANIFEST_NODE: &str = "package.json";

/// Directory the deployment tool writes artifacts into.
pub const ARTIFACTS_DIR: &str = "deployments";

pub const GIT_HOST: &str = "github.com";
pub const COMMIT_MESSAGE: &str = "ci: bump version and deployment";

/// Toolchain used when the configuration does not name one.
pub const DEFAULT_TOOLCHAIN: &str = "node";

/// Seconds to wait before asking the operator to confirm a deployment.
pub const SETTLE_DELAY_SECS: u64 = 5;
/// Seconds to wait after a push before the next repository.
pub const PUSH_DELAY_SECS: u64 = 5;
