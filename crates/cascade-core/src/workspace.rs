use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::repo::RepositoryRef;

/// A repository cloned into the session workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingCopy {
    pub repo: RepositoryRef,
    pub path: PathBuf,
}

impl WorkingCopy {
    pub fn new(repo: RepositoryRef, workspace_root: &Path) -> Self {
        let path = repo.working_dir(workspace_root);
        Self { repo, path }
    }

    /// The directory name `git clone` creates under the workspace root.
    pub fn dir_name(&self) -> &str {
        self.repo.name()
    }
}

/// Creates `path` if absent. Returns whether it had to be created.
pub fn ensure_dir(path: &Path) -> Result<bool> {
    if path.is_dir() {
        debug!("{} already exists", path.display());
        return Ok(false);
    }
    std::fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory '{}'", path.display()))?;
    Ok(true)
}

/// Copies the orchestrator's environment file into `working_copy`, keeping its file name.
pub fn copy_env_file(env_file: &Path, working_copy: &Path) -> Result<PathBuf> {
    let file_name = env_file
        .file_name()
        .with_context(|| format!("env file '{}' has no file name", env_file.display()))?;
    let dest = working_copy.join(file_name);
    std::fs::copy(env_file, &dest).with_context(|| {
        format!(
            "failed to copy '{}' to '{}'",
            env_file.display(),
            dest.display()
        )
    })?;
    Ok(dest)
}

/// Recursively deletes the session workspace root and every working copy in it.
pub fn remove_workspace(root: &Path) -> Result<()> {
    if !root.exists() {
        return Ok(());
    }
    std::fs::remove_dir_all(root)
        .with_context(|| format!("failed to remove workspace '{}'", root.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_dir_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("cache");
        assert!(ensure_dir(&cache).unwrap());
        assert!(!ensure_dir(&cache).unwrap());
        assert!(cache.is_dir());
    }

    #[test]
    fn copies_env_file_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let env = dir.path().join(".env");
        std::fs::write(&env, "PRIVATE_KEY=abc\n").unwrap();
        let copy = dir.path().join("nana-core");
        std::fs::create_dir(&copy).unwrap();

        let dest = copy_env_file(&env, &copy).unwrap();
        assert_eq!(dest, copy.join(".env"));
        assert_eq!(std::fs::read_to_string(dest).unwrap(), "PRIVATE_KEY=abc\n");
    }

    #[test]
    fn missing_env_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(copy_env_file(&dir.path().join(".env"), dir.path()).is_err());
    }

    #[test]
    fn removes_workspace_tree() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("temp_repos");
        std::fs::create_dir_all(root.join("nana-core/cache")).unwrap();

        remove_workspace(&root).unwrap();
        assert!(!root.exists());
        remove_workspace(&root).unwrap();
    }

    #[test]
    fn working_copy_lives_under_root() {
        let repo: RepositoryRef = "xBA5ED/croptop-core".parse().unwrap();
        let copy = WorkingCopy::new(repo, Path::new("/tmp/ws"));
        assert_eq!(copy.path, PathBuf::from("/tmp/ws/croptop-core"));
        assert_eq!(copy.dir_name(), "croptop-core");
    }
}
