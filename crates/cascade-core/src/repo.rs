use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::Protocol;

/// An `owner/name` repository identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepositoryRef {
    owner: String,
    name: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepoRefParseError {
    #[error("repository '{0}' must have the form owner/name")]
    Malformed(String),
}

impl RepositoryRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn clone_url(&self, protocol: Protocol, host: &str) -> String {
        format!("{}{}", protocol.url_prefix(host), self)
    }

    /// The working-copy directory this repository is cloned into under `root`.
    pub fn working_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.name)
    }
}

impl Display for RepositoryRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepositoryRef {
    type Err = RepoRefParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let malformed = || RepoRefParseError::Malformed(value.to_string());
        let (owner, name) = value.split_once('/').ok_or_else(malformed)?;
        let valid = |part: &str| {
            !part.is_empty() && !part.contains('/') && part != "." && part != ".."
        };
        if !valid(owner) || !valid(name) {
            return Err(malformed());
        }
        Ok(Self::new(owner, name))
    }
}

impl TryFrom<String> for RepositoryRef {
    type Error = RepoRefParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RepositoryRef> for String {
    fn from(value: RepositoryRef) -> Self {
        value.to_string()
    }
}
