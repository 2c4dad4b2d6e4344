use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Transport used to build clone URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Ssh,
    Https,
}

impl Default for Protocol {
    fn default() -> Self {
        Self::Ssh
    }
}

impl Protocol {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ssh => "ssh",
            Self::Https => "https",
        }
    }

    /// The string a repository path is appended to, e.g. `git@github.com:`.
    pub fn url_prefix(self, host: &str) -> String {
        match self {
            Self::Ssh => format!("git@{host}:"),
            Self::Https => format!("https://{host}/"),
        }
    }
}

impl Display for Protocol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "ssh" => Ok(Self::Ssh),
            "https" | "http" => Ok(Self::Https),
            other => Err(format!("unknown protocol '{other}' (expected ssh or https)")),
        }
    }
}
