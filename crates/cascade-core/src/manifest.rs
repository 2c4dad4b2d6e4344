use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

/// A JSON package manifest whose `version` field is rewritten in place.
///
/// Every other field keeps its position, and the file keeps the indentation
/// and trailing newline it was read with.
#[derive(Debug, Clone)]
pub struct VersionManifest {
    path: PathBuf,
    data: Map<String, Value>,
    indent: String,
    trailing_newline: bool,
}

impl VersionManifest {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;
        let value: Value = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse manifest: {}", path.display()))?;
        let Value::Object(data) = value else {
            return Err(anyhow!(
                "manifest {} must contain a JSON object",
                path.display()
            ));
        };

        let indent = detect_indent(&text);
        debug!("manifest {} uses indent {:?}", path.display(), indent);

        Ok(Self {
            path: path.to_path_buf(),
            data,
            indent,
            trailing_newline: text.ends_with('\n'),
        })
    }

    pub fn version(&self) -> Option<&str> {
        self.data.get("version").and_then(Value::as_str)
    }

    pub fn set_version(&mut self, version: &str) {
        self.data
            .insert("version".to_string(), Value::String(version.to_string()));
    }

    pub fn render(&self) -> Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(self.indent.as_bytes());
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.data
            .serialize(&mut serializer)
            .context("failed to serialize manifest")?;

        let mut text = String::from_utf8(buf).context("manifest is not valid UTF-8")?;
        if self.trailing_newline {
            text.push('\n');
        }
        Ok(text)
    }

    pub fn save(&self) -> Result<()> {
        let text = self.render()?;
        std::fs::write(&self.path, text)
            .with_context(|| format!("failed to write manifest: {}", self.path.display()))
    }
}

/// Leading whitespace of the first indented line, or two spaces.
fn detect_indent(text: &str) -> String {
    text.lines()
        .skip(1)
        .map(|line| {
            let trimmed = line.trim_start_matches([' ', '\t']);
            (&line[..line.len() - trimmed.len()], trimmed)
        })
        .find(|(indent, rest)| !indent.is_empty() && !rest.is_empty())
        .map(|(indent, _)| indent.to_string())
        .unwrap_or_else(|| "  ".to_string())
}
