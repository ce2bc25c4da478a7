use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::request::RunRequest;

/// The three raw text inputs, stored verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub script_files: String,
    pub target_dirs: String,
    pub script_dirs: String,
}

impl Session {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read session {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("invalid session {}", path.display()))
    }

    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        let session = serde_json::from_str(content)?;
        Ok(session)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        let payload = self.to_json()?;
        std::fs::write(path, payload)
            .with_context(|| format!("failed to write session {}", path.display()))?;
        Ok(())
    }

    pub fn to_json(&self) -> anyhow::Result<Vec<u8>> {
        let mut payload = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut payload, formatter);
        self.serialize(&mut serializer)?;
        Ok(payload)
    }

    pub fn to_request(&self) -> RunRequest {
        RunRequest::from_text(&self.script_files, &self.script_dirs, &self.target_dirs)
    }
}
