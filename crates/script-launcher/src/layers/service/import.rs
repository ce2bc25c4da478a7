use anyhow::Context;
use std::path::{Path, PathBuf};

/// Immediate subdirectories of `folder`, sorted by path. Not recursive.
pub(crate) fn list_subdirectories(folder: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(folder)
        .with_context(|| format!("failed to list {}", folder.display()))?;
    let mut dirs = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to list {}", folder.display()))?
            .path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Target-directory input text for `folder`: one subdirectory per line.
pub(crate) fn target_dirs_text(folder: &Path) -> anyhow::Result<String> {
    let dirs = list_subdirectories(folder)?;
    Ok(dirs
        .iter()
        .map(|dir| dir.display().to_string())
        .collect::<Vec<_>>()
        .join("\n"))
}
