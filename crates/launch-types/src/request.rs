use std::path::{Path, PathBuf};

/// Snapshot of the three input lists taken when a batch is launched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunRequest {
    pub scripts: Vec<String>,
    pub script_dirs: Vec<String>,
    pub target_dirs: Vec<String>,
}

/// One (target dir, script, script dir) triple with its composed script path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate<'a> {
    pub target_dir: &'a str,
    pub script: &'a str,
    pub script_dir: &'a str,
    pub path: PathBuf,
}

impl RunRequest {
    pub fn from_text(scripts: &str, script_dirs: &str, target_dirs: &str) -> Self {
        Self {
            scripts: split_entries(scripts),
            script_dirs: split_entries(script_dirs),
            target_dirs: split_entries(target_dirs),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty() || self.script_dirs.is_empty() || self.target_dirs.is_empty()
    }

    /// Every triple in launch order: target dirs outermost, then scripts, then
    /// script dirs. The log order of a batch follows this order exactly.
    pub fn candidates(&self) -> impl Iterator<Item = Candidate<'_>> + '_ {
        self.target_dirs.iter().flat_map(move |target_dir| {
            self.scripts.iter().flat_map(move |script| {
                self.script_dirs.iter().map(move |script_dir| Candidate {
                    target_dir: target_dir.as_str(),
                    script: script.as_str(),
                    script_dir: script_dir.as_str(),
                    path: Path::new(script_dir).join(script),
                })
            })
        })
    }
}

/// Splits raw multi-line input into entries. Surrounding whitespace is
/// trimmed and blank lines are dropped; duplicates and order are kept.
pub fn split_entries(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
