use anyhow::Context;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_TAIL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LauncherConfig {
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(default = "default_tail_interval", deserialize_with = "de_duration")]
    pub tail_interval: Duration,
    /// Entries from the file are layered over the built-in `py`/`pl` ones.
    #[serde(default)]
    pub interpreters: BTreeMap<String, InterpreterCommand>,
    #[serde(default)]
    pub limits: LimitsConfig,
}

impl LauncherConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let mut config: Self = toml::from_str(content)?;
        if config.tail_interval.is_zero() {
            anyhow::bail!("tail_interval must be greater than zero");
        }
        let mut interpreters = default_interpreters();
        interpreters.extend(
            std::mem::take(&mut config.interpreters)
                .into_iter()
                .map(|(ext, command)| (normalize_extension(&ext), command)),
        );
        config.interpreters = interpreters;
        Ok(config)
    }

    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Interpreter registered for a file extension, compared case-insensitively.
    pub fn interpreter_for(&self, extension: &str) -> Option<&InterpreterCommand> {
        self.interpreters.get(&normalize_extension(extension))
    }
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            tail_interval: DEFAULT_TAIL_INTERVAL,
            interpreters: default_interpreters(),
            limits: LimitsConfig::default(),
        }
    }
}

/// An interpreter program plus any leading arguments, e.g. `python3 -u`.
/// The script path is appended after `args`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct InterpreterCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl InterpreterCommand {
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let mut words = shell_words::split(raw)
            .with_context(|| format!("invalid interpreter command {raw:?}"))?
            .into_iter();
        let program = words
            .next()
            .ok_or_else(|| anyhow::anyhow!("interpreter command is empty"))?;
        Ok(Self {
            program,
            args: words.collect(),
        })
    }
}

impl TryFrom<String> for InterpreterCommand {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimitsConfig {
    #[serde(default, deserialize_with = "de_optional_duration")]
    pub timeout: Option<Duration>,
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            max_output_bytes: default_max_output_bytes(),
        }
    }
}

fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_ascii_lowercase()
}

fn default_log_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_tail_interval() -> Duration {
    DEFAULT_TAIL_INTERVAL
}

fn default_max_output_bytes() -> u64 {
    1024 * 1024
}

fn default_interpreters() -> BTreeMap<String, InterpreterCommand> {
    BTreeMap::from([
        (
            "py".to_string(),
            InterpreterCommand {
                program: "python".to_string(),
                args: Vec::new(),
            },
        ),
        (
            "pl".to_string(),
            InterpreterCommand {
                program: "perl".to_string(),
                args: Vec::new(),
            },
        ),
    ])
}

fn de_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
}

fn de_optional_duration<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    raw.map(|raw| humantime::parse_duration(&raw).map_err(serde::de::Error::custom))
        .transpose()
}
