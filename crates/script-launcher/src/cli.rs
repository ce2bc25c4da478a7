use clap::{Parser, Subcommand};
use launch_types::{RunRequest, Session};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "script-launcher",
    version,
    about = "Run scripts across many directories and watch the batch log"
)]
pub(crate) struct Args {
    /// Launcher config (TOML). Built-in defaults are used when omitted.
    #[arg(long, global = true)]
    pub(crate) config: Option<PathBuf>,
    #[arg(long, global = true, default_value = "logs")]
    pub(crate) trace_dir: PathBuf,
    #[arg(long, global = true, default_value_t = false)]
    pub(crate) log_to_stderr: bool,
    #[command(subcommand)]
    pub(crate) command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Interactive terminal UI (default).
    Ui {
        #[arg(long)]
        session: Option<PathBuf>,
    },
    /// Run one batch headless, tailing its log to stdout.
    Run(RunArgs),
    /// List the subdirectories of a folder as target directories.
    ImportDirs {
        folder: PathBuf,
        /// Write the list into this session's target_dirs instead of printing.
        #[arg(long)]
        session: Option<PathBuf>,
    },
    /// Follow a batch log until Ctrl+C.
    Tail { log: PathBuf },
}

#[derive(clap::Args, Debug)]
pub(crate) struct RunArgs {
    #[arg(long)]
    pub(crate) session: Option<PathBuf>,
    #[arg(long = "script")]
    pub(crate) scripts: Vec<String>,
    #[arg(long = "script-dir")]
    pub(crate) script_dirs: Vec<String>,
    #[arg(long = "target-dir")]
    pub(crate) target_dirs: Vec<String>,
}

impl RunArgs {
    /// The session's lists (if any) followed by the command-line entries.
    pub(crate) fn request(&self) -> anyhow::Result<RunRequest> {
        let mut request = match &self.session {
            Some(path) => Session::load(path)?.to_request(),
            None => RunRequest::default(),
        };
        request.scripts.extend(non_blank(&self.scripts));
        request.script_dirs.extend(non_blank(&self.script_dirs));
        request.target_dirs.extend(non_blank(&self.target_dirs));
        Ok(request)
    }
}

fn non_blank(values: &[String]) -> impl Iterator<Item = String> + '_ {
    values
        .iter()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
