use launch_types::{InterpreterCommand, LauncherConfig};
use std::path::Path;
use tokio::process::Command;

/// How a script file gets started. Resolved once per attempt from the
/// script's extension; scripts are never run through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Launcher {
    Interpreter(InterpreterCommand),
    Direct,
}

impl Launcher {
    pub(crate) fn resolve(script: &str, config: &LauncherConfig) -> Self {
        Path::new(script)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| config.interpreter_for(ext))
            .map(|interpreter| Launcher::Interpreter(interpreter.clone()))
            .unwrap_or(Launcher::Direct)
    }

    pub(crate) fn command(&self, script_path: &Path, cwd: &Path) -> Command {
        let mut cmd = match self {
            Launcher::Interpreter(interpreter) => {
                let mut cmd = Command::new(&interpreter.program);
                cmd.args(&interpreter.args).arg(script_path);
                cmd
            }
            Launcher::Direct => Command::new(script_path),
        };
        cmd.current_dir(cwd);
        cmd
    }

    pub(crate) fn describe(&self, script_path: &Path) -> String {
        match self {
            Launcher::Interpreter(interpreter) => {
                let mut parts = vec![interpreter.program.clone()];
                parts.extend(interpreter.args.iter().cloned());
                parts.push(script_path.display().to_string());
                parts.join(" ")
            }
            Launcher::Direct => script_path.display().to_string(),
        }
    }
}
