pub mod config;
pub mod request;
pub mod session;

pub use config::{InterpreterCommand, LauncherConfig, LimitsConfig};
pub use request::{Candidate, RunRequest};
pub use session::Session;
