pub mod host;
pub mod process;
mod stream;
