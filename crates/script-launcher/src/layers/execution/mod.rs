mod attempt;
mod batch_log;
mod launcher;
mod runner;

pub(crate) use batch_log::BatchLog;
pub(crate) use runner::{run_batch, BatchSummary};
