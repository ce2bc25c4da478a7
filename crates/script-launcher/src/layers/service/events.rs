use std::path::PathBuf;
use uuid::Uuid;

use crate::layers::execution::BatchSummary;

pub(crate) enum BatchEvent {
    Finished {
        id: Uuid,
        log_path: PathBuf,
        result: anyhow::Result<BatchSummary>,
    },
}
