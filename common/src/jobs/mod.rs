use crate::model::import::ImportReport;
use serde::{Deserialize, Serialize};

/// Live status of a background job, as polled by the client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    /// Number of data rows processed so far.
    InProgress(u32),
    Completed(ImportReport),
    Failed(String),
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, JobStatus::Completed(_) | JobStatus::Failed(_))
    }
}
