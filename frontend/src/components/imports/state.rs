//! Component state for the import wizard.
//!
//! The wizard walks through a small state machine kept in [`ImportFlow`] so the
//! transitions can be tested without a browser:
//!
//! `Select` → `Uploading` → `Processing` → `Finished`, with `Rejected` reachable
//! from the upload and from polling. `reset` goes back to `Select` from any
//! stage except an upload in flight.

use crate::api::ApiFailure;
use common::jobs::JobStatus;
use common::model::import::{ImportEntityType, ImportJob};
use common::validation::FieldError;
use uuid::Uuid;
use yew::NodeRef;

/// Delay between two status requests while a job runs.
pub const POLL_INTERVAL_MS: u32 = 1000;

/// Rows of the recent-imports list fetched per page.
pub const RECENT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Select,
    Uploading,
    Processing { job_id: Uuid, status: JobStatus },
    /// `status` is `Completed` or `Failed`.
    Finished { job_id: Uuid, status: JobStatus },
    Rejected { message: String, fields: Vec<FieldError> },
}

/// Client-side counterpart of the server's file checks, so obvious mistakes
/// are reported before anything is sent.
pub fn check_file_name(name: &str) -> Result<(), String> {
    let lower = name.to_lowercase();
    if lower.ends_with(".csv") {
        Ok(())
    } else if lower.ends_with(".xlsx") || lower.ends_with(".xls") {
        Err("Excel workbooks are not supported, save the sheet as CSV first.".into())
    } else {
        Err("Only .csv files can be imported.".into())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportFlow {
    pub entity: ImportEntityType,
    pub file_name: Option<String>,
    pub file_error: Option<String>,
    pub stage: Stage,
}

impl Default for ImportFlow {
    fn default() -> Self {
        Self {
            entity: ImportEntityType::Clients,
            file_name: None,
            file_error: None,
            stage: Stage::Select,
        }
    }
}

impl ImportFlow {
    fn is_busy(&self) -> bool {
        matches!(self.stage, Stage::Uploading | Stage::Processing { .. })
    }

    /// Returns false when the choice is locked by a running upload or job.
    pub fn select_entity(&mut self, entity: ImportEntityType) -> bool {
        if self.is_busy() {
            return false;
        }
        self.entity = entity;
        self.stage = Stage::Select;
        true
    }

    pub fn select_file(&mut self, name: Option<String>) -> bool {
        if self.is_busy() {
            return false;
        }
        self.file_error = name.as_deref().and_then(|n| check_file_name(n).err());
        self.file_name = name;
        self.stage = Stage::Select;
        true
    }

    pub fn can_upload(&self) -> bool {
        self.stage == Stage::Select && self.file_name.is_some() && self.file_error.is_none()
    }

    pub fn start_upload(&mut self) -> bool {
        if !self.can_upload() {
            return false;
        }
        self.stage = Stage::Uploading;
        true
    }

    pub fn accepted(&mut self, job_id: Uuid) {
        if self.stage == Stage::Uploading {
            self.stage = Stage::Processing {
                job_id,
                status: JobStatus::Pending,
            };
        }
    }

    pub fn rejected(&mut self, failure: &ApiFailure) {
        self.stage = match failure {
            ApiFailure::Rejected(f) => Stage::Rejected {
                message: "The file was rejected.".into(),
                fields: f.fields.clone(),
            },
            other => Stage::Rejected {
                message: other.to_string(),
                fields: Vec::new(),
            },
        };
    }

    /// Applies a polled status. Returns whether polling should continue.
    ///
    /// Answers for another job (a poll that outlived a reset) are ignored.
    pub fn status_received(&mut self, job_id: Uuid, status: JobStatus) -> bool {
        match &self.stage {
            Stage::Processing { job_id: current, .. } if *current == job_id => {}
            _ => return false,
        }
        if status.is_finished() {
            self.stage = Stage::Finished { job_id, status };
            false
        } else {
            self.stage = Stage::Processing { job_id, status };
            true
        }
    }

    pub fn reset(&mut self) {
        if self.stage == Stage::Uploading {
            return;
        }
        self.file_name = None;
        self.file_error = None;
        self.stage = Stage::Select;
    }
}

/// Main state container for the `ImportWizard` component.
pub struct ImportWizard {
    pub flow: ImportFlow,

    /// File picked in the `<input type="file">`, sent as the `file` part.
    pub file: Option<web_sys::File>,

    pub file_input_ref: NodeRef,

    /// Recent imports, newest first, grown page by page.
    pub recent: Vec<ImportJob>,
    pub recent_page: u32,
    pub recent_has_next: bool,
    pub recent_fetching: bool,
}

impl ImportWizard {
    pub fn new() -> Self {
        Self {
            flow: ImportFlow::default(),
            file: None,
            file_input_ref: NodeRef::default(),
            recent: Vec::new(),
            recent_page: 0,
            recent_has_next: true,
            recent_fetching: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::model::import::ImportReport;
    use common::validation::ValidationFailure;

    fn ready_flow() -> ImportFlow {
        let mut flow = ImportFlow::default();
        flow.select_entity(ImportEntityType::Employees);
        flow.select_file(Some("staff.csv".into()));
        flow
    }

    #[test]
    fn file_extension_gates_upload() {
        let mut flow = ImportFlow::default();
        assert!(!flow.can_upload());

        flow.select_file(Some("staff.xlsx".into()));
        assert!(flow.file_error.as_deref().unwrap_or("").contains("Excel"));
        assert!(!flow.start_upload());

        flow.select_file(Some("staff.txt".into()));
        assert!(!flow.can_upload());

        flow.select_file(Some("Staff.CSV".into()));
        assert!(flow.can_upload());
    }

    #[test]
    fn happy_path_reaches_finished() {
        let mut flow = ready_flow();
        assert!(flow.start_upload());
        assert_eq!(flow.stage, Stage::Uploading);
        assert!(!flow.select_entity(ImportEntityType::Clients));

        let job = Uuid::new_v4();
        flow.accepted(job);
        assert!(flow.status_received(job, JobStatus::InProgress(3)));
        assert_eq!(
            flow.stage,
            Stage::Processing {
                job_id: job,
                status: JobStatus::InProgress(3)
            }
        );

        let done = JobStatus::Completed(ImportReport {
            total_rows: 3,
            imported_rows: 3,
            errors: vec![],
        });
        assert!(!flow.status_received(job, done.clone()));
        assert_eq!(flow.stage, Stage::Finished { job_id: job, status: done });
        assert_eq!(flow.entity, ImportEntityType::Employees);
    }

    #[test]
    fn stale_status_is_ignored() {
        let mut flow = ready_flow();
        flow.start_upload();
        let job = Uuid::new_v4();
        flow.accepted(job);
        assert!(!flow.status_received(Uuid::new_v4(), JobStatus::Failed("x".into())));
        assert!(matches!(flow.stage, Stage::Processing { .. }));

        flow.stage = Stage::Select;
        assert!(!flow.status_received(job, JobStatus::InProgress(1)));
        assert_eq!(flow.stage, Stage::Select);
    }

    #[test]
    fn rejection_keeps_field_errors_and_allows_retry() {
        let mut flow = ready_flow();
        flow.start_upload();
        flow.rejected(&ApiFailure::Rejected(ValidationFailure::single(
            "file",
            "missing required column(s): email",
        )));
        match &flow.stage {
            Stage::Rejected { fields, .. } => assert_eq!(fields[0].field, "file"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(!flow.can_upload());

        flow.select_file(Some("fixed.csv".into()));
        assert!(flow.start_upload());
    }

    #[test]
    fn reset_waits_for_upload_answer() {
        let mut flow = ready_flow();
        flow.start_upload();
        flow.reset();
        assert_eq!(flow.stage, Stage::Uploading);

        flow.accepted(Uuid::new_v4());
        flow.reset();
        assert_eq!(flow, ImportFlow {
            entity: ImportEntityType::Employees,
            ..ImportFlow::default()
        });
    }
}
