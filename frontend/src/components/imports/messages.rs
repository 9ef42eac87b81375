use crate::api::ApiFailure;
use common::jobs::JobStatus;
use common::model::import::{ImportEntityType, ImportJob};
use common::model::pagination::Page;
use uuid::Uuid;

pub enum Msg {
    SelectEntity(ImportEntityType),
    FileChosen(Option<web_sys::File>),
    Upload,
    Accepted(Uuid),
    Rejected(ApiFailure),
    Poll(Uuid),
    Status(Uuid, JobStatus),
    PollFailed(ApiFailure),
    Reset,
    LoadRecent,
    RecentLoaded(Page<ImportJob>),
    RecentFailed(ApiFailure),
}
