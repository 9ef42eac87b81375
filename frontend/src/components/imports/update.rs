//! Update function for the import wizard.
//!
//! Network effects are started with `spawn_local` and report back through
//! `Msg`s; every state transition goes through [`ImportFlow`](super::state::ImportFlow).

use gloo_net::http::Request;
use gloo_timers::future::TimeoutFuture;
use wasm_bindgen::JsValue;
use web_sys::{FormData, HtmlInputElement};
use yew::platform::spawn_local;
use yew::prelude::*;

use common::jobs::JobStatus;
use common::model::import::{ImportAccepted, ImportEntityType};
use common::model::pagination::Page;
use common::requests::ImportUploadMeta;
use uuid::Uuid;

use crate::api::{self, ApiFailure};
use crate::helpers::{report_failure, show_toast};

use super::messages::Msg;
use super::state::{ImportWizard, Stage, POLL_INTERVAL_MS, RECENT_PAGE_SIZE};

const UPLOAD_URL: &str = "/api/imports/upload";

fn js_failure(err: JsValue) -> ApiFailure {
    ApiFailure::Network(format!("{:?}", err))
}

async fn upload(entity: ImportEntityType, file: web_sys::File) -> Result<ImportAccepted, ApiFailure> {
    let meta = serde_json::to_string(&ImportUploadMeta { entity_type: entity })
        .map_err(|e| ApiFailure::Network(e.to_string()))?;
    let form = FormData::new().map_err(js_failure)?;
    // the server reads `meta` before `file`
    form.append_with_str("meta", &meta).map_err(js_failure)?;
    form.append_with_blob_and_filename("file", &file, &file.name())
        .map_err(js_failure)?;

    let resp = Request::post(UPLOAD_URL).body(form)?.send().await?;
    Ok(api::ensure_ok(resp).await?.json::<ImportAccepted>().await?)
}

fn schedule_poll(ctx: &Context<ImportWizard>, job_id: Uuid) {
    let link = ctx.link().clone();
    spawn_local(async move {
        TimeoutFuture::new(POLL_INTERVAL_MS).await;
        link.send_message(Msg::Poll(job_id));
    });
}

fn fetch_recent(ctx: &Context<ImportWizard>, page: u32) {
    let link = ctx.link().clone();
    spawn_local(async move {
        let url = format!("/api/imports/recent?page={}&limit={}", page, RECENT_PAGE_SIZE);
        match api::get_json::<Page<common::model::import::ImportJob>>(&url).await {
            Ok(page) => link.send_message(Msg::RecentLoaded(page)),
            Err(err) => link.send_message(Msg::RecentFailed(err)),
        }
    });
}

fn announce(status: &JobStatus) {
    match status {
        JobStatus::Completed(report) if report.errors.is_empty() => show_toast(&format!(
            "Import finished: {} row(s) imported.",
            report.imported_rows
        )),
        JobStatus::Completed(report) => show_toast(&format!(
            "Import finished: {} of {} row(s) imported, {} error(s).",
            report.imported_rows,
            report.total_rows,
            report.errors.len()
        )),
        JobStatus::Failed(reason) => show_toast(&format!("Import failed: {}", reason)),
        JobStatus::Pending | JobStatus::InProgress(_) => {}
    }
}

pub fn update(component: &mut ImportWizard, ctx: &Context<ImportWizard>, msg: Msg) -> bool {
    match msg {
        Msg::SelectEntity(entity) => component.flow.select_entity(entity),
        Msg::FileChosen(file) => {
            let name = file.as_ref().map(|f| f.name());
            if component.flow.select_file(name) {
                component.file = file;
                true
            } else {
                false
            }
        }
        Msg::Upload => {
            let Some(file) = component.file.clone() else {
                return false;
            };
            if !component.flow.start_upload() {
                return false;
            }
            let entity = component.flow.entity;
            let link = ctx.link().clone();
            spawn_local(async move {
                match upload(entity, file).await {
                    Ok(accepted) => link.send_message(Msg::Accepted(accepted.job_id)),
                    Err(err) => link.send_message(Msg::Rejected(err)),
                }
            });
            true
        }
        Msg::Accepted(job_id) => {
            component.flow.accepted(job_id);
            schedule_poll(ctx, job_id);
            true
        }
        Msg::Rejected(failure) => {
            if failure == ApiFailure::Unauthorized {
                report_failure("Upload failed", &failure);
            }
            component.flow.rejected(&failure);
            true
        }
        Msg::Poll(job_id) => {
            let link = ctx.link().clone();
            spawn_local(async move {
                let url = format!("/api/imports/status/{}", job_id);
                match api::get_json::<JobStatus>(&url).await {
                    Ok(status) => link.send_message(Msg::Status(job_id, status)),
                    Err(err) => link.send_message(Msg::PollFailed(err)),
                }
            });
            false
        }
        Msg::Status(job_id, status) => {
            if component.flow.status_received(job_id, status) {
                schedule_poll(ctx, job_id);
            } else if let Stage::Finished { status, .. } = &component.flow.stage {
                announce(status);
                fetch_recent(ctx, 1);
            }
            true
        }
        Msg::PollFailed(failure) => {
            if matches!(component.flow.stage, Stage::Processing { .. }) {
                report_failure("Lost track of the import", &failure);
                component.flow.rejected(&failure);
            }
            true
        }
        Msg::Reset => {
            component.flow.reset();
            if component.flow.stage == Stage::Select {
                component.file = None;
                if let Some(input) = component.file_input_ref.cast::<HtmlInputElement>() {
                    input.set_value("");
                }
            }
            true
        }
        Msg::LoadRecent => {
            if component.recent_fetching || !component.recent_has_next {
                return false;
            }
            component.recent_fetching = true;
            fetch_recent(ctx, component.recent_page + 1);
            true
        }
        Msg::RecentLoaded(page) => {
            let has_next = page.has_next();
            if page.page == 1 {
                component.recent = page.items;
            } else if page.page == component.recent_page + 1 {
                component.recent.extend(page.items);
            } else {
                return false;
            }
            component.recent_page = page.page;
            component.recent_has_next = has_next;
            component.recent_fetching = false;
            true
        }
        Msg::RecentFailed(failure) => {
            component.recent_fetching = false;
            component.recent_has_next = false;
            report_failure("Could not load recent imports", &failure);
            true
        }
    }
}
