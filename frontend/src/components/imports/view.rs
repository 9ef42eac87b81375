//! View rendering for the import wizard: entity and file selection, the
//! progress of the running job, its report, and the recent imports.

use super::messages::Msg;
use super::state::{ImportWizard, Stage};
use crate::components::infinite_list::InfiniteSentinel;
use common::jobs::JobStatus;
use common::model::import::{ImportEntityType, ImportJob, ImportJobState, ImportReport};
use common::validation::FieldError;
use web_sys::{HtmlInputElement, HtmlSelectElement};
use yew::html::Scope;
use yew::prelude::*;

pub fn view(component: &ImportWizard, ctx: &Context<ImportWizard>) -> Html {
    let link = ctx.link();
    html! {
        <section class="imports">
            <h1>{ "Import data" }</h1>
            { build_form(component, link) }
            { build_stage(&component.flow.stage, link) }
            <h2>{ "Recent imports" }</h2>
            { build_recent(component, link) }
        </section>
    }
}

fn build_form(component: &ImportWizard, link: &Scope<ImportWizard>) -> Html {
    let flow = &component.flow;
    let locked = matches!(flow.stage, Stage::Uploading | Stage::Processing { .. });

    let on_entity = link.batch_callback(|e: Event| {
        let value = e.target_unchecked_into::<HtmlSelectElement>().value();
        value.parse::<ImportEntityType>().ok().map(Msg::SelectEntity)
    });
    let on_file = link.callback(|e: Event| {
        let input = e.target_unchecked_into::<HtmlInputElement>();
        Msg::FileChosen(input.files().and_then(|files| files.get(0)))
    });

    html! {
        <div class="import-form">
            <label>
                { "What are you importing?" }
                <select onchange={on_entity} disabled={locked}>
                    { for ImportEntityType::ALL.iter().map(|t| html! {
                        <option value={t.as_str()} selected={*t == flow.entity}>{ t.label() }</option>
                    }) }
                </select>
            </label>
            <a class="template-link"
                href={format!("/api/imports/templates/{}", flow.entity.as_str())}
                download="">
                { "Download the CSV template" }
            </a>
            <input type="file" accept=".csv,text/csv"
                ref={component.file_input_ref.clone()}
                onchange={on_file}
                disabled={locked} />
            if let Some(error) = &flow.file_error {
                <p class="error">{ error }</p>
            }
            <button disabled={!flow.can_upload()} onclick={link.callback(|_| Msg::Upload)}>
                { "Upload" }
            </button>
        </div>
    }
}

fn build_stage(stage: &Stage, link: &Scope<ImportWizard>) -> Html {
    let reset = html! {
        <button onclick={link.callback(|_| Msg::Reset)}>{ "Import another file" }</button>
    };
    match stage {
        Stage::Select => html! {},
        Stage::Uploading => html! { <p class="progress">{ "Uploading…" }</p> },
        Stage::Processing { status, .. } => {
            let text = match status {
                JobStatus::InProgress(rows) => format!("Processing… {} row(s) checked", rows),
                _ => "Waiting for the import to start…".to_string(),
            };
            html! { <p class="progress">{ text }</p> }
        }
        Stage::Finished { status: JobStatus::Completed(report), .. } => html! {
            <div class="import-result">
                { build_report(report) }
                { reset }
            </div>
        },
        Stage::Finished { status, .. } => {
            let reason = match status {
                JobStatus::Failed(reason) => reason.clone(),
                _ => String::new(),
            };
            html! {
                <div class="import-result failed">
                    <p class="error">{ format!("The import failed: {}", reason) }</p>
                    { reset }
                </div>
            }
        }
        Stage::Rejected { message, fields } => html! {
            <div class="import-result failed">
                <p class="error">{ message }</p>
                { build_field_errors(fields) }
                { reset }
            </div>
        },
    }
}

fn build_field_errors(fields: &[FieldError]) -> Html {
    if fields.is_empty() {
        return html! {};
    }
    html! {
        <ul class="field-errors">
            { for fields.iter().map(|f| html! { <li>{ format!("{}: {}", f.field, f.message) }</li> }) }
        </ul>
    }
}

fn build_report(report: &ImportReport) -> Html {
    html! {
        <>
            <p>{ format!("{} of {} row(s) imported.", report.imported_rows, report.total_rows) }</p>
            if !report.errors.is_empty() {
                <table class="row-errors">
                    <thead>
                        <tr><th>{ "Line" }</th><th>{ "Column" }</th><th>{ "Problem" }</th></tr>
                    </thead>
                    <tbody>
                        { for report.errors.iter().map(|e| html! {
                            <tr>
                                <td>{ e.row }</td>
                                <td>{ e.column.clone().unwrap_or_default() }</td>
                                <td>{ &e.message }</td>
                            </tr>
                        }) }
                    </tbody>
                </table>
            }
        </>
    }
}

fn state_label(state: ImportJobState) -> &'static str {
    match state {
        ImportJobState::Pending => "Pending",
        ImportJobState::Processing => "Processing",
        ImportJobState::Completed => "Completed",
        ImportJobState::CompletedWithErrors => "Completed with errors",
        ImportJobState::Failed => "Failed",
    }
}

fn build_recent_row(job: &ImportJob) -> Html {
    html! {
        <tr key={job.id.to_string()}>
            <td>{ job.created_at.format("%Y-%m-%d %H:%M").to_string() }</td>
            <td>{ job.entity_type.label() }</td>
            <td>
                <a href={format!("/api/imports/{}/file", job.id)} download="">{ &job.file_name }</a>
            </td>
            <td>{ state_label(job.state) }</td>
            <td>{ format!("{}/{}", job.imported_rows, job.total_rows) }</td>
            <td>{ job.error_count }</td>
        </tr>
    }
}

fn build_recent(component: &ImportWizard, link: &Scope<ImportWizard>) -> Html {
    html! {
        <div class="recent-imports">
            <table>
                <thead>
                    <tr>
                        <th>{ "Date" }</th>
                        <th>{ "Type" }</th>
                        <th>{ "File" }</th>
                        <th>{ "State" }</th>
                        <th>{ "Imported" }</th>
                        <th>{ "Errors" }</th>
                    </tr>
                </thead>
                <tbody>
                    { for component.recent.iter().map(build_recent_row) }
                </tbody>
            </table>
            <InfiniteSentinel
                has_next_page={component.recent_has_next}
                is_fetching_next_page={component.recent_fetching}
                on_load_more={link.callback(|_| Msg::LoadRecent)} />
        </div>
    }
}
