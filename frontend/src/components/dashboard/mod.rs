//! Dashboard page: headline figures and the CSV exports.

mod export_button;

use crate::api;
use crate::helpers::report_failure;
use chrono::NaiveDate;
use common::model::dashboard::DashboardSummary;
use common::model::export::DashboardExportType;
use export_button::ExportButton;
use num_format::{Locale, ToFormattedString};
use web_sys::HtmlInputElement;
use yew::platform::spawn_local;
use yew::prelude::*;

const EXPORTS: [(DashboardExportType, &str); 4] = [
    (DashboardExportType::TimeEntries, "Time entries"),
    (DashboardExportType::Projects, "Projects"),
    (DashboardExportType::Invoices, "Invoices"),
    (DashboardExportType::Expenses, "Expense reports"),
];

pub enum Msg {
    Loaded(DashboardSummary),
    SetStart(Option<NaiveDate>),
    SetEnd(Option<NaiveDate>),
}

pub struct DashboardPage {
    summary: Option<DashboardSummary>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
}

/// An empty or unparsable `<input type="date">` means "no bound".
fn date_value(e: Event) -> Option<NaiveDate> {
    let value = e.target_unchecked_into::<HtmlInputElement>().value();
    NaiveDate::parse_from_str(&value, "%Y-%m-%d").ok()
}

fn figure(label: &str, value: String) -> Html {
    html! {
        <div class="figure">
            <span class="figure-value">{ value }</span>
            <span class="figure-label">{ label }</span>
        </div>
    }
}

impl Component for DashboardPage {
    type Message = Msg;
    type Properties = ();

    fn create(ctx: &Context<Self>) -> Self {
        let link = ctx.link().clone();
        spawn_local(async move {
            match api::get_json::<DashboardSummary>("/api/dashboard/summary").await {
                Ok(summary) => link.send_message(Msg::Loaded(summary)),
                Err(err) => report_failure("Could not load the dashboard", &err),
            }
        });
        Self {
            summary: None,
            start_date: None,
            end_date: None,
        }
    }

    fn update(&mut self, _ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::Loaded(summary) => self.summary = Some(summary),
            Msg::SetStart(date) => self.start_date = date,
            Msg::SetEnd(date) => self.end_date = date,
        }
        true
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let link = ctx.link();
        let figures = match &self.summary {
            Some(s) => html! {
                <div class="figures">
                    { figure("Employees", s.employees.to_formatted_string(&Locale::en)) }
                    { figure("Active projects", s.active_projects.to_formatted_string(&Locale::en)) }
                    { figure("Hours this month", s.hours_this_month.to_string()) }
                    { figure("Entries to validate", s.unvalidated_entries.to_formatted_string(&Locale::en)) }
                    { figure("Pending invoices", s.pending_invoices.to_formatted_string(&Locale::en)) }
                    { figure("Pending amount (TTC)", s.pending_invoices_ttc.to_string()) }
                    { figure("Open expense reports", s.open_expense_reports.to_formatted_string(&Locale::en)) }
                </div>
            },
            None => html! { <p class="loading">{ "Loading…" }</p> },
        };

        html! {
            <section class="dashboard">
                <h1>{ "Dashboard" }</h1>
                { figures }
                <h2>{ "Exports" }</h2>
                <div class="export-range">
                    <label>
                        { "From" }
                        <input type="date" onchange={link.callback(|e| Msg::SetStart(date_value(e)))} />
                    </label>
                    <label>
                        { "To" }
                        <input type="date" onchange={link.callback(|e| Msg::SetEnd(date_value(e)))} />
                    </label>
                </div>
                <div class="export-buttons">
                    { for EXPORTS.iter().map(|(kind, label)| html! {
                        <ExportButton
                            kind={*kind}
                            label={*label}
                            start_date={self.start_date}
                            end_date={self.end_date} />
                    }) }
                </div>
            </section>
        }
    }
}
