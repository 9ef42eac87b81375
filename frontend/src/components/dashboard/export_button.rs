//! Button that downloads one dashboard export as a file.

use crate::api::{self, ApiFailure};
use crate::helpers::download_bytes;
use chrono::{NaiveDate, Utc};
use common::model::export::{export_filename, DashboardExportType, ExportFormat};
use common::requests::DashboardExportRequest;
use gloo_console::error;
use yew::platform::spawn_local;
use yew::prelude::*;

#[derive(Properties, PartialEq, Clone)]
pub struct ExportButtonProps {
    pub kind: DashboardExportType,
    pub label: AttrValue,
    #[prop_or_default]
    pub start_date: Option<NaiveDate>,
    #[prop_or_default]
    pub end_date: Option<NaiveDate>,
}

pub enum Msg {
    Export,
    Finished,
}

pub struct ExportButton {
    loading: bool,
}

async fn fetch_export(request: DashboardExportRequest) -> Result<(), String> {
    let resp = api::post("/api/dashboard/export", &request)
        .await
        .map_err(|e: ApiFailure| e.to_string())?;
    let bytes = resp.binary().await.map_err(|e| e.to_string())?;
    let filename = export_filename(request.kind, Utc::now().date_naive(), request.format);
    download_bytes(&bytes, request.format.content_type(), &filename)
        .map_err(|e| format!("{:?}", e))
}

impl Component for ExportButton {
    type Message = Msg;
    type Properties = ExportButtonProps;

    fn create(_ctx: &Context<Self>) -> Self {
        Self { loading: false }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::Export => {
                if self.loading {
                    return false;
                }
                self.loading = true;
                let props = ctx.props();
                let request = DashboardExportRequest {
                    kind: props.kind,
                    start_date: props.start_date,
                    end_date: props.end_date,
                    format: ExportFormat::Csv,
                };
                let link = ctx.link().clone();
                spawn_local(async move {
                    if let Err(err) = fetch_export(request).await {
                        error!(format!("Export failed: {}", err));
                    }
                    link.send_message(Msg::Finished);
                });
                true
            }
            Msg::Finished => {
                self.loading = false;
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        html! {
            <button class="export-button"
                disabled={self.loading}
                onclick={ctx.link().callback(|_| Msg::Export)}>
                { if self.loading { "Exporting…".into() } else { ctx.props().label.clone() } }
            </button>
        }
    }
}
