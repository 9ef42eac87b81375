//! Client portal home: the signed-in client's projects.

use crate::api;
use crate::helpers::report_failure;
use common::model::portal::PortalOverview;
use yew::platform::spawn_local;
use yew::prelude::*;

pub enum Msg {
    Loaded(PortalOverview),
}

pub struct PortalPage {
    overview: Option<PortalOverview>,
}

impl Component for PortalPage {
    type Message = Msg;
    type Properties = ();

    fn create(ctx: &Context<Self>) -> Self {
        let link = ctx.link().clone();
        spawn_local(async move {
            match api::get_json::<PortalOverview>("/api/portal/me").await {
                Ok(overview) => link.send_message(Msg::Loaded(overview)),
                Err(err) => report_failure("Could not load your portal", &err),
            }
        });
        Self { overview: None }
    }

    fn update(&mut self, _ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::Loaded(overview) => {
                self.overview = Some(overview);
                true
            }
        }
    }

    fn view(&self, _ctx: &Context<Self>) -> Html {
        let Some(overview) = &self.overview else {
            return html! { <p class="loading">{ "Loading…" }</p> };
        };

        let Some(client) = &overview.client else {
            // account not linked to a client yet
            return html! {
                <section class="portal">
                    <p class="notice">{ overview.message.clone().unwrap_or_default() }</p>
                </section>
            };
        };

        html! {
            <section class="portal">
                <h1>{ &client.name }</h1>
                if overview.projects.is_empty() {
                    <p>{ "No projects yet." }</p>
                } else {
                    <table class="projects">
                        <thead><tr><th>{ "Project" }</th><th>{ "Status" }</th></tr></thead>
                        <tbody>
                            { for overview.projects.iter().map(|p| html! {
                                <tr key={p.id.to_string()}>
                                    <td>{ &p.name }</td>
                                    <td>{ &p.status }</td>
                                </tr>
                            }) }
                        </tbody>
                    </table>
                }
            </section>
        }
    }
}
