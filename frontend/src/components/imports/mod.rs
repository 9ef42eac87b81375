//! Import wizard: root module wiring the Yew `Component` implementation with
//! submodules for state, update logic and view rendering.
//!
//! The user picks an entity type and a CSV file; the file goes to
//! `POST /api/imports/upload` as multipart (`meta` then `file`), after which
//! the wizard polls `GET /api/imports/status/{job_id}` until the job is
//! finished and shows its report. Below the form, recent imports load page by
//! page as the list is scrolled.

use yew::prelude::*;

mod messages;
mod state;
mod update;
mod view;

pub use messages::Msg;
pub use state::ImportWizard;

impl Component for ImportWizard {
    type Message = Msg;
    type Properties = ();

    fn create(_ctx: &Context<Self>) -> Self {
        ImportWizard::new()
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        update::update(self, ctx, msg)
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        view::view(self, ctx)
    }
}
