use crate::api;
use crate::components::chat::ChatPage;
use crate::components::dashboard::DashboardPage;
use crate::components::imports::ImportWizard;
use crate::components::login::LoginPage;
use crate::components::portal::PortalPage;
use crate::helpers::{redirect, show_toast, LOGIN_PATH};
use uuid::Uuid;
use yew::platform::spawn_local;
use yew::{html, Component, Context, Html};

/// Page selected from `window.location.pathname`.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    Login,
    Dashboard,
    Imports,
    Chat(Option<Uuid>),
    Portal,
    NotFound,
}

impl Route {
    pub fn from_path(path: &str) -> Self {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [] | ["dashboard"] => Route::Dashboard,
            ["login"] => Route::Login,
            ["imports"] => Route::Imports,
            ["chat"] => Route::Chat(None),
            ["chat", id] => match Uuid::parse_str(id) {
                Ok(id) => Route::Chat(Some(id)),
                Err(_) => Route::NotFound,
            },
            ["portal"] => Route::Portal,
            _ => Route::NotFound,
        }
    }

    fn current() -> Self {
        web_sys::window()
            .and_then(|w| w.location().pathname().ok())
            .map(|p| Route::from_path(&p))
            .unwrap_or(Route::NotFound)
    }
}

pub enum Msg {
    Logout,
}

pub struct App {
    route: Route,
}

impl Component for App {
    type Message = Msg;
    type Properties = ();

    fn create(_ctx: &Context<Self>) -> Self {
        Self {
            route: Route::current(),
        }
    }

    fn update(&mut self, _ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::Logout => {
                spawn_local(async move {
                    match api::post("/api/auth/logout", &()).await {
                        Ok(_) | Err(api::ApiFailure::Unauthorized) => redirect(LOGIN_PATH),
                        Err(err) => show_toast(&format!("Could not sign out: {}", err)),
                    }
                });
                false
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        if self.route == Route::Login {
            return html! { <LoginPage /> };
        }

        let page = match &self.route {
            Route::Dashboard => html! { <DashboardPage /> },
            Route::Imports => html! { <ImportWizard /> },
            Route::Chat(conversation) => html! { <ChatPage conversation_id={*conversation} /> },
            Route::Portal => html! { <PortalPage /> },
            Route::Login | Route::NotFound => html! { <p class="not-found">{ "Page not found." }</p> },
        };

        html! {
            <div class="app">
                <nav class="app-nav">
                    <a href="/dashboard">{ "Dashboard" }</a>
                    <a href="/imports">{ "Imports" }</a>
                    <a href="/chat">{ "Messages" }</a>
                    <a href="/portal">{ "Portal" }</a>
                    <button onclick={ctx.link().callback(|_| Msg::Logout)}>{ "Sign out" }</button>
                </nav>
                <main>{ page }</main>
            </div>
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_from_pathname() {
        assert_eq!(Route::from_path("/"), Route::Dashboard);
        assert_eq!(Route::from_path("/login"), Route::Login);
        assert_eq!(Route::from_path("/imports/"), Route::Imports);
        assert_eq!(Route::from_path("/chat"), Route::Chat(None));
        let id = Uuid::new_v4();
        assert_eq!(Route::from_path(&format!("/chat/{}", id)), Route::Chat(Some(id)));
        assert_eq!(Route::from_path("/chat/not-a-uuid"), Route::NotFound);
        assert_eq!(Route::from_path("/settings"), Route::NotFound);
    }
}
