//! Sign-in form. A successful login sets the session cookie server side and
//! loads the dashboard.

use crate::api::{self, ApiFailure};
use crate::helpers::redirect;
use common::requests::LoginRequest;
use serde_json::Value;
use web_sys::{HtmlInputElement, SubmitEvent};
use yew::platform::spawn_local;
use yew::prelude::*;

pub enum Msg {
    SetEmail(String),
    SetPassword(String),
    Submit,
    Failed(String),
}

#[derive(Default)]
pub struct LoginPage {
    email: String,
    password: String,
    submitting: bool,
    error: Option<String>,
}

fn input_value(e: InputEvent) -> String {
    e.target_unchecked_into::<HtmlInputElement>().value()
}

impl Component for LoginPage {
    type Message = Msg;
    type Properties = ();

    fn create(_ctx: &Context<Self>) -> Self {
        Self::default()
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::SetEmail(email) => {
                self.email = email;
                false
            }
            Msg::SetPassword(password) => {
                self.password = password;
                false
            }
            Msg::Submit => {
                if self.submitting {
                    return false;
                }
                self.submitting = true;
                self.error = None;
                let body = LoginRequest {
                    email: self.email.trim().to_string(),
                    password: self.password.clone(),
                };
                let link = ctx.link().clone();
                spawn_local(async move {
                    match api::post_json::<_, Value>("/api/auth/login", &body).await {
                        Ok(_) => redirect("/dashboard"),
                        Err(ApiFailure::Unauthorized) => {
                            link.send_message(Msg::Failed("Incorrect email or password.".into()))
                        }
                        Err(err) => link.send_message(Msg::Failed(err.to_string())),
                    }
                });
                true
            }
            Msg::Failed(message) => {
                self.submitting = false;
                self.error = Some(message);
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let link = ctx.link();
        let onsubmit = link.callback(|e: SubmitEvent| {
            e.prevent_default();
            Msg::Submit
        });

        html! {
            <form class="login" {onsubmit}>
                <h1>{ "Sign in" }</h1>
                <label>
                    { "Email" }
                    <input type="email" autocomplete="username"
                        oninput={link.callback(|e| Msg::SetEmail(input_value(e)))} />
                </label>
                <label>
                    { "Password" }
                    <input type="password" autocomplete="current-password"
                        oninput={link.callback(|e| Msg::SetPassword(input_value(e)))} />
                </label>
                if let Some(error) = &self.error {
                    <p class="error">{ error }</p>
                }
                <button type="submit" disabled={self.submitting}>
                    { if self.submitting { "Signing in…" } else { "Sign in" } }
                </button>
            </form>
        }
    }
}
