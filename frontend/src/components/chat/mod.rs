//! Conversation view: history, live updates and the message form.
//!
//! History is fetched newest first, one page at a time, as the top of the list
//! scrolls into view. New messages arrive through a [`MessageBridge`] bound to
//! the open conversation; they are merged with the history by id, so a message
//! that shows up both in a page and on the stream is displayed once.

mod event_source;

use crate::api;
use crate::components::infinite_list::InfiniteSentinel;
use crate::helpers::{redirect, report_failure, show_toast};
use common::model::message::RealtimeMessage;
use common::model::pagination::Page;
use common::realtime::MessageBridge;
use common::requests::SendMessageRequest;
use common::validation::check;
use event_source::EventSourceFeed;
use uuid::Uuid;
use web_sys::{HtmlInputElement, SubmitEvent};
use yew::platform::spawn_local;
use yew::prelude::*;

const HISTORY_PAGE_SIZE: u32 = 30;

#[derive(Properties, PartialEq, Clone)]
pub struct ChatProps {
    pub conversation_id: Option<Uuid>,
}

pub enum Msg {
    Received(RealtimeMessage),
    LoadOlder,
    HistoryLoaded(Uuid, Page<RealtimeMessage>),
    HistoryFailed(api::ApiFailure),
    SetDraft(String),
    Send,
    Sent(RealtimeMessage),
    SendFailed(api::ApiFailure),
    SetTarget(String),
    OpenTarget,
}

pub struct ChatPage {
    bridge: MessageBridge<EventSourceFeed>,
    /// Oldest first.
    messages: Vec<RealtimeMessage>,
    page: u32,
    has_older: bool,
    fetching: bool,
    draft: String,
    sending: bool,
    /// Conversation id typed when none is open yet.
    target: String,
}

fn messages_url(conversation_id: Uuid) -> String {
    format!("/api/conversations/{}/messages", conversation_id)
}

impl ChatPage {
    fn reset(&mut self) {
        self.messages.clear();
        self.page = 0;
        self.has_older = true;
        self.fetching = false;
        self.draft.clear();
    }

    /// Appends `message` unless it is already displayed.
    fn push(&mut self, message: RealtimeMessage) -> bool {
        if self.messages.iter().any(|m| m.id == message.id) {
            return false;
        }
        self.messages.push(message);
        true
    }
}

impl Component for ChatPage {
    type Message = Msg;
    type Properties = ChatProps;

    fn create(ctx: &Context<Self>) -> Self {
        let link = ctx.link().clone();
        let mut bridge = MessageBridge::new(EventSourceFeed, move |message| {
            link.send_message(Msg::Received(message))
        });
        bridge.start(ctx.props().conversation_id);
        Self {
            bridge,
            messages: Vec::new(),
            page: 0,
            has_older: true,
            fetching: false,
            draft: String::new(),
            sending: false,
            target: String::new(),
        }
    }

    fn changed(&mut self, ctx: &Context<Self>, old_props: &Self::Properties) -> bool {
        if ctx.props().conversation_id != old_props.conversation_id {
            self.reset();
            self.bridge.start(ctx.props().conversation_id);
        }
        true
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        let conversation = ctx.props().conversation_id;
        match msg {
            Msg::Received(message) => self.push(message),
            Msg::LoadOlder => {
                let Some(id) = conversation else {
                    return false;
                };
                if self.fetching || !self.has_older {
                    return false;
                }
                self.fetching = true;
                let page = self.page + 1;
                let link = ctx.link().clone();
                spawn_local(async move {
                    let url = format!("{}?page={}&limit={}", messages_url(id), page, HISTORY_PAGE_SIZE);
                    match api::get_json::<Page<RealtimeMessage>>(&url).await {
                        Ok(page) => link.send_message(Msg::HistoryLoaded(id, page)),
                        Err(err) => link.send_message(Msg::HistoryFailed(err)),
                    }
                });
                true
            }
            Msg::HistoryLoaded(id, page) => {
                // a page for a conversation we already left
                if conversation != Some(id) {
                    return false;
                }
                self.fetching = false;
                self.has_older = page.has_next();
                self.page = page.page;
                let mut older: Vec<RealtimeMessage> = page
                    .items
                    .into_iter()
                    .filter(|m| !self.messages.iter().any(|known| known.id == m.id))
                    .collect();
                older.reverse();
                older.append(&mut self.messages);
                self.messages = older;
                true
            }
            Msg::HistoryFailed(failure) => {
                self.fetching = false;
                self.has_older = false;
                report_failure("Could not load the conversation", &failure);
                true
            }
            Msg::SetDraft(draft) => {
                self.draft = draft;
                false
            }
            Msg::Send => {
                let Some(id) = conversation else {
                    return false;
                };
                if self.sending {
                    return false;
                }
                let request = SendMessageRequest {
                    content: self.draft.trim().to_string(),
                    file_url: None,
                };
                if let Err(failure) = check(&request) {
                    show_toast(&failure.to_string());
                    return false;
                }
                self.sending = true;
                let link = ctx.link().clone();
                spawn_local(async move {
                    match api::post_json::<_, RealtimeMessage>(&messages_url(id), &request).await {
                        Ok(message) => link.send_message(Msg::Sent(message)),
                        Err(err) => link.send_message(Msg::SendFailed(err)),
                    }
                });
                true
            }
            Msg::Sent(message) => {
                self.sending = false;
                self.draft.clear();
                self.push(message);
                true
            }
            Msg::SendFailed(failure) => {
                self.sending = false;
                report_failure("Message not sent", &failure);
                true
            }
            Msg::SetTarget(target) => {
                self.target = target;
                false
            }
            Msg::OpenTarget => {
                match Uuid::parse_str(self.target.trim()) {
                    Ok(id) => redirect(&format!("/chat/{}", id)),
                    Err(_) => show_toast("That is not a valid conversation id."),
                }
                false
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let link = ctx.link();
        if ctx.props().conversation_id.is_none() {
            return html! {
                <section class="chat">
                    <h1>{ "Messages" }</h1>
                    <label>
                        { "Conversation id" }
                        <input type="text"
                            oninput={link.callback(|e: InputEvent| {
                                Msg::SetTarget(e.target_unchecked_into::<HtmlInputElement>().value())
                            })} />
                    </label>
                    <button onclick={link.callback(|_| Msg::OpenTarget)}>{ "Open" }</button>
                </section>
            };
        }

        let onsubmit = link.callback(|e: SubmitEvent| {
            e.prevent_default();
            Msg::Send
        });

        html! {
            <section class="chat">
                <div class="messages">
                    <InfiniteSentinel
                        has_next_page={self.has_older}
                        is_fetching_next_page={self.fetching}
                        on_load_more={link.callback(|_| Msg::LoadOlder)} />
                    { for self.messages.iter().map(|m| html! {
                        <div class="message" key={m.id.to_string()}>
                            <span class="sender">
                                { m.sender.as_ref().map(|s| s.full_name.clone()).unwrap_or_default() }
                            </span>
                            <span class="time">{ m.created_at.format("%H:%M").to_string() }</span>
                            <p>{ &m.content }</p>
                            if let Some(url) = &m.file_url {
                                <a href={url.clone()} target="_blank">{ "Attachment" }</a>
                            }
                        </div>
                    }) }
                </div>
                <form class="message-form" {onsubmit}>
                    <input type="text"
                        value={self.draft.clone()}
                        disabled={self.sending}
                        oninput={link.callback(|e: InputEvent| {
                            Msg::SetDraft(e.target_unchecked_into::<HtmlInputElement>().value())
                        })} />
                    <button type="submit" disabled={self.sending}>{ "Send" }</button>
                </form>
            </section>
        }
    }

    fn destroy(&mut self, _ctx: &Context<Self>) {
        self.bridge.stop();
    }
}
