//! Bottom-of-list sentinel that asks for the next page when it scrolls into view.
//!
//! An `IntersectionObserver` watches the sentinel element and feeds every
//! visibility change to [`InfiniteScroll`], which decides whether the parent's
//! `on_load_more` should fire given the paging state in the props.

use common::scroll::InfiniteScroll;
use gloo_console::warn;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{Element, IntersectionObserver, IntersectionObserverEntry};
use yew::prelude::*;

#[derive(Properties, PartialEq, Clone)]
pub struct InfiniteSentinelProps {
    pub has_next_page: bool,
    pub is_fetching_next_page: bool,
    pub on_load_more: Callback<()>,
}

pub enum Msg {
    Visible(bool),
    LoadMore,
}

type ObserverCallback = Closure<dyn FnMut(js_sys::Array, IntersectionObserver)>;

pub struct InfiniteSentinel {
    node: NodeRef,
    scroll: InfiniteScroll<Box<dyn FnMut()>>,
    observer: Option<(IntersectionObserver, ObserverCallback)>,
}

impl Component for InfiniteSentinel {
    type Message = Msg;
    type Properties = InfiniteSentinelProps;

    fn create(ctx: &Context<Self>) -> Self {
        let link = ctx.link().clone();
        let load_more: Box<dyn FnMut()> = Box::new(move || link.send_message(Msg::LoadMore));
        let mut scroll = InfiniteScroll::new(load_more);
        let props = ctx.props();
        scroll.set_query_state(props.has_next_page, props.is_fetching_next_page);
        Self {
            node: NodeRef::default(),
            scroll,
            observer: None,
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::Visible(visible) => self.scroll.set_visible(visible),
            Msg::LoadMore => ctx.props().on_load_more.emit(()),
        }
        false
    }

    fn changed(&mut self, ctx: &Context<Self>, _old_props: &Self::Properties) -> bool {
        let props = ctx.props();
        self.scroll
            .set_query_state(props.has_next_page, props.is_fetching_next_page);
        true
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let props = ctx.props();
        html! {
            <div class="infinite-sentinel" ref={self.node.clone()}>
                if props.is_fetching_next_page {
                    <span class="loading">{ "Loading…" }</span>
                }
            </div>
        }
    }

    fn rendered(&mut self, ctx: &Context<Self>, first_render: bool) {
        if !first_render {
            return;
        }
        let Some(element) = self.node.cast::<Element>() else {
            return;
        };

        let link = ctx.link().clone();
        let callback: ObserverCallback = Closure::new(move |entries: js_sys::Array, _| {
            // the last entry carries the most recent state of the sentinel
            if let Some(entry) = entries
                .iter()
                .last()
                .and_then(|e| e.dyn_into::<IntersectionObserverEntry>().ok())
            {
                link.send_message(Msg::Visible(entry.is_intersecting()));
            }
        });

        match IntersectionObserver::new(callback.as_ref().unchecked_ref()) {
            Ok(observer) => {
                observer.observe(&element);
                self.observer = Some((observer, callback));
            }
            Err(err) => warn!("IntersectionObserver unavailable", err),
        }
    }

    fn destroy(&mut self, _ctx: &Context<Self>) {
        if let Some((observer, _callback)) = self.observer.take() {
            observer.disconnect();
        }
    }
}
