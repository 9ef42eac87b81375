//! Small DOM utilities shared by the pages.
//!
//! - **User feedback**: `show_toast` displays a short-lived notification at the
//!   bottom of the window.
//! - **Navigation**: `redirect` performs a full page load, which lets the
//!   server's session gate decide where the user ends up.
//! - **Downloads**: `download_bytes` hands a response body to the browser as a
//!   file with a chosen name.

use crate::api::ApiFailure;
use gloo_console::error;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, HtmlElement, Url};

pub const LOGIN_PATH: &str = "/login";

/// Displays a toast notification with `message` for three seconds.
///
/// The element is appended to `<body>` with inline styles so it works on every
/// page without extra CSS, then removed by a timer.
pub fn show_toast(message: &str) {
    if let Some(window) = web_sys::window() {
        if let Some(document) = window.document() {
            if let (Ok(toast), Some(body)) = (document.create_element("div"), document.body()) {
                toast.set_text_content(Some(message));
                let html_toast: HtmlElement = toast.unchecked_into();
                let style = html_toast.style();
                style.set_property("position", "fixed").ok();
                style.set_property("bottom", "20px").ok();
                style.set_property("left", "50%").ok();
                style.set_property("transform", "translateX(-50%)").ok();
                style.set_property("background", "rgba(0, 0, 0, 0.8)").ok();
                style.set_property("color", "#fff").ok();
                style.set_property("padding", "10px 20px").ok();
                style.set_property("border-radius", "4px").ok();
                style.set_property("z-index", "10000").ok();
                style.set_property("font-family", "Arial, sans-serif").ok();

                if body.append_child(&html_toast).is_ok() {
                    wasm_bindgen_futures::spawn_local(async move {
                        gloo_timers::future::TimeoutFuture::new(3000).await;
                        if let Some(parent) = html_toast.parent_node() {
                            parent.remove_child(&html_toast).ok();
                        }
                    });
                }
            }
        }
    }
}

/// Loads `path` as a new page.
pub fn redirect(path: &str) {
    if let Some(window) = web_sys::window() {
        if window.location().set_href(path).is_err() {
            error!(format!("could not navigate to {}", path));
        }
    }
}

/// Reacts to a failed API call: an expired session goes back to the login
/// page, anything else is shown as a toast.
pub fn report_failure(context: &str, failure: &ApiFailure) {
    match failure {
        ApiFailure::Unauthorized => redirect(LOGIN_PATH),
        other => show_toast(&format!("{}: {}", context, other)),
    }
}

/// Saves `bytes` as a file called `filename`.
///
/// Goes through a temporary object URL and a detached `<a download>` that is
/// clicked programmatically. The URL is revoked right after the click.
pub fn download_bytes(bytes: &[u8], content_type: &str, filename: &str) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    let parts = js_sys::Array::new();
    parts.push(&js_sys::Uint8Array::from(bytes));
    let options = BlobPropertyBag::new();
    options.set_type(content_type);
    let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)?;
    let url = Url::create_object_url_with_blob(&blob)?;

    let anchor: HtmlAnchorElement = document.create_element("a")?.dyn_into()?;
    anchor.set_href(&url);
    anchor.set_download(filename);
    anchor.click();

    Url::revoke_object_url(&url)
}
