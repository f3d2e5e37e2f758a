//! Browser host built on web-sys
//!
//! - `WebRuntime`: `spawn_local` + `setTimeout`
//! - `FetchTransport`: `window.fetch`, bodies returned as text
//! - `DomStatus`: the `#save-status` element
//! - `AnchorDownloader`: Blob + object URL + synthetic anchor click

use futures::future::LocalBoxFuture;
use js_sys::{Array, Function, Promise};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, HtmlElement, Request, RequestInit, Response};

use super::{Downloader, Runtime, StatusView, Transport};
use crate::consts::JSON_CONTENT_TYPE;
use crate::error::{Result, SyncError};
use crate::payload::ExportFile;

/// Message of a thrown JavaScript value
fn js_message(value: &JsValue) -> String {
    value
        .dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .or_else(|| value.as_string())
        .unwrap_or_else(|| format!("{:?}", value))
}

fn host_error(value: JsValue) -> SyncError {
    SyncError::Host(js_message(&value))
}

fn window() -> Result<web_sys::Window> {
    web_sys::window().ok_or_else(|| SyncError::Host("no window".into()))
}

fn document() -> Result<web_sys::Document> {
    window()?
        .document()
        .ok_or_else(|| SyncError::Host("no document".into()))
}

/// Event-loop runtime
#[derive(Debug, Clone, Copy, Default)]
pub struct WebRuntime;

impl Runtime for WebRuntime {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }

    fn sleep(&self, ms: u32) -> LocalBoxFuture<'static, ()> {
        let timeout = i32::try_from(ms).unwrap_or(i32::MAX);
        let promise = Promise::new(&mut |resolve: Function, _reject: Function| {
            let scheduled = web_sys::window().map(|w| {
                w.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, timeout)
            });
            if !matches!(scheduled, Some(Ok(_))) {
                log::warn!("setTimeout unavailable, resolving immediately");
                let _ = resolve.call0(&JsValue::UNDEFINED);
            }
        });
        Box::pin(async move {
            let _ = JsFuture::from(promise).await;
        })
    }
}

/// HTTP over `window.fetch`
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchTransport;

impl FetchTransport {
    async fn fetch(request: Request) -> Result<Response> {
        let promise = window()?.fetch_with_request(&request);
        // fetch only rejects on network failure
        let response = JsFuture::from(promise)
            .await
            .map_err(|e| SyncError::Network(js_message(&e)))?;
        let response: Response = response.dyn_into().map_err(host_error)?;
        if !response.ok() {
            return Err(SyncError::Status(response.status()));
        }
        Ok(response)
    }

    fn post_request(url: &str, body: &str) -> Result<Request> {
        let init = RequestInit::new();
        init.set_method("POST");
        init.set_body(&JsValue::from_str(body));
        let request = Request::new_with_str_and_init(url, &init).map_err(host_error)?;
        request
            .headers()
            .set("Content-Type", JSON_CONTENT_TYPE)
            .map_err(host_error)?;
        Ok(request)
    }
}

impl Transport for FetchTransport {
    fn post_json(&self, url: &str, body: String) -> LocalBoxFuture<'static, Result<()>> {
        let request = Self::post_request(url, &body);
        Box::pin(async move {
            Self::fetch(request?).await?;
            Ok(())
        })
    }

    fn get_text(&self, url: &str) -> LocalBoxFuture<'static, Result<String>> {
        let request = Request::new_with_str(url).map_err(host_error);
        Box::pin(async move {
            let response = Self::fetch(request?).await?;
            let text = JsFuture::from(response.text().map_err(host_error)?)
                .await
                .map_err(host_error)?;
            text.as_string()
                .ok_or_else(|| SyncError::Host("response body is not text".into()))
        })
    }
}

/// Status indicator looked up by element id on every update
#[derive(Debug, Clone)]
pub struct DomStatus {
    element_id: String,
}

impl DomStatus {
    pub fn new(element_id: impl Into<String>) -> Self {
        Self {
            element_id: element_id.into(),
        }
    }

    fn element(&self) -> Option<HtmlElement> {
        let element = document()
            .ok()?
            .get_element_by_id(&self.element_id)
            .and_then(|el| el.dyn_into::<HtmlElement>().ok());
        if element.is_none() {
            log::debug!("#{} not found, skipping status update", self.element_id);
        }
        element
    }
}

impl StatusView for DomStatus {
    fn set_text(&self, text: &str) {
        if let Some(el) = self.element() {
            el.set_inner_text(text);
        }
    }

    fn set_visible(&self, visible: bool) {
        if let Some(el) = self.element() {
            let display = if visible { "block" } else { "none" };
            let _ = el.style().set_property("display", display);
        }
    }
}

/// Triggers downloads through a synthetic `<a download>` click
#[derive(Debug, Clone, Copy, Default)]
pub struct AnchorDownloader;

impl Downloader for AnchorDownloader {
    fn offer(&self, file: &ExportFile) -> Result<()> {
        let parts = Array::of1(&JsValue::from_str(&file.contents));
        let options = BlobPropertyBag::new();
        options.set_type(JSON_CONTENT_TYPE);
        let blob =
            Blob::new_with_str_sequence_and_options(&parts, &options).map_err(host_error)?;

        // Object URL is left for the browser to reclaim
        let url = web_sys::Url::create_object_url_with_blob(&blob).map_err(host_error)?;

        let anchor: HtmlAnchorElement = document()?
            .create_element("a")
            .map_err(host_error)?
            .dyn_into()
            .map_err(|el| host_error(el.into()))?;
        anchor.set_href(&url);
        anchor.set_download(&file.filename);
        anchor.click();
        Ok(())
    }
}
