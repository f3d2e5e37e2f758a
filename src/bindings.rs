//! JavaScript surface
//!
//! Pages can either construct their own `AnswerSync` instances or call the
//! `saveAnswer` / `exportData` globals, which share one default instance.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;
use wasm_bindgen::prelude::*;

use crate::config::SyncConfig;
use crate::export::Exporter;
use crate::platform::web::{AnchorDownloader, DomStatus, FetchTransport, WebRuntime};
use crate::saver::AnswerSaver;

type WebSaver = AnswerSaver<WebRuntime, FetchTransport, DomStatus>;
type WebExporter = Exporter<FetchTransport, AnchorDownloader>;

thread_local! {
    static DEFAULT: RefCell<Option<AnswerSync>> = const { RefCell::new(None) };
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    let config = SyncConfig::load();
    let _ = console_log::init_with_level(config.level());
    log::info!("Answer sync ready (save: {}, export: {})", config.save_endpoint, config.export_endpoint);
}

/// Debounced saver plus exporter bound to the browser
#[wasm_bindgen]
#[derive(Clone)]
pub struct AnswerSync {
    saver: WebSaver,
    exporter: Rc<WebExporter>,
}

impl AnswerSync {
    fn from_config(config: &SyncConfig) -> Self {
        Self {
            saver: AnswerSaver::new(
                WebRuntime,
                FetchTransport,
                DomStatus::new(config.status_element_id.clone()),
                config,
            ),
            exporter: Rc::new(Exporter::new(FetchTransport, AnchorDownloader, config)),
        }
    }
}

#[wasm_bindgen]
impl AnswerSync {
    /// Instance using the page config (or defaults)
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::from_config(&SyncConfig::load())
    }

    /// Instance from a JSON config string; missing fields keep defaults
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(json: &str) -> Result<AnswerSync, JsError> {
        let config = SyncConfig::from_json(json)?;
        Ok(Self::from_config(&config))
    }

    /// Schedule a debounced save; never throws
    #[wasm_bindgen(js_name = saveAnswer)]
    pub fn save_answer(&self, question: &str, value: JsValue) {
        self.saver.save_answer(question, to_json_value(&value));
    }

    /// Download a subject's export; the Promise rejects on failure
    #[wasm_bindgen(js_name = exportData)]
    pub fn export_data(&self, subject: String) -> js_sys::Promise {
        let exporter = Rc::clone(&self.exporter);
        wasm_bindgen_futures::future_to_promise(async move {
            match exporter.export_data(&subject).await {
                Ok(file) => Ok(JsValue::from_str(&file.filename)),
                Err(e) => Err(JsError::from(e).into()),
            }
        })
    }

    /// Whether a save is waiting out its quiet interval
    #[wasm_bindgen(getter = hasPendingSave)]
    pub fn has_pending_save(&self) -> bool {
        self.saver.has_pending()
    }

    /// Saves sent but not yet settled
    #[wasm_bindgen(getter = inFlightSaves)]
    pub fn in_flight_saves(&self) -> usize {
        self.saver.in_flight_saves()
    }
}

impl Default for AnswerSync {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert an arbitrary JS value into JSON; non-serializable values become null
fn to_json_value(value: &JsValue) -> Value {
    if value.is_undefined() {
        return Value::Null;
    }
    js_sys::JSON::stringify(value)
        .ok()
        .and_then(|s| s.as_string())
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_else(|| {
            log::warn!("Answer is not JSON-serializable, sending null");
            Value::Null
        })
}

fn default_instance() -> AnswerSync {
    DEFAULT.with(|slot| slot.borrow_mut().get_or_insert_with(AnswerSync::new).clone())
}

/// `saveAnswer(question, value)` on the shared default instance
#[wasm_bindgen(js_name = saveAnswer)]
pub fn save_answer(question: &str, value: JsValue) {
    default_instance().save_answer(question, value);
}

/// `exportData(subject)` on the shared default instance
#[wasm_bindgen(js_name = exportData)]
pub fn export_data(subject: String) -> js_sys::Promise {
    default_instance().export_data(subject)
}
