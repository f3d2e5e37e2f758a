//! Answer Sync - browser helpers for the question-bank UI
//!
//! Core modules:
//! - `saver`: Debounced answer saving with a status indicator
//! - `export`: Fetch a subject's answers and offer them as a download
//! - `platform`: Browser/native host abstraction (fetch, timers, DOM)
//! - `payload`: Wire payloads, export files and summaries
//! - `config`: Endpoints and timing, loadable from page JSON

pub mod config;
pub mod error;
pub mod export;
pub mod payload;
pub mod platform;
pub mod saver;
pub mod status;

#[cfg(target_arch = "wasm32")]
pub mod bindings;

pub use config::SyncConfig;
pub use error::{Result, SyncError};
pub use export::Exporter;
pub use payload::{AnswerPayload, ExportFile, ExportSummary};
pub use saver::AnswerSaver;
pub use status::SaveStatus;

/// Default endpoints, element ids and timings
pub mod consts {
    /// Quiet period after the last edit before a save fires (ms)
    pub const QUIET_INTERVAL_MS: u32 = 800;
    /// How long the settled status stays visible (ms)
    pub const STATUS_HIDE_DELAY_MS: u32 = 2000;

    /// Backend endpoints
    pub const SAVE_ENDPOINT: &str = "/api/save-answer";
    pub const EXPORT_ENDPOINT: &str = "/api/export";

    /// Status indicator element owned by the page markup
    pub const STATUS_ELEMENT_ID: &str = "save-status";
    /// Inline JSON config element read at startup
    pub const CONFIG_ELEMENT_ID: &str = "answer-sync-config";

    /// Appended to the subject to name exported files
    pub const EXPORT_FILE_SUFFIX: &str = "_with_answers.json";
    pub const JSON_CONTENT_TYPE: &str = "application/json";
}
