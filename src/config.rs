//! Endpoint and timing configuration
//!
//! Pages can override the defaults with an inline JSON block:
//! `<script type="application/json" id="answer-sync-config">{...}</script>`

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::Result;

/// Runtime configuration for the save and export helpers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// POST target for answer saves
    pub save_endpoint: String,
    /// Base path for exports; the subject is appended as a path segment
    pub export_endpoint: String,
    /// Id of the status indicator element
    pub status_element_id: String,

    // === Timing ===
    /// Quiet period before a save fires (ms)
    pub quiet_interval_ms: u32,
    /// Delay before hiding the settled status (ms)
    pub status_hide_delay_ms: u32,

    /// Console log level ("error", "warn", "info", "debug", "trace")
    pub log_level: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            save_endpoint: SAVE_ENDPOINT.to_string(),
            export_endpoint: EXPORT_ENDPOINT.to_string(),
            status_element_id: STATUS_ELEMENT_ID.to_string(),

            quiet_interval_ms: QUIET_INTERVAL_MS,
            status_hide_delay_ms: STATUS_HIDE_DELAY_MS,

            log_level: "info".to_string(),
        }
    }
}

impl SyncConfig {
    /// Parse a (possibly partial) JSON config; missing fields keep defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parsed log level, falling back to `Info` on unknown names
    pub fn level(&self) -> log::Level {
        self.log_level.parse().unwrap_or(log::Level::Info)
    }

    /// Load config from the page's inline JSON block (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let json = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(CONFIG_ELEMENT_ID))
            .and_then(|el| el.text_content());

        if let Some(json) = json {
            match Self::from_json(&json) {
                Ok(config) => {
                    log::info!("Loaded config from #{}", CONFIG_ELEMENT_ID);
                    return config;
                }
                Err(e) => log::warn!("Ignoring invalid #{}: {}", CONFIG_ELEMENT_ID, e),
            }
        }

        Self::default()
    }

    /// Native stub
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }
}
