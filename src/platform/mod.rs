//! Platform abstraction layer
//!
//! Everything the helpers need from the host goes through these traits:
//! - Task spawning and timers (`Runtime`)
//! - HTTP requests (`Transport`)
//! - The status indicator element (`StatusView`)
//! - File downloads (`Downloader`)
//!
//! `web` implements them with web-sys; tests use `fake`.

use futures::future::LocalBoxFuture;

use crate::error::Result;
use crate::payload::ExportFile;

#[cfg(target_arch = "wasm32")]
pub mod web;

#[cfg(test)]
pub(crate) mod fake;

/// Single-threaded task spawning and timers
pub trait Runtime {
    /// Run a task to completion in the background
    fn spawn(&self, task: LocalBoxFuture<'static, ()>);
    /// Resolve after `ms` milliseconds
    fn sleep(&self, ms: u32) -> LocalBoxFuture<'static, ()>;
}

/// HTTP requests
pub trait Transport {
    /// POST a JSON body; only success (2xx) or failure is reported
    fn post_json(&self, url: &str, body: String) -> LocalBoxFuture<'static, Result<()>>;
    /// GET a response body as text; non-2xx responses are errors
    fn get_text(&self, url: &str) -> LocalBoxFuture<'static, Result<String>>;
}

/// The page's save status indicator
pub trait StatusView {
    fn set_text(&self, text: &str);
    fn set_visible(&self, visible: bool);
}

/// Offers a file to the user as a download
pub trait Downloader {
    fn offer(&self, file: &ExportFile) -> Result<()>;
}
