//! Subject export downloads
//!
//! Fetches `{export_endpoint}/{subject}`, pretty-prints the JSON and offers it
//! as `<subject>_with_answers.json`. A failed fetch, a non-2xx status or a
//! body that is not JSON is returned to the caller and nothing is downloaded.

use crate::config::SyncConfig;
use crate::error::Result;
use crate::payload::{ExportFile, ExportSummary, export_url};
use crate::platform::{Downloader, Transport};

pub struct Exporter<T, D> {
    transport: T,
    downloader: D,
    export_endpoint: String,
}

impl<T: Transport, D: Downloader> Exporter<T, D> {
    pub fn new(transport: T, downloader: D, config: &SyncConfig) -> Self {
        Self {
            transport,
            downloader,
            export_endpoint: config.export_endpoint.clone(),
        }
    }

    /// Fetch a subject's export and offer it as a download
    pub async fn export_data(&self, subject: &str) -> Result<ExportFile> {
        let url = export_url(&self.export_endpoint, subject);
        let body = self.transport.get_text(&url).await?;
        let document: serde_json::Value = serde_json::from_str(&body)?;
        let file = ExportFile::from_document(subject, &document)?;

        match ExportSummary::of(&document) {
            Some(summary) => log::info!("Exporting {} ({})", file.filename, summary),
            None => log::info!("Exporting {} ({} bytes)", file.filename, file.contents.len()),
        }

        self.downloader.offer(&file)?;
        Ok(file)
    }
}
