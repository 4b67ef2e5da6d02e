//! Transfer orchestrator for one polling cycle.
//!
//! Opens a source session, lists the watched directory once and drives
//! every entry through fetch → upload → delete. A failure at any stage of
//! one entry is recorded and logged; the remaining entries still run.

use std::sync::Arc;

use docdrop_source::{SourceConnector, SourceEntry, SourceSession};
use tracing::{debug, error, info, warn};

use crate::error::CycleError;
use crate::sink::DocumentSink;
use crate::types::{CycleReport, EntryOutcome};

/// Runs transfer cycles against one source directory and one sink.
pub struct TransferOrchestrator {
    connector: Arc<dyn SourceConnector>,
    sink: Arc<dyn DocumentSink>,
    directory: String,
}

impl TransferOrchestrator {
    pub fn new(
        connector: Arc<dyn SourceConnector>,
        sink: Arc<dyn DocumentSink>,
        directory: impl Into<String>,
    ) -> Self {
        Self {
            connector,
            sink,
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &str {
        &self.directory
    }

    /// Runs one cycle.
    ///
    /// Once connected, the session is closed before returning, whether the
    /// cycle succeeded or failed.
    pub async fn run_cycle(&self) -> Result<CycleReport, CycleError> {
        let mut session = self.connector.connect().await.map_err(CycleError::Connect)?;

        let result = self.process_session(session.as_mut()).await;

        if let Err(e) = session.close().await {
            warn!(error = %e, "failed to close source session");
        }
        result
    }

    async fn process_session(
        &self,
        session: &mut dyn SourceSession,
    ) -> Result<CycleReport, CycleError> {
        session
            .change_directory(&self.directory)
            .await
            .map_err(CycleError::Directory)?;

        let entries = session.list_entries().await.map_err(CycleError::List)?;
        info!(
            directory = %self.directory,
            entries = entries.len(),
            "listed source directory"
        );

        let mut report = CycleReport::default();
        for entry in entries {
            let outcome = self.transfer_entry(session, &entry).await;
            report.push(entry, outcome);
        }
        Ok(report)
    }

    /// Drives one entry through fetch → upload → delete.
    ///
    /// The entry is deleted only after the sink returned a receipt.
    pub async fn transfer_entry(
        &self,
        session: &mut dyn SourceSession,
        entry: &SourceEntry,
    ) -> EntryOutcome {
        info!(file = %entry, "processing file");

        let content = match session.fetch_content(entry).await {
            Ok(content) => content,
            Err(e) => {
                error!(file = %entry, error = %e, "failed to fetch file from source");
                return EntryOutcome::FetchFailed {
                    error: e.to_string(),
                };
            }
        };
        debug!(file = %entry, bytes = content.len(), "fetched file");

        let receipt = match self.sink.send(entry.name(), content).await {
            Ok(receipt) => receipt,
            Err(e) => {
                error!(file = %entry, error = %e, "failed to send file to HTTP endpoint");
                return EntryOutcome::UploadFailed {
                    error: e.to_string(),
                };
            }
        };

        let document_id = receipt.document_id;
        info!(file = %entry, status = receipt.status, response = %document_id, "upload response");
        if document_id.is_empty() {
            info!(file = %entry, "uploaded file, but no document id was returned");
        } else {
            info!(file = %entry, document_id = %document_id, "uploaded file");
        }

        match session.delete_entry(entry).await {
            Ok(()) => {
                info!(file = %entry, "deleted file from source");
                EntryOutcome::Transferred { document_id }
            }
            Err(e) => {
                error!(
                    file = %entry,
                    document_id = %document_id,
                    error = %e,
                    "uploaded file could not be deleted from source, it will be uploaded again"
                );
                EntryOutcome::DeleteFailed {
                    document_id,
                    error: e.to_string(),
                }
            }
        }
    }
}
