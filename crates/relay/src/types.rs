//! Per-entry outcomes and cycle reports.

use docdrop_source::SourceEntry;

/// Terminal state of one entry within a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    /// Uploaded and removed from the source.
    Transferred { document_id: String },
    /// Content could not be fetched; the entry stays on the source.
    FetchFailed { error: String },
    /// The endpoint rejected or never received the document; the entry
    /// stays on the source.
    UploadFailed { error: String },
    /// Uploaded but still on the source. It will be uploaded again on the
    /// next cycle.
    DeleteFailed { document_id: String, error: String },
}

impl EntryOutcome {
    pub fn is_transferred(&self) -> bool {
        matches!(self, EntryOutcome::Transferred { .. })
    }

    /// Whether the endpoint accepted the document.
    pub fn was_uploaded(&self) -> bool {
        matches!(
            self,
            EntryOutcome::Transferred { .. } | EntryOutcome::DeleteFailed { .. }
        )
    }

    /// Document id returned by the endpoint, if the upload succeeded.
    pub fn document_id(&self) -> Option<&str> {
        match self {
            EntryOutcome::Transferred { document_id }
            | EntryOutcome::DeleteFailed { document_id, .. } => Some(document_id),
            _ => None,
        }
    }
}

/// One entry and how its transfer ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryReport {
    pub entry: SourceEntry,
    pub outcome: EntryOutcome,
}

/// Outcomes of one cycle, in listing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub entries: Vec<EntryReport>,
}

impl CycleReport {
    pub fn push(&mut self, entry: SourceEntry, outcome: EntryOutcome) {
        self.entries.push(EntryReport { entry, outcome });
    }

    pub fn outcome_for(&self, name: &str) -> Option<&EntryOutcome> {
        self.entries
            .iter()
            .find(|r| r.entry.name() == name)
            .map(|r| &r.outcome)
    }

    /// Entries uploaded and removed.
    pub fn transferred(&self) -> usize {
        self.entries
            .iter()
            .filter(|r| r.outcome.is_transferred())
            .count()
    }

    /// Entries left on the source without being uploaded.
    pub fn failed(&self) -> usize {
        self.entries
            .iter()
            .filter(|r| !r.outcome.was_uploaded())
            .count()
    }

    /// Entries uploaded but not removed.
    pub fn duplicated(&self) -> usize {
        self.entries
            .iter()
            .filter(|r| matches!(r.outcome, EntryOutcome::DeleteFailed { .. }))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
