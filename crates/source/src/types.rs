//! Entry and content types.

use std::fmt;

/// One file present in the source directory at listing time.
///
/// Only the name is modeled; it is unique within a single listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceEntry {
    name: String,
}

impl SourceEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Builds entries from raw listing lines, skipping blank ones.
    pub fn from_listing<I, S>(lines: I) -> Vec<SourceEntry>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        lines
            .into_iter()
            .filter_map(|line| {
                let name = line.as_ref().trim_end_matches(['\r', '\n']);
                if name.trim().is_empty() {
                    None
                } else {
                    Some(SourceEntry::new(name))
                }
            })
            .collect()
    }
}

impl fmt::Display for SourceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Full byte content of one entry, held in memory for a single transfer.
#[derive(Clone, PartialEq, Eq)]
pub struct FileContent(Vec<u8>);

impl FileContent {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for FileContent {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

// Contents can be large binaries; only the size is useful in debug output.
impl fmt::Debug for FileContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileContent")
            .field("len", &self.0.len())
            .finish()
    }
}
