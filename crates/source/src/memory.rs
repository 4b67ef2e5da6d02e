//! In-memory source store with fault injection.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::SourceError;
use crate::session::{SourceConnector, SourceFuture, SourceSession};
use crate::types::{FileContent, SourceEntry};

/// A failure to inject into the next operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Fault {
    Connect,
    Directory,
    List,
    Fetch(String),
    Delete(String),
}

#[derive(Default)]
struct State {
    directories: Vec<String>,
    files: Vec<(String, Vec<u8>)>,
    faults: HashSet<Fault>,
    deleted: Vec<String>,
    fetched: Vec<String>,
    opened: usize,
    closed: usize,
}

/// Shared in-memory store. Clones see the same state.
#[derive(Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates an empty store whose only directory is `/`.
    pub fn new() -> Self {
        let state = State {
            directories: vec!["/".into()],
            ..State::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_directory(&self, path: &str) {
        self.lock().directories.push(path.to_string());
    }

    /// Places a file, replacing any file with the same name.
    pub fn put(&self, name: &str, content: &[u8]) {
        let mut state = self.lock();
        state.files.retain(|(n, _)| n != name);
        state.files.push((name.to_string(), content.to_vec()));
    }

    pub fn fail(&self, fault: Fault) {
        self.lock().faults.insert(fault);
    }

    pub fn clear_faults(&self) {
        self.lock().faults.clear();
    }

    /// Names currently in the store, in insertion order.
    pub fn names(&self) -> Vec<String> {
        self.lock().files.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().files.iter().any(|(n, _)| n == name)
    }

    /// Names removed through sessions, in deletion order.
    pub fn deleted(&self) -> Vec<String> {
        self.lock().deleted.clone()
    }

    /// Names fetched through sessions, in fetch order.
    pub fn fetched(&self) -> Vec<String> {
        self.lock().fetched.clone()
    }

    pub fn sessions_opened(&self) -> usize {
        self.lock().opened
    }

    pub fn sessions_closed(&self) -> usize {
        self.lock().closed
    }
}

impl SourceConnector for MemoryStore {
    fn connect(&self) -> SourceFuture<'_, Box<dyn SourceSession>> {
        Box::pin(async move {
            let mut state = self.lock();
            if state.faults.contains(&Fault::Connect) {
                return Err(SourceError::Connection("connection refused".into()));
            }
            state.opened += 1;
            drop(state);

            Ok(Box::new(MemorySession {
                store: self.clone(),
            }) as Box<dyn SourceSession>)
        })
    }
}

/// Session over a [`MemoryStore`].
pub struct MemorySession {
    store: MemoryStore,
}

impl SourceSession for MemorySession {
    fn change_directory<'a>(&'a mut self, path: &'a str) -> SourceFuture<'a, ()> {
        Box::pin(async move {
            let state = self.store.lock();
            if state.faults.contains(&Fault::Directory) || !state.directories.iter().any(|d| d == path)
            {
                return Err(SourceError::Directory {
                    path: path.to_string(),
                    reason: "550 no such directory".into(),
                });
            }
            Ok(())
        })
    }

    fn list_entries(&mut self) -> SourceFuture<'_, Vec<SourceEntry>> {
        Box::pin(async move {
            let state = self.store.lock();
            if state.faults.contains(&Fault::List) {
                return Err(SourceError::List("425 cannot open data connection".into()));
            }
            Ok(state
                .files
                .iter()
                .map(|(n, _)| SourceEntry::new(n.as_str()))
                .collect())
        })
    }

    fn fetch_content<'a>(&'a mut self, entry: &'a SourceEntry) -> SourceFuture<'a, FileContent> {
        Box::pin(async move {
            let mut state = self.store.lock();
            let name = entry.name();
            let content = if state.faults.contains(&Fault::Fetch(name.to_string())) {
                None
            } else {
                state
                    .files
                    .iter()
                    .find(|(n, _)| n == name)
                    .map(|(_, c)| c.clone())
            };

            match content {
                Some(bytes) => {
                    state.fetched.push(name.to_string());
                    Ok(FileContent::new(bytes))
                }
                None => Err(SourceError::Fetch {
                    name: name.to_string(),
                    reason: "550 file unavailable".into(),
                }),
            }
        })
    }

    fn delete_entry<'a>(&'a mut self, entry: &'a SourceEntry) -> SourceFuture<'a, ()> {
        Box::pin(async move {
            let mut state = self.store.lock();
            let name = entry.name();
            let present = state.files.iter().any(|(n, _)| n == name);
            if state.faults.contains(&Fault::Delete(name.to_string())) || !present {
                return Err(SourceError::Delete {
                    name: name.to_string(),
                    reason: "550 permission denied".into(),
                });
            }
            state.files.retain(|(n, _)| n != name);
            state.deleted.push(name.to_string());
            Ok(())
        })
    }

    fn close(self: Box<Self>) -> SourceFuture<'static, ()> {
        Box::pin(async move {
            self.store.lock().closed += 1;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_session_roundtrip() {
        let store = MemoryStore::new();
        store.put("a.pdf", b"A");
        store.put("b.pdf", b"B");

        let mut session = store.connect().await.unwrap();
        session.change_directory("/").await.unwrap();
        let entries = session.list_entries().await.unwrap();
        assert_eq!(entries.len(), 2);

        let content = session.fetch_content(&entries[1]).await.unwrap();
        assert_eq!(content.as_bytes(), b"B");

        session.delete_entry(&entries[0]).await.unwrap();
        session.close().await.unwrap();

        assert_eq!(store.names(), ["b.pdf"]);
        assert_eq!(store.deleted(), ["a.pdf"]);
        assert_eq!(store.sessions_opened(), 1);
        assert_eq!(store.sessions_closed(), 1);
    }

    #[tokio::test]
    async fn memory_store_faults() {
        let store = MemoryStore::new();
        store.put("a.pdf", b"A");
        store.fail(Fault::Fetch("a.pdf".into()));

        let mut session = store.connect().await.unwrap();
        let entry = SourceEntry::new("a.pdf");
        assert!(matches!(
            session.fetch_content(&entry).await,
            Err(SourceError::Fetch { .. })
        ));
        assert!(matches!(
            session.change_directory("/nope").await,
            Err(SourceError::Directory { .. })
        ));

        store.fail(Fault::Connect);
        assert!(matches!(
            store.connect().await.err(),
            Some(SourceError::Connection(_))
        ));

        store.clear_faults();
        assert!(store.connect().await.is_ok());
    }
}
