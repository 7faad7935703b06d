// In-memory document store for one workspace.
//
// Rebuilt from the mirror at startup, before any network sync. Per path,
// the newest timestamp wins: a local write is stamped just after whatever
// is already there, an ingested document must be strictly newer.

use std::collections::BTreeMap;

use tracing::debug;
use twodays_common::time::Micros;
use twodays_common::types::{Document, DocumentWrite, Keypair, WorkspaceId, WriteEvent};

use super::{DocumentFilter, DocumentStore, StoreError};

#[derive(Debug, Clone)]
pub struct MemoryStore {
    workspace: WorkspaceId,
    docs: BTreeMap<String, Document>,
}

impl MemoryStore {
    pub fn new(workspace: WorkspaceId) -> Self {
        Self { workspace, docs: BTreeMap::new() }
    }

    /// Replay documents, keeping the newest per path.
    pub fn from_documents(
        workspace: WorkspaceId,
        documents: impl IntoIterator<Item = Document>,
    ) -> Self {
        let mut store = Self::new(workspace);
        for document in documents {
            if let Err(error) = store.ingest(document) {
                debug!(%error, "skipped document during replay");
            }
        }
        store
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    fn event(&self, document: Document, is_local: bool) -> WriteEvent {
        WriteEvent { workspace: self.workspace.clone(), document, is_local, is_latest: true }
    }
}

impl DocumentStore for MemoryStore {
    fn workspace(&self) -> &WorkspaceId {
        &self.workspace
    }

    fn get(&self, path: &str) -> Option<Document> {
        self.docs.get(path).cloned()
    }

    fn query(&self, filter: &DocumentFilter) -> Vec<Document> {
        self.docs.values().filter(|doc| filter.matches(doc)).cloned().collect()
    }

    fn set(
        &mut self,
        keypair: &Keypair,
        write: DocumentWrite,
        now: Micros,
    ) -> Result<WriteEvent, StoreError> {
        write.validate(&keypair.address, now)?;

        let timestamp = match self.docs.get(&write.path) {
            Some(existing) if existing.timestamp >= now => existing.timestamp + Micros(1),
            _ => now,
        };
        let document = Document {
            path: write.path,
            author: keypair.address.clone(),
            content: write.content,
            timestamp,
            delete_after: write.delete_after,
        };

        self.docs.insert(document.path.clone(), document.clone());
        debug!(path = %document.path, timestamp = %document.timestamp, "local write accepted");
        Ok(self.event(document, true))
    }

    fn ingest(&mut self, document: Document) -> Result<WriteEvent, StoreError> {
        if let Some(existing) = self.docs.get(&document.path) {
            if document.timestamp <= existing.timestamp {
                return Err(StoreError::Stale {
                    path: document.path,
                    existing: existing.timestamp,
                    incoming: document.timestamp,
                });
            }
        }

        self.docs.insert(document.path.clone(), document.clone());
        Ok(self.event(document, false))
    }

    fn discard_expired(&mut self, now: Micros) -> Vec<Document> {
        let expired: Vec<String> = self
            .docs
            .values()
            .filter(|doc| doc.delete_after.is_some_and(|delete_after| delete_after <= now))
            .map(|doc| doc.path.clone())
            .collect();

        let removed: Vec<Document> =
            expired.iter().filter_map(|path| self.docs.remove(path)).collect();
        if !removed.is_empty() {
            debug!(count = removed.len(), "discarded expired documents");
        }
        removed
    }
}
