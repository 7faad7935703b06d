// Document store seam, the in-memory store, and the local mirror.

pub mod backend;
pub mod memory;
pub mod mirror;
pub mod mirror_db;

use thiserror::Error;
use twodays_common::time::Micros;
use twodays_common::types::{
    Document, DocumentError, DocumentWrite, Keypair, WorkspaceId, WriteEvent,
};

/// Path and content filter shared by queries and write subscriptions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentFilter {
    pub path_starts_with: Option<String>,
    pub path_ends_with: Option<String>,
    pub content_non_empty: bool,
}

impl DocumentFilter {
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self { path_starts_with: Some(prefix.into()), ..Self::default() }
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.path_ends_with = Some(suffix.into());
        self
    }

    pub fn non_empty(mut self) -> Self {
        self.content_non_empty = true;
        self
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.path_starts_with.as_deref().is_none_or(|prefix| doc.path.starts_with(prefix))
            && self.path_ends_with.as_deref().is_none_or(|suffix| doc.path.ends_with(suffix))
            && (!self.content_non_empty || !doc.content.is_empty())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("write rejected: {0}")]
    Invalid(#[from] DocumentError),

    #[error("ignored write to `{path}`: timestamp {incoming} is not newer than {existing}")]
    Stale { path: String, existing: Micros, incoming: Micros },

    #[error("document belongs to workspace `{0}`")]
    WrongWorkspace(WorkspaceId),
}

/// The external document store, as the client consumes it.
///
/// Writes never panic past this boundary: every failure is a `StoreError`.
/// Accepted writes come back as the `WriteEvent` subscribers would receive.
pub trait DocumentStore {
    fn workspace(&self) -> &WorkspaceId;

    fn get(&self, path: &str) -> Option<Document>;

    /// Matching documents in no particular order.
    fn query(&self, filter: &DocumentFilter) -> Vec<Document>;

    /// Write as `keypair` at `now`.
    fn set(
        &mut self,
        keypair: &Keypair,
        write: DocumentWrite,
        now: Micros,
    ) -> Result<WriteEvent, StoreError>;

    /// Accept a document produced elsewhere (sync or mirror replay).
    fn ingest(&mut self, document: Document) -> Result<WriteEvent, StoreError>;

    /// Remove documents whose `deleteAfter` is at or before `now`.
    fn discard_expired(&mut self, now: Micros) -> Vec<Document>;
}
