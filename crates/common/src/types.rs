// Core domain types shared across the twodays crates.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::path::{self, PathError};
use crate::time::{Micros, HORIZON};

/// Largest accepted document content, in bytes.
pub const MAX_CONTENT_BYTES: usize = 8 * 1024;

/// A namespace partition of documents, e.g. `+plaza.prm27p8eg65c`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkspaceId(String);

impl WorkspaceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WorkspaceId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Identity of a document: unique per (workspace, path).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocKey {
    pub workspace: WorkspaceId,
    pub path: String,
}

impl fmt::Display for DocKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.workspace, self.path)
    }
}

/// A timestamped, path-addressed, optionally expiring content record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub path: String,
    pub author: String,
    pub content: String,
    pub timestamp: Micros,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_after: Option<Micros>,
}

impl Document {
    pub fn key(&self, workspace: &WorkspaceId) -> DocKey {
        DocKey { workspace: workspace.clone(), path: self.path.clone() }
    }

    /// Empty content marks a document that existed and has been cleared.
    pub fn is_past(&self) -> bool {
        self.content.is_empty()
    }

    /// Explicit `deleteAfter`, or two days after the write.
    pub fn expires_at(&self) -> Micros {
        self.delete_after.unwrap_or(self.timestamp + HORIZON.to_micros())
    }

    /// Content as it must be read at `now`: empty once `deleteAfter` passed.
    pub fn content_at(&self, now: Micros) -> &str {
        match self.delete_after {
            Some(delete_after) if delete_after <= now => "",
            _ => &self.content,
        }
    }

    /// Non-empty content that has not passed its `deleteAfter`.
    pub fn is_living_at(&self, now: Micros) -> bool {
        !self.content_at(now).is_empty()
    }

    /// Same record with its content cleared, as a discard notification carries it.
    pub fn cleared(&self) -> Document {
        Document { content: String::new(), ..self.clone() }
    }
}

/// An author keypair handle. The secret is never printed.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keypair {
    pub address: String,
    pub secret: String,
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair").field("address", &self.address).field("secret", &"***").finish()
    }
}

/// A write submitted to the document store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentWrite {
    pub path: String,
    pub content: String,
    pub delete_after: Option<Micros>,
}

impl DocumentWrite {
    /// Check the write against path, scope, size and expiry rules.
    pub fn validate(&self, author: &str, now: Micros) -> Result<(), DocumentError> {
        path::validate_path(&self.path)?;

        if path::author_of(&self.path).is_some_and(|owner| owner != author) {
            return Err(DocumentError::OutsideAuthorScope(self.path.clone()));
        }

        if self.content.len() > MAX_CONTENT_BYTES {
            return Err(DocumentError::ContentTooLarge(self.content.len()));
        }

        match (path::is_ephemeral(&self.path), self.delete_after) {
            (true, None) => Err(DocumentError::MissingDeleteAfter(self.path.clone())),
            (false, Some(_)) => Err(DocumentError::UnexpectedDeleteAfter(self.path.clone())),
            (true, Some(delete_after)) if delete_after <= now => {
                Err(DocumentError::DeleteAfterInPast(delete_after))
            }
            _ => Ok(()),
        }
    }
}

/// A write accepted by the store, as delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteEvent {
    pub workspace: WorkspaceId,
    pub document: Document,
    pub is_local: bool,
    pub is_latest: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error("content is {0} bytes, limit is {MAX_CONTENT_BYTES}")]
    ContentTooLarge(usize),

    #[error("path `{0}` belongs to another author")]
    OutsideAuthorScope(String),

    #[error("ephemeral path `{0}` requires deleteAfter")]
    MissingDeleteAfter(String),

    #[error("path `{0}` is not ephemeral and cannot carry deleteAfter")]
    UnexpectedDeleteAfter(String),

    #[error("deleteAfter {0} is already in the past")]
    DeleteAfterInPast(Micros),
}
