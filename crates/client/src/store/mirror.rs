// Local mirror: an in-memory snapshot of every known document and the
// session, persisted key by key so a restart can replay it before sync.
//
// Layout in the backend:
//   documents/<workspace>   JSON object: path -> document
//   session/identity        JSON keypair or null
//   session/online          JSON bool
//   session/workspace       JSON workspace id or null
//   session/relays          JSON array of relay URLs
//
// Reads never fail: an unreadable or malformed entry is treated as absent.
// Writes that fail leave the in-memory snapshot ahead of disk until the next
// successful persist of the same key.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use twodays_common::time::{Millis, HORIZON};
use twodays_common::types::{Document, Keypair, WorkspaceId, WriteEvent};

use super::backend::MirrorBackend;
use crate::session::{SessionChange, SessionState};

const DOCUMENTS_PREFIX: &str = "documents/";
const IDENTITY_KEY: &str = "session/identity";
const ONLINE_KEY: &str = "session/online";
const WORKSPACE_KEY: &str = "session/workspace";
const RELAYS_KEY: &str = "session/relays";

pub type WorkspaceDocuments = BTreeMap<String, Document>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorSnapshot {
    pub workspaces: BTreeMap<WorkspaceId, WorkspaceDocuments>,
    pub session: SessionState,
}

impl MirrorSnapshot {
    pub fn documents(&self, workspace: &WorkspaceId) -> impl Iterator<Item = &Document> {
        self.workspaces.get(workspace).into_iter().flat_map(|docs| docs.values())
    }

    pub fn get(&self, workspace: &WorkspaceId, path: &str) -> Option<&Document> {
        self.workspaces.get(workspace).and_then(|docs| docs.get(path))
    }

    /// Insert unless an existing entry at the path is strictly newer.
    ///
    /// Equal timestamps replace, so a cleared copy of a document overwrites
    /// the original.
    pub fn upsert(&mut self, workspace: &WorkspaceId, document: Document) -> bool {
        let docs = self.workspaces.entry(workspace.clone()).or_default();
        match docs.get(&document.path) {
            Some(existing) if existing.timestamp > document.timestamp => false,
            Some(existing) if *existing == document => false,
            _ => {
                docs.insert(document.path.clone(), document);
                true
            }
        }
    }

    pub fn document_count(&self) -> usize {
        self.workspaces.values().map(BTreeMap::len).sum()
    }
}

pub struct Mirror<B: MirrorBackend> {
    backend: B,
    snapshot: MirrorSnapshot,
}

impl<B: MirrorBackend> Mirror<B> {
    /// Open the mirror and load whatever state the backend holds.
    pub fn open(backend: B) -> Self {
        let snapshot = load_snapshot(&backend);
        info!(
            workspaces = snapshot.workspaces.len(),
            documents = snapshot.document_count(),
            "mirror snapshot loaded"
        );
        Self { backend, snapshot }
    }

    pub fn snapshot(&self) -> &MirrorSnapshot {
        &self.snapshot
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mirror an accepted store write and persist its workspace.
    pub fn on_external_write(&mut self, event: &WriteEvent) -> bool {
        if !self.snapshot.upsert(&event.workspace, event.document.clone()) {
            debug!(path = %event.document.path, "mirror already up to date");
            return false;
        }

        if let Err(error) = self.persist_workspace(&event.workspace) {
            warn!(workspace = %event.workspace, ?error, "failed to persist mirrored documents");
        }
        true
    }

    /// Persist the one session field that changed.
    pub fn on_session_change(&mut self, change: &SessionChange) {
        let session = &mut self.snapshot.session;
        let result = match change {
            SessionChange::Identity(identity) => {
                session.identity = identity.clone();
                put_json(&mut self.backend, IDENTITY_KEY, identity)
            }
            SessionChange::Online(online) => {
                session.online = *online;
                put_json(&mut self.backend, ONLINE_KEY, online)
            }
            SessionChange::Workspace(workspace) => {
                session.workspace = workspace.clone();
                put_json(&mut self.backend, WORKSPACE_KEY, workspace)
            }
            SessionChange::Relays(relays) => {
                session.relays = relays.clone();
                put_json(&mut self.backend, RELAYS_KEY, relays)
            }
        };

        if let Err(error) = result {
            warn!(?error, "failed to persist session change");
        }
    }

    /// Drop documents older than the render horizon and persist what changed.
    pub fn compact(&mut self, now: Millis) -> usize {
        let horizon = (now - HORIZON).to_micros();
        let mut dropped = 0;
        let mut touched = Vec::new();

        for (workspace, docs) in &mut self.snapshot.workspaces {
            let before = docs.len();
            docs.retain(|_, doc| doc.timestamp >= horizon);
            if docs.len() != before {
                dropped += before - docs.len();
                touched.push(workspace.clone());
            }
        }

        for workspace in touched {
            if let Err(error) = self.persist_workspace(&workspace) {
                warn!(%workspace, ?error, "failed to persist compacted documents");
            }
        }
        if dropped > 0 {
            info!(dropped, "compacted mirror past horizon");
        }
        dropped
    }

    /// Write the full snapshot: every workspace and every session field.
    pub fn persist(&mut self) -> Result<()> {
        let workspaces: Vec<WorkspaceId> = self.snapshot.workspaces.keys().cloned().collect();
        for workspace in &workspaces {
            self.persist_workspace(workspace)?;
        }

        let session = self.snapshot.session.clone();
        put_json(&mut self.backend, IDENTITY_KEY, &session.identity)?;
        put_json(&mut self.backend, ONLINE_KEY, &session.online)?;
        put_json(&mut self.backend, WORKSPACE_KEY, &session.workspace)?;
        put_json(&mut self.backend, RELAYS_KEY, &session.relays)?;
        Ok(())
    }

    fn persist_workspace(&mut self, workspace: &WorkspaceId) -> Result<()> {
        let empty = WorkspaceDocuments::new();
        let docs = self.snapshot.workspaces.get(workspace).unwrap_or(&empty);
        put_json(&mut self.backend, &documents_key(workspace), docs)
    }
}

/// Read the snapshot held by `backend`. Never fails.
pub fn load_snapshot(backend: &impl MirrorBackend) -> MirrorSnapshot {
    let mut snapshot = MirrorSnapshot::default();

    match backend.keys_with_prefix(DOCUMENTS_PREFIX) {
        Ok(keys) => {
            for key in keys {
                let Some(workspace) = key.strip_prefix(DOCUMENTS_PREFIX) else {
                    continue;
                };
                if let Some(docs) = read_json::<WorkspaceDocuments>(backend, &key) {
                    snapshot.workspaces.insert(WorkspaceId::new(workspace), docs);
                }
            }
        }
        Err(error) => warn!(?error, "failed to list mirrored workspaces"),
    }

    let session = &mut snapshot.session;
    session.identity = read_json::<Option<Keypair>>(backend, IDENTITY_KEY).flatten();
    session.online = read_json(backend, ONLINE_KEY).unwrap_or_default();
    session.workspace = read_json::<Option<WorkspaceId>>(backend, WORKSPACE_KEY).flatten();
    session.relays = read_json(backend, RELAYS_KEY).unwrap_or_default();

    snapshot
}

fn documents_key(workspace: &WorkspaceId) -> String {
    format!("{DOCUMENTS_PREFIX}{workspace}")
}

fn read_json<T: DeserializeOwned>(backend: &impl MirrorBackend, key: &str) -> Option<T> {
    let raw = match backend.get(key) {
        Ok(raw) => raw?,
        Err(error) => {
            warn!(key, ?error, "failed to read mirror entry");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(error) => {
            warn!(key, %error, "ignoring malformed mirror entry");
            None
        }
    }
}

fn put_json<T: Serialize + ?Sized>(
    backend: &mut impl MirrorBackend,
    key: &str,
    value: &T,
) -> Result<()> {
    let encoded = serde_json::to_string(value)
        .with_context(|| format!("failed to encode mirror entry `{key}`"))?;
    backend.put(key, &encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::backend::MemoryBackend;
    use twodays_common::time::Micros;

    const T: i64 = 1_700_000_000_000_000;

    fn ws() -> WorkspaceId {
        WorkspaceId::new("+plaza.test")
    }

    fn doc(path: &str, content: &str, timestamp: i64) -> Document {
        Document {
            path: path.into(),
            author: "@suzy.b1".into(),
            content: content.into(),
            timestamp: Micros(timestamp),
            delete_after: Some(Micros(timestamp + 1_000_000)),
        }
    }

    fn event(document: Document) -> WriteEvent {
        WriteEvent { workspace: ws(), document, is_local: false, is_latest: true }
    }

    #[test]
    fn empty_backend_loads_empty_snapshot() {
        let mirror = Mirror::open(MemoryBackend::new());
        assert_eq!(mirror.snapshot(), &MirrorSnapshot::default());
    }

    #[test]
    fn write_is_persisted_per_workspace() {
        let mut mirror = Mirror::open(MemoryBackend::new());
        assert!(mirror.on_external_write(&event(doc("/a!", "hi", T))));

        let raw = mirror.backend().get("documents/+plaza.test").unwrap().expect("entry persisted");
        let docs: WorkspaceDocuments = serde_json::from_str(&raw).unwrap();
        assert_eq!(docs["/a!"].content, "hi");
    }

    #[test]
    fn older_write_does_not_replace_newer() {
        let mut mirror = Mirror::open(MemoryBackend::new());
        mirror.on_external_write(&event(doc("/a!", "new", T + 10)));
        assert!(!mirror.on_external_write(&event(doc("/a!", "old", T))));
        assert_eq!(mirror.snapshot().get(&ws(), "/a!").unwrap().content, "new");
    }

    #[test]
    fn cleared_copy_with_same_timestamp_replaces() {
        let mut mirror = Mirror::open(MemoryBackend::new());
        let original = doc("/a!", "hi", T);
        mirror.on_external_write(&event(original.clone()));

        assert!(mirror.on_external_write(&event(original.cleared())));
        assert!(mirror.snapshot().get(&ws(), "/a!").unwrap().is_past());

        assert!(!mirror.on_external_write(&event(original.cleared())));
    }

    #[test]
    fn session_fields_persist_independently() {
        let mut backend = MemoryBackend::new();
        backend.put(IDENTITY_KEY, "{not json").unwrap();
        let mut mirror = Mirror::open(backend);

        mirror.on_session_change(&SessionChange::Online(true));
        mirror.on_session_change(&SessionChange::Relays(vec!["https://pub.example".into()]));

        let reloaded = load_snapshot(mirror.backend());
        assert!(reloaded.session.online);
        assert_eq!(reloaded.session.relays, vec!["https://pub.example".to_string()]);
        assert!(reloaded.session.identity.is_none());
    }

    #[test]
    fn malformed_workspace_entry_is_skipped() {
        let mut backend = MemoryBackend::new();
        backend.put("documents/+broken", "[1, 2").unwrap();
        backend.put(ONLINE_KEY, "true").unwrap();

        let snapshot = load_snapshot(&backend);
        assert!(snapshot.workspaces.is_empty());
        assert!(snapshot.session.online);
    }

    #[test]
    fn compact_drops_documents_past_horizon() {
        let mut mirror = Mirror::open(MemoryBackend::new());
        let now = Micros(T).to_millis();
        let three_days = 3 * 86_400_000_000;
        mirror.on_external_write(&event(doc("/old!", "x", T - three_days)));
        mirror.on_external_write(&event(doc("/new!", "y", T)));

        assert_eq!(mirror.compact(now), 1);
        assert!(mirror.snapshot().get(&ws(), "/old!").is_none());

        let reloaded = load_snapshot(mirror.backend());
        assert_eq!(reloaded.document_count(), 1);
    }

    #[test]
    fn full_persist_round_trips() {
        let mut mirror = Mirror::open(MemoryBackend::new());
        mirror.on_external_write(&event(doc("/a!", "hi", T)));
        mirror.on_session_change(&SessionChange::Identity(Some(Keypair {
            address: "@suzy.b1".into(),
            secret: "s".into(),
        })));
        mirror.persist().expect("persist should succeed");

        assert_eq!(&load_snapshot(mirror.backend()), mirror.snapshot());
    }
}
