// The client update loop.
//
// Each tick: fire due discard timers, drain the event queue into the
// mirror, re-track the viewer's own log, and render a frame from the
// mirrored snapshot. Nothing here is fatal; failures are logged and the
// state stays whatever the last accepted write made it.

use serde::Serialize;
use tracing::{debug, info, warn};
use twodays_common::path::{
    display_name_path, is_display_name_path, log_path, message_path, APP_NAMESPACE,
};
use twodays_common::time::{Micros, Millis};
use twodays_common::types::{Document, Keypair, WorkspaceId, WriteEvent};

use crate::compose::{compose_display_name, compose_log, compose_message, SubmitError};
use crate::engine::events::{ClientEvent, EventQueue};
use crate::engine::expiry::classify;
use crate::engine::scheduler::DiscardScheduler;
use crate::identity::KeypairAuthority;
use crate::session::{IdentitySession, SessionChange, SessionError};
use crate::store::backend::MirrorBackend;
use crate::store::memory::MemoryStore;
use crate::store::mirror::Mirror;
use crate::store::{DocumentStore, StoreError};
use crate::view::fireplace::{fireplace, own_log, Fireplace, OwnLog};
use crate::view::narrative::{aggregate, Narrative};
use crate::view::projector::{resolve_display_name, Projector, RenameDisplay, ViewRecord};

/// Everything a UI needs for one render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    /// Oldest first. Suppressed renames are included and flagged.
    pub messages: Vec<ViewRecord>,
    pub narrative: Narrative,
    pub fireplace: Fireplace,
    pub own_log: OwnLog,
    pub connection: String,
}

pub struct Client<S: DocumentStore, B: MirrorBackend> {
    store: S,
    mirror: Mirror<B>,
    session: IdentitySession,
    scheduler: DiscardScheduler,
    projector: Projector,
    events: EventQueue,
}

impl<B: MirrorBackend> Client<MemoryStore, B> {
    /// Rebuild the client from a loaded mirror, before any network sync.
    ///
    /// The session comes from the snapshot; its workspace wins over
    /// `default_workspace`. Documents past the horizon are compacted away.
    pub fn restore(
        mut mirror: Mirror<B>,
        default_workspace: WorkspaceId,
        rename_display: RenameDisplay,
        now: Millis,
    ) -> Self {
        mirror.compact(now);

        let state = mirror.snapshot().session.clone();
        let workspace = state.workspace.clone().unwrap_or(default_workspace);
        let store = MemoryStore::from_documents(
            workspace.clone(),
            mirror.snapshot().documents(&workspace).cloned(),
        );
        info!(%workspace, documents = store.len(), "replayed mirror into store");

        let mut client = Self::new(store, mirror, IdentitySession::new(state), rename_display);
        if client.session.workspace() != Some(&workspace) {
            let change = client.session.set_workspace(Some(workspace));
            client.events.push(ClientEvent::Session(change));
        }
        client
    }
}

impl<S: DocumentStore, B: MirrorBackend> Client<S, B> {
    pub fn new(
        store: S,
        mirror: Mirror<B>,
        session: IdentitySession,
        rename_display: RenameDisplay,
    ) -> Self {
        let mut projector = Projector::new(rename_display);
        if let Some(keypair) = session.identity() {
            projector.set_identicon_salt(keypair.secret.clone());
        }
        Self {
            store,
            mirror,
            session,
            scheduler: DiscardScheduler::new(),
            projector,
            events: EventQueue::new(),
        }
    }

    pub fn workspace(&self) -> &WorkspaceId {
        self.store.workspace()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn mirror(&self) -> &Mirror<B> {
        &self.mirror
    }

    pub fn session(&self) -> &IdentitySession {
        &self.session
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// Queue a write notification from the store.
    ///
    /// Notifications for another workspace are refused and never mirrored.
    pub fn notify(&mut self, event: WriteEvent) -> Result<(), StoreError> {
        if &event.workspace != self.store.workspace() {
            debug!(workspace = %event.workspace, "notification for another workspace ignored");
            return Err(StoreError::WrongWorkspace(event.workspace));
        }
        self.events.push(ClientEvent::Write(event));
        Ok(())
    }

    /// Hand a document from sync to the store and queue its notification.
    pub fn ingest(&mut self, document: Document) -> Result<(), StoreError> {
        match self.store.ingest(document) {
            Ok(event) => self.notify(event),
            Err(error) => {
                debug!(%error, "ingest ignored");
                Err(error)
            }
        }
    }

    // ── Session ────────────────────────────────────────────────────

    fn apply_session(&mut self, change: SessionChange) {
        if let SessionChange::Identity(identity) = &change {
            let salt = identity.as_ref().map(|keypair| keypair.secret.clone()).unwrap_or_default();
            self.projector.set_identicon_salt(salt);
        }
        self.events.push(ClientEvent::Session(change));
    }

    /// Sign in with a keypair the identity collaborator already accepted.
    pub fn sign_in(&mut self, keypair: Keypair) {
        let change = self.session.sign_in(keypair);
        self.apply_session(change);
    }

    /// Create an identity, sign in, and write its initial display name.
    pub fn sign_in_new(
        &mut self,
        authority: &dyn KeypairAuthority,
        shortname: &str,
        display_name: &str,
        now: Millis,
    ) -> Result<Keypair, SessionError> {
        let (keypair, change) = self.session.sign_in_new(authority, shortname)?;
        self.apply_session(change);

        if let Some(write) = compose_display_name(&keypair.address, display_name) {
            match self.store.set(&keypair, write, now.to_micros()) {
                Ok(event) => self.events.push(ClientEvent::Write(event)),
                Err(error) => warn!(%error, "initial display name was not written"),
            }
        }
        Ok(keypair)
    }

    pub fn sign_in_existing(
        &mut self,
        authority: &dyn KeypairAuthority,
        keypair: Keypair,
    ) -> Result<(), SessionError> {
        let change = self.session.sign_in_existing(authority, keypair)?;
        self.apply_session(change);
        Ok(())
    }

    pub fn sign_out(&mut self) {
        let change = self.session.sign_out();
        self.apply_session(change);
    }

    pub fn set_online(&mut self, online: bool) {
        let change = self.session.set_online(online);
        self.apply_session(change);
    }

    pub fn set_relays(&mut self, relays: Vec<String>) {
        let change = self.session.set_relays(relays);
        self.apply_session(change);
    }

    // ── Submissions ────────────────────────────────────────────────

    /// Post a chat line. Returns how many documents were written.
    ///
    /// Every composed write is validated before the first one is issued, so
    /// a rejected submission leaves the store untouched.
    pub fn submit(&mut self, input: &str, now: Millis) -> Result<usize, SubmitError> {
        let keypair = self.session.identity().cloned().ok_or(SubmitError::Anonymous)?;
        let slot = self.free_message_slot(&keypair.address, now);
        let writes = compose_message(&keypair.address, input, slot)?;

        for write in &writes {
            write.validate(&keypair.address, now.to_micros()).map_err(|error| {
                warn!(%error, "message write rejected");
                StoreError::from(error)
            })?;
        }

        let mut written = 0;
        for write in writes {
            let event = self.store.set(&keypair, write, now.to_micros()).inspect_err(|error| {
                warn!(%error, "message write rejected");
            })?;
            self.events.push(ClientEvent::Write(event));
            written += 1;
        }
        Ok(written)
    }

    /// First millisecond at or after `now` whose message path is unused by `author`.
    fn free_message_slot(&self, author: &str, now: Millis) -> Millis {
        let mut slot = now;
        while self.store.get(&message_path(author, slot)).is_some() {
            slot = slot + Millis(1);
        }
        slot
    }

    /// Throw a log on the fire; one burning log per author.
    pub fn throw_log(&mut self, now: Millis) -> Result<(), SubmitError> {
        let keypair = self.session.identity().cloned().ok_or(SubmitError::Anonymous)?;
        let burning = self
            .store
            .get(&log_path(&keypair.address))
            .is_some_and(|doc| doc.is_living_at(now.to_micros()));
        if burning {
            return Err(SubmitError::LogAlreadyBurning);
        }

        let event = self
            .store
            .set(&keypair, compose_log(&keypair.address, now), now.to_micros())
            .inspect_err(|error| warn!(%error, "log write rejected"))?;
        self.events.push(ClientEvent::Write(event));
        Ok(())
    }

    // ── Update loop ────────────────────────────────────────────────

    /// Run one update and render the result.
    pub fn tick(&mut self, now: Millis) -> Frame {
        self.fire_due_discards(now);
        self.drain_events();
        self.retrack(now);
        self.render(now)
    }

    /// When the next discard timer fires, if any.
    pub fn next_deadline(&self) -> Option<Micros> {
        self.scheduler.next_deadline()
    }

    /// Cancel every scheduled discard.
    pub fn teardown(&mut self) {
        self.scheduler.cancel_all();
        debug!("discard timers cancelled");
    }

    fn fire_due_discards(&mut self, now: Millis) {
        let due = self.scheduler.drain_due(now);
        if due.is_empty() {
            return;
        }

        let purged = self.store.discard_expired(now.to_micros());
        for fired in &due {
            if !purged.iter().any(|doc| doc.path == fired.document.path) {
                debug!(path = %fired.document.path, "discard timer fired for a removed document");
            }
        }

        let workspace = self.store.workspace().clone();
        for document in purged {
            debug!(path = %document.path, "document discarded");
            self.events.push(ClientEvent::Write(WriteEvent {
                workspace: workspace.clone(),
                document: document.cleared(),
                is_local: true,
                is_latest: true,
            }));
        }
    }

    fn drain_events(&mut self) {
        for event in self.events.drain() {
            debug!(kind = event.kind(), "applying event");
            match event {
                ClientEvent::Write(write) => {
                    self.mirror.on_external_write(&write);
                }
                ClientEvent::Session(change) => self.mirror.on_session_change(&change),
            }
        }
    }

    fn retrack(&mut self, now: Millis) {
        let tracked: Vec<Document> = self
            .session
            .address()
            .and_then(|address| self.store.get(&log_path(address)))
            .filter(|doc| !doc.is_past())
            .into_iter()
            .collect();
        let workspace = self.store.workspace().clone();
        self.scheduler.track(&workspace, &tracked, now);
    }

    /// Render from the mirrored snapshot without advancing any state.
    pub fn render(&mut self, now: Millis) -> Frame {
        let now_micros = now.to_micros();
        let workspace = self.store.workspace();
        let snapshot = self.mirror.snapshot();

        let in_horizon: Vec<&Document> = snapshot
            .documents(workspace)
            .filter(|doc| classify(doc, now).is_renderable())
            .collect();

        let mut lines: Vec<&Document> = in_horizon
            .iter()
            .copied()
            .filter(|doc| doc.path.starts_with(APP_NAMESPACE))
            .filter(|doc| !is_display_name_path(&doc.path))
            .filter(|doc| doc.is_living_at(now_micros))
            .collect();
        lines.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.path.cmp(&b.path)));

        let mut messages = Vec::with_capacity(lines.len());
        for doc in lines {
            let name_doc = snapshot.get(workspace, &display_name_path(&doc.author));
            let display_name = resolve_display_name(&doc.author, name_doc);
            messages.push(self.projector.project(doc, &display_name, now));
        }

        let narrative = aggregate(
            in_horizon
                .iter()
                .copied()
                .filter(|doc| doc.path.starts_with(APP_NAMESPACE))
                .filter(|doc| !is_display_name_path(&doc.path)),
            self.session.address(),
            now_micros,
        );

        let own =
            self.session.address().and_then(|address| snapshot.get(workspace, &log_path(address)));

        Frame {
            messages,
            narrative,
            fireplace: fireplace(in_horizon.iter().copied(), now_micros),
            own_log: own_log(self.session.identity().is_some(), own, now),
            connection: self.session.connection_status(),
        }
    }
}
