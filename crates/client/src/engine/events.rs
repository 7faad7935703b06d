// Ordered event queue between notification sources and the update loop.
//
// Store notifications, synthesized discard notices and session changes are
// pushed here as they happen and drained in FIFO order once per tick.

use std::collections::VecDeque;

use twodays_common::types::WriteEvent;

use crate::session::SessionChange;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// A write accepted by the document store.
    Write(WriteEvent),
    /// A field of the identity session changed.
    Session(SessionChange),
}

impl ClientEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Write(_) => "write",
            Self::Session(_) => "session",
        }
    }
}

#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<ClientEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: ClientEvent) {
        self.events.push_back(event);
    }

    /// Take every queued event, oldest first.
    pub fn drain(&mut self) -> Vec<ClientEvent> {
        self.events.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use twodays_common::time::Micros;
    use twodays_common::types::{Document, WorkspaceId};

    fn write(path: &str) -> ClientEvent {
        ClientEvent::Write(WriteEvent {
            workspace: WorkspaceId::new("+plaza.test"),
            document: Document {
                path: path.into(),
                author: "@a".into(),
                content: "x".into(),
                timestamp: Micros(1),
                delete_after: None,
            },
            is_local: false,
            is_latest: true,
        })
    }

    #[test]
    fn drains_in_push_order() {
        let mut queue = EventQueue::new();
        queue.push(write("/a"));
        queue.push(ClientEvent::Session(SessionChange::Online(true)));
        queue.push(write("/b"));

        let kinds: Vec<_> = queue.drain().iter().map(ClientEvent::kind).collect();
        assert_eq!(kinds, vec!["write", "session", "write"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn drain_on_empty_queue_is_empty() {
        let mut queue = EventQueue::new();
        assert!(queue.drain().is_empty());
        assert_eq!(queue.len(), 0);
    }
}
