// One-shot discard timers for tracked documents.
//
// Timers live in a min-heap of `(fire_at, generation, key)`. Re-tracking a
// different document set cancels every armed timer and arms fresh ones; a
// heap entry whose generation no longer matches its key is skipped on drain.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap};

use tracing::debug;
use twodays_common::time::{Micros, Millis};
use twodays_common::types::{DocKey, Document, WorkspaceId};

/// A tracked document version. A rewrite at the same path is a new revision.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Revision {
    key: DocKey,
    timestamp: Micros,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Timer {
    fire_at: Micros,
    generation: u64,
    key: DocKey,
}

#[derive(Debug)]
struct Armed {
    generation: u64,
    document: Document,
}

/// A timer that fired: the document it was armed for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueDiscard {
    pub key: DocKey,
    pub document: Document,
}

#[derive(Debug, Default)]
pub struct DiscardScheduler {
    heap: BinaryHeap<Reverse<Timer>>,
    armed: HashMap<DocKey, Armed>,
    tracked: BTreeSet<Revision>,
    next_generation: u64,
}

impl DiscardScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the tracked set.
    ///
    /// Returns `true` when the set changed and timers were re-armed. Only
    /// documents whose `deleteAfter` is still ahead of `now` get a timer.
    pub fn track(&mut self, workspace: &WorkspaceId, docs: &[Document], now: Millis) -> bool {
        let revisions: BTreeSet<Revision> = docs
            .iter()
            .map(|doc| Revision { key: doc.key(workspace), timestamp: doc.timestamp })
            .collect();
        if revisions == self.tracked {
            return false;
        }

        self.cancel_all();
        self.tracked = revisions;

        let now = now.to_micros();
        for doc in docs {
            match doc.delete_after {
                Some(delete_after) if delete_after > now => {
                    self.arm(doc.key(workspace), doc.clone(), delete_after);
                }
                _ => {}
            }
        }
        debug!(tracked = self.tracked.len(), armed = self.armed.len(), "discard timers re-armed");
        true
    }

    fn arm(&mut self, key: DocKey, document: Document, fire_at: Micros) {
        self.next_generation += 1;
        let generation = self.next_generation;
        self.armed.insert(key.clone(), Armed { generation, document });
        self.heap.push(Reverse(Timer { fire_at, generation, key }));
    }

    /// Cancel every timer and forget the tracked set.
    pub fn cancel_all(&mut self) {
        self.heap.clear();
        self.armed.clear();
        self.tracked.clear();
    }

    /// Earliest time at which a live timer fires.
    pub fn next_deadline(&self) -> Option<Micros> {
        self.heap
            .iter()
            .filter(|Reverse(timer)| self.is_live(timer))
            .map(|Reverse(timer)| timer.fire_at)
            .min()
    }

    /// Pop every timer due at or before `now`, in firing order.
    pub fn drain_due(&mut self, now: Millis) -> Vec<DueDiscard> {
        let now = now.to_micros();
        let mut due = Vec::new();

        while let Some(Reverse(timer)) = self.heap.peek() {
            if timer.fire_at > now {
                break;
            }
            let Some(Reverse(timer)) = self.heap.pop() else {
                break;
            };
            if !self.is_live(&timer) {
                continue;
            }
            if let Some(armed) = self.armed.remove(&timer.key) {
                due.push(DueDiscard { key: timer.key, document: armed.document });
            }
        }

        due
    }

    pub fn armed_len(&self) -> usize {
        self.armed.len()
    }

    fn is_live(&self, timer: &Timer) -> bool {
        self.armed.get(&timer.key).is_some_and(|armed| armed.generation == timer.generation)
    }
}
