//! Event kinds, payloads and the per-session subscription table.

use crate::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

/// The kinds of events a tail session emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Open,
    Data,
    Change,
    Error,
    End,
}

impl EventKind {
    /// Every kind a session can emit, in a stable order.
    pub const ALL: [EventKind; 5] = [
        EventKind::Open,
        EventKind::Data,
        EventKind::Change,
        EventKind::Error,
        EventKind::End,
    ];
}

/// Payload delivered to subscribers.
#[derive(Debug, Clone)]
pub enum TailEvent {
    /// The file was opened; carries the tailed path.
    Open(PathBuf),
    /// Newly appended content. `bytes` is the on-disk size of this chunk.
    /// Chunks of one delta are read concurrently, so their `Data` events
    /// may arrive out of byte order; reassemble using the byte counts.
    Data { text: String, bytes: usize },
    /// The watcher reported a change to the file.
    Change,
    /// An I/O failure. Fatal to the open cycle unless it came from the
    /// close sequence itself.
    Error(Arc<Error>),
    /// The close sequence finished. Fires exactly once per open cycle.
    End,
}

impl TailEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            TailEvent::Open(_) => EventKind::Open,
            TailEvent::Data { .. } => EventKind::Data,
            TailEvent::Change => EventKind::Change,
            TailEvent::Error(_) => EventKind::Error,
            TailEvent::End => EventKind::End,
        }
    }
}

/// A subscriber callback. Registrations are deduplicated per event kind by
/// `Arc` identity, so registering a clone of an already-subscribed callback
/// is a no-op.
pub type Callback = Arc<dyn Fn(&TailEvent) + Send + Sync + 'static>;

/// Ordered, unique-by-identity callback lists, one per event kind.
#[derive(Default)]
pub(crate) struct Handlers {
    open: Vec<Callback>,
    data: Vec<Callback>,
    change: Vec<Callback>,
    error: Vec<Callback>,
    end: Vec<Callback>,
}

impl Handlers {
    fn slot(&self, kind: EventKind) -> &Vec<Callback> {
        match kind {
            EventKind::Open => &self.open,
            EventKind::Data => &self.data,
            EventKind::Change => &self.change,
            EventKind::Error => &self.error,
            EventKind::End => &self.end,
        }
    }

    fn slot_mut(&mut self, kind: EventKind) -> &mut Vec<Callback> {
        match kind {
            EventKind::Open => &mut self.open,
            EventKind::Data => &mut self.data,
            EventKind::Change => &mut self.change,
            EventKind::Error => &mut self.error,
            EventKind::End => &mut self.end,
        }
    }

    pub(crate) fn add(&mut self, kind: EventKind, callback: Callback) {
        let slot = self.slot_mut(kind);
        if !slot.iter().any(|existing| Arc::ptr_eq(existing, &callback)) {
            slot.push(callback);
        }
    }

    pub(crate) fn remove(&mut self, kind: EventKind, callback: &Callback) {
        self.slot_mut(kind)
            .retain(|existing| !Arc::ptr_eq(existing, callback));
    }

    pub(crate) fn clear(&mut self, kind: EventKind) {
        self.slot_mut(kind).clear();
    }

    pub(crate) fn clear_all(&mut self) {
        for kind in EventKind::ALL {
            self.slot_mut(kind).clear();
        }
    }

    /// Registration-ordered copy of one kind's callbacks, so they can be
    /// invoked without holding the table's lock.
    pub(crate) fn snapshot(&self, kind: EventKind) -> Vec<Callback> {
        self.slot(kind).clone()
    }

    #[cfg(test)]
    pub(crate) fn len(&self, kind: EventKind) -> usize {
        self.slot(kind).len()
    }
}
