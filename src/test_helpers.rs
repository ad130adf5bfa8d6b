//! Test utilities: a scripted filesystem double and an event collector.

use crate::events::{Callback, EventKind, TailEvent};
use crate::fs::{FileHandle, FileSystem};
use crate::session::Tail;
use futures::future::BoxFuture;
use std::collections::VecDeque;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

/// Collects every event a session emits, in emission order.
#[derive(Clone, Default)]
pub(crate) struct EventLog {
    events: Arc<Mutex<Vec<TailEvent>>>,
}

impl EventLog {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// A fresh collector callback. Each call returns a distinct `Arc`, so
    /// dedup tests must clone one callback instead of calling this twice.
    pub(crate) fn callback(&self) -> Callback {
        let events = Arc::clone(&self.events);
        Arc::new(move |event: &TailEvent| {
            events.lock().unwrap().push(event.clone());
        })
    }

    pub(crate) fn subscribe_all(&self, tail: &Tail) {
        for kind in EventKind::ALL {
            tail.on(kind, self.callback());
        }
    }

    pub(crate) fn snapshot(&self) -> Vec<TailEvent> {
        self.events.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, kind: EventKind) -> usize {
        self.snapshot().iter().filter(|e| e.kind() == kind).count()
    }

    /// Polls until `predicate` holds for the collected events or `timeout`
    /// elapses.
    pub(crate) async fn wait_for<F>(&self, predicate: F, timeout: Duration) -> bool
    where
        F: Fn(&[TailEvent]) -> bool,
    {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if predicate(&self.snapshot()) {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

/// Scripted file state shared between a test and the handles handed out by
/// [`ScriptedFs`].
#[derive(Default)]
pub(crate) struct ScriptedHandle {
    /// Scripted size observations, served front to back; once drained,
    /// `size()` falls back to the current content length.
    sizes: Mutex<VecDeque<io::Result<u64>>>,
    pub(crate) content: Mutex<Vec<u8>>,
    /// Every `(offset, len)` read request, in issue order.
    pub(crate) reads: Mutex<Vec<(u64, usize)>>,
    pub(crate) fail_reads: AtomicBool,
    pub(crate) fail_close: AtomicBool,
    pub(crate) closes: AtomicUsize,
    /// When set, reads block on a permit before completing.
    pub(crate) read_gate: Mutex<Option<Arc<Semaphore>>>,
}

impl ScriptedHandle {
    pub(crate) fn push_size(&self, size: io::Result<u64>) {
        self.sizes.lock().unwrap().push_back(size);
    }
}

struct HandleRef(Arc<ScriptedHandle>);

impl FileHandle for HandleRef {
    fn size(&self) -> BoxFuture<'static, io::Result<u64>> {
        let state = Arc::clone(&self.0);
        Box::pin(async move {
            match state.sizes.lock().unwrap().pop_front() {
                Some(result) => result,
                None => Ok(state.content.lock().unwrap().len() as u64),
            }
        })
    }

    fn read_at(&self, offset: u64, len: usize) -> BoxFuture<'static, io::Result<Vec<u8>>> {
        let state = Arc::clone(&self.0);
        Box::pin(async move {
            let gate = state.read_gate.lock().unwrap().clone();
            if let Some(gate) = gate {
                gate.acquire().await.unwrap().forget();
            }
            state.reads.lock().unwrap().push((offset, len));
            if state.fail_reads.load(Ordering::SeqCst) {
                return Err(io::Error::other("scripted read failure"));
            }
            let content = state.content.lock().unwrap();
            let start = (offset as usize).min(content.len());
            let end = (start + len).min(content.len());
            Ok(content[start..end].to_vec())
        })
    }

    fn close(&self) -> BoxFuture<'static, io::Result<()>> {
        let state = Arc::clone(&self.0);
        Box::pin(async move {
            state.closes.fetch_add(1, Ordering::SeqCst);
            if state.fail_close.load(Ordering::SeqCst) {
                Err(io::Error::other("scripted close failure"))
            } else {
                Ok(())
            }
        })
    }
}

/// A [`FileSystem`] whose size observations and failures are driven by the
/// test instead of a real file.
#[derive(Default)]
pub(crate) struct ScriptedFs {
    pub(crate) handle: Arc<ScriptedHandle>,
    /// Number of `open` calls, successful or not.
    pub(crate) opens: AtomicUsize,
    pub(crate) fail_open: AtomicBool,
}

impl ScriptedFs {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn with_content(content: &[u8]) -> Arc<Self> {
        let fs = Self::default();
        *fs.handle.content.lock().unwrap() = content.to_vec();
        Arc::new(fs)
    }
}

impl FileSystem for ScriptedFs {
    fn open(&self, _path: &Path) -> BoxFuture<'static, io::Result<Arc<dyn FileHandle>>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let fail = self.fail_open.load(Ordering::SeqCst);
        let state = Arc::clone(&self.handle);
        Box::pin(async move {
            if fail {
                Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    "scripted open failure",
                ))
            } else {
                Ok(Arc::new(HandleRef(state)) as Arc<dyn FileHandle>)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_handle_serves_content_ranges() {
        let fs = ScriptedFs::with_content(b"0123456789");
        let handle = fs.open(Path::new("any")).await.unwrap();

        assert_eq!(handle.read_at(2, 4).await.unwrap(), b"2345");
        assert_eq!(handle.read_at(8, 10).await.unwrap(), b"89");
        assert_eq!(*fs.handle.reads.lock().unwrap(), vec![(2, 4), (8, 10)]);
    }

    #[tokio::test]
    async fn test_scripted_sizes_are_served_in_order() {
        let fs = ScriptedFs::with_content(b"abc");
        fs.handle.push_size(Ok(7));
        let handle = fs.open(Path::new("any")).await.unwrap();

        assert_eq!(handle.size().await.unwrap(), 7);
        // Drained scripts fall back to the content length.
        assert_eq!(handle.size().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_event_log_counts_by_kind() {
        let log = EventLog::new();
        let callback = log.callback();

        callback(&TailEvent::Change);
        callback(&TailEvent::Change);
        callback(&TailEvent::End);

        assert_eq!(log.count(EventKind::Change), 2);
        assert_eq!(log.count(EventKind::End), 1);
        assert_eq!(log.count(EventKind::Data), 0);
    }
}
