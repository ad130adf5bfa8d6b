//! The tail session: open/close lifecycle, size tracking and the
//! delta-read driver.

use crate::config::TailOptions;
use crate::delta::{self, ChunkSpan};
use crate::error::{Error, Result};
use crate::events::{Callback, EventKind, Handlers, TailEvent};
use crate::fs::{FileHandle, FileSystem, TokioFileSystem};
use crate::monitor::{self, ChangeMonitor};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// An incremental follower of one growing file.
///
/// A session is created idle. [`open`](Tail::open) starts it: the file is
/// opened, its current size becomes the consumed baseline, and a poller
/// begins watching the path. Every time the file grows, the bytes between
/// the baseline and the new size are read in chunks of at most
/// `chunk_size` bytes and emitted as `data` events. A file that shrank is
/// treated as truncated: the baseline snaps down to the new size and
/// tailing continues from there.
///
/// All I/O failures surface through the `error` event and close the
/// session; it can be reopened with [`open`](Tail::open), which takes a
/// fresh baseline. Public operations are expected to be driven from one
/// logical owner and must run inside a tokio runtime.
pub struct Tail {
    inner: Arc<Inner>,
}

struct Inner {
    path: PathBuf,
    options: TailOptions,
    fs: Arc<dyn FileSystem>,
    state: Mutex<State>,
    handlers: Mutex<Handlers>,
}

#[derive(Default)]
struct State {
    started: bool,
    handle: Option<Arc<dyn FileHandle>>,
    consumed: u64,
    monitor: Option<JoinHandle<()>>,
    /// Bumped on every `open`; async completions compare it before acting
    /// so work from a previous cycle cannot emit into the current one.
    generation: u64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Tail {
    /// Creates an idle session for `path` with default options.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_options(path, TailOptions::default())
    }

    /// Creates an idle session for `path` with the given options.
    pub fn with_options<P: AsRef<Path>>(path: P, options: TailOptions) -> Result<Self> {
        Self::with_file_system(path, options, Arc::new(TokioFileSystem))
    }

    /// Creates a session against a custom [`FileSystem`] collaborator.
    pub fn with_file_system<P: AsRef<Path>>(
        path: P,
        options: TailOptions,
        fs: Arc<dyn FileSystem>,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if path.as_os_str().is_empty() {
            return Err(Error::InvalidArgument("no file path given".to_string()));
        }
        options.validate()?;

        Ok(Self {
            inner: Arc::new(Inner {
                path,
                options,
                fs,
                state: Mutex::new(State::default()),
                handlers: Mutex::new(Handlers::default()),
            }),
        })
    }

    /// The tailed path.
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// The session's configuration.
    pub fn options(&self) -> &TailOptions {
        &self.inner.options
    }

    /// True while the session is started and a handle is open.
    pub fn is_open(&self) -> bool {
        let state = lock(&self.inner.state);
        state.started && state.handle.is_some()
    }

    /// Bytes of the file accounted for so far (the read baseline).
    pub fn consumed_bytes(&self) -> u64 {
        lock(&self.inner.state).consumed
    }

    /// Subscribes `callback` to `kind` events. Registering a clone of an
    /// already-subscribed callback for the same kind is a no-op.
    pub fn on(&self, kind: EventKind, callback: Callback) -> &Self {
        lock(&self.inner.handlers).add(kind, callback);
        self
    }

    /// Removes every subscription for `kind`.
    pub fn off(&self, kind: EventKind) -> &Self {
        lock(&self.inner.handlers).clear(kind);
        self
    }

    /// Removes one specific subscription, matched by `Arc` identity.
    pub fn off_handler(&self, kind: EventKind, callback: &Callback) -> &Self {
        lock(&self.inner.handlers).remove(kind, callback);
        self
    }

    /// Removes every subscription for every kind.
    pub fn off_all(&self) -> &Self {
        lock(&self.inner.handlers).clear_all();
        self
    }

    /// Starts the session. A no-op while already started, so calling it
    /// twice performs exactly one underlying open.
    pub fn open(&self) -> &Self {
        let generation = {
            let mut state = lock(&self.inner.state);
            if state.started {
                return self;
            }
            state.started = true;
            state.generation += 1;
            state.generation
        };

        debug!(path = %self.inner.path.display(), "opening tail session");
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            open_task(inner, generation).await;
        });
        self
    }

    /// Stops the session: the poller is unsubscribed, the handle released
    /// and a single `end` event emitted. A no-op while already idle, so
    /// repeated closes emit nothing further.
    pub fn close(&self) -> &Self {
        close_session(&self.inner);
        self
    }
}

impl Drop for Tail {
    fn drop(&mut self) {
        close_session(&self.inner);
    }
}

/// Run one kind's callbacks in registration order. The handler lock is not
/// held while user code runs, so callbacks may re-enter the session.
fn emit(inner: &Inner, event: TailEvent) {
    let callbacks = lock(&inner.handlers).snapshot(event.kind());
    for callback in callbacks {
        callback(&event);
    }
}

fn emit_error(inner: &Inner, error: Error) {
    emit(inner, TailEvent::Error(Arc::new(error)));
}

fn is_current(inner: &Inner, generation: u64) -> bool {
    let state = lock(&inner.state);
    state.started && state.generation == generation
}

fn current_handle(inner: &Inner, generation: u64) -> Option<Arc<dyn FileHandle>> {
    let state = lock(&inner.state);
    if state.started && state.generation == generation {
        state.handle.clone()
    } else {
        None
    }
}

async fn open_task(inner: Arc<Inner>, generation: u64) {
    let handle = match inner.fs.open(&inner.path).await {
        Ok(handle) => handle,
        Err(source) => {
            emit_error(
                &inner,
                Error::Open {
                    path: inner.path.clone(),
                    source,
                },
            );
            close_session(&inner);
            return;
        }
    };

    {
        let mut state = lock(&inner.state);
        if !state.started || state.generation != generation {
            // Closed (or reopened) while the open was in flight.
            return;
        }
        state.handle = Some(Arc::clone(&handle));
    }
    emit(&inner, TailEvent::Open(inner.path.clone()));

    // Everything already in the file belongs to the baseline; only growth
    // observed from here on is emitted.
    let size = match handle.size().await {
        Ok(size) => size,
        Err(source) => {
            emit_error(&inner, Error::Stat { source });
            close_session(&inner);
            return;
        }
    };

    {
        let mut state = lock(&inner.state);
        if !state.started || state.generation != generation {
            return;
        }
        state.consumed = size;
    }

    let monitor = tokio::spawn(monitor_task(Arc::clone(&inner), generation));
    let mut state = lock(&inner.state);
    if !state.started || state.generation != generation {
        monitor.abort();
        return;
    }
    state.monitor = Some(monitor);
}

/// Watch for ticks and drive the stat + delta pipeline once per tick.
async fn monitor_task(inner: Arc<Inner>, generation: u64) {
    let mut monitor = match ChangeMonitor::new(&inner.path, inner.options.poll_interval) {
        Ok(monitor) => monitor,
        Err(error) => {
            emit_error(&inner, error);
            close_session(&inner);
            return;
        }
    };
    if let Err(error) = monitor.subscribe() {
        emit_error(&inner, error);
        close_session(&inner);
        return;
    }
    debug!(path = %inner.path.display(), "watching for changes");

    let file_name = inner
        .path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();

    while let Some(event) = monitor.next_event().await {
        if !is_current(&inner, generation) {
            break;
        }
        match event {
            Ok(event) if monitor::is_tick_for_file(&event, &file_name) => {
                emit(&inner, TailEvent::Change);
                consume_delta(&inner, generation).await;
            }
            Ok(_) => {}
            Err(error) => {
                warn!(path = %inner.path.display(), %error, "watcher failed");
                emit_error(&inner, Error::Watcher(error));
                close_session(&inner);
                break;
            }
        }
    }
}

/// One pass of the pipeline: observe the size, re-baseline on shrink, then
/// issue every chunk read of the remaining delta without awaiting any.
async fn consume_delta(inner: &Arc<Inner>, generation: u64) {
    let Some(handle) = current_handle(inner, generation) else {
        // The session left `started` under us; finish closing instead of
        // acting on stale data.
        close_session(inner);
        return;
    };

    let size = match handle.size().await {
        Ok(size) => size,
        Err(source) => {
            emit_error(inner, Error::Stat { source });
            close_session(inner);
            return;
        }
    };

    let spans = {
        let mut state = lock(&inner.state);
        if !state.started || state.generation != generation {
            return;
        }
        if delta::detect_truncation(size, state.consumed) {
            debug!(from = state.consumed, to = size, "file shrank, re-baselining");
            state.consumed = size;
        }
        delta::chunk_spans(state.consumed, size, inner.options.chunk_size)
    };

    // Completions land in whatever order the reads finish, so `data`
    // events of one delta are not ordered by byte position.
    for span in spans {
        let inner = Arc::clone(inner);
        let handle = Arc::clone(&handle);
        tokio::spawn(async move {
            let result = handle.read_at(span.offset, span.len).await;
            finish_chunk(&inner, generation, span, result);
        });
    }
}

/// Handle one chunk read completion: account and emit on success, report
/// and close on failure, drop silently when the cycle is gone.
fn finish_chunk(
    inner: &Arc<Inner>,
    generation: u64,
    span: ChunkSpan,
    result: io::Result<Vec<u8>>,
) {
    if !is_current(inner, generation) {
        trace!(offset = span.offset, "dropping stale chunk completion");
        return;
    }

    let bytes = match result {
        Ok(bytes) => bytes,
        Err(source) => {
            emit_error(
                inner,
                Error::Read {
                    offset: span.offset,
                    source,
                },
            );
            close_session(inner);
            return;
        }
    };

    let read = bytes.len();
    let text = match inner.options.encoding.decode(bytes) {
        Ok(text) => text,
        Err(error) => {
            emit_error(inner, error);
            close_session(inner);
            return;
        }
    };

    {
        let mut state = lock(&inner.state);
        if !state.started || state.generation != generation {
            return;
        }
        state.consumed += read as u64;
    }
    emit(inner, TailEvent::Data { text, bytes: read });
}

/// The close sequence: unsubscribe the monitor, release the handle, then
/// emit `end` exactly once. Safe to call from any path, including drop.
fn close_session(inner: &Arc<Inner>) {
    let handle = {
        let mut state = lock(&inner.state);
        if !state.started {
            return;
        }
        state.started = false;
        if let Some(monitor) = state.monitor.take() {
            monitor.abort();
        }
        state.handle.take()
    };
    debug!(path = %inner.path.display(), "closing tail session");

    match handle {
        Some(handle) => match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let inner = Arc::clone(inner);
                runtime.spawn(async move {
                    if let Err(source) = handle.close().await {
                        emit_error(&inner, Error::Close { source });
                    }
                    emit(&inner, TailEvent::End);
                });
            }
            Err(_) => {
                // Dropped outside a runtime: the descriptor is still
                // released, but the close cannot be awaited.
                drop(handle);
                emit(inner, TailEvent::End);
            }
        },
        None => emit(inner, TailEvent::End),
    }
}
