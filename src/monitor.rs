//! Change detection built on the notify crate's stat poller.

use crate::error::Result;
use notify::{Config, Event, PollWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

/// Polls one file for changes at a fixed interval.
///
/// The watcher observes the file's parent directory non-recursively and the
/// session filters to events touching the tailed file, so rotation and
/// re-creation still produce ticks. Dropping the monitor stops the poller.
pub(crate) struct ChangeMonitor {
    watcher: PollWatcher,
    receiver: mpsc::UnboundedReceiver<notify::Result<Event>>,
    file_path: PathBuf,
}

impl ChangeMonitor {
    /// Creates a poller for the given path, ticking at `interval`. The
    /// interval is honored exactly as configured; there is no jitter or
    /// backoff.
    pub(crate) fn new<P: AsRef<Path>>(path: P, interval: Duration) -> Result<Self> {
        let file_path = path.as_ref().to_path_buf();

        let (tx, rx) = mpsc::unbounded_channel();

        let watcher = PollWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default().with_poll_interval(interval),
        )?;

        Ok(Self {
            watcher,
            receiver: rx,
            file_path,
        })
    }

    /// Starts delivering ticks for the tailed path.
    pub(crate) fn subscribe(&mut self) -> Result<()> {
        let watch_path = match self.file_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        self.watcher.watch(watch_path, RecursiveMode::NonRecursive)?;
        Ok(())
    }

    /// Returns the next raw watcher notification.
    pub(crate) async fn next_event(&mut self) -> Option<notify::Result<Event>> {
        self.receiver.recv().await
    }

    #[cfg(test)]
    pub(crate) fn file_path(&self) -> &Path {
        &self.file_path
    }
}

/// Check if a notify event is a tick for the tailed file.
pub(crate) fn is_tick_for_file(event: &Event, target_file_name: &str) -> bool {
    event.paths.iter().any(|path| {
        path.file_name()
            .map(|name| name.to_string_lossy() == target_file_name)
            .unwrap_or(false)
    })
}
