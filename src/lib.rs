//! A tail engine that incrementally follows a growing file.
//!
//! [`Tail`] watches a file path for changes, computes which bytes were
//! appended since the last observation, reads exactly those bytes in
//! bounded-size chunks, and emits them as `data` events. A file that
//! shrank is treated as truncated: the session re-baselines to the new
//! size and keeps following instead of failing.
//!
//! Subscribers register callbacks per event kind (`open`, `data`,
//! `change`, `error`, `end`), or consume everything as a stream via
//! [`Tail::events`].
//!
//! # Example
//!
//! ```rust,no_run
//! use file_tail::{EventKind, Tail, TailEvent};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tail = Tail::create("app.log")?;
//!
//!     tail.on(
//!         EventKind::Data,
//!         Arc::new(|event: &TailEvent| {
//!             if let TailEvent::Data { text, .. } = event {
//!                 print!("{text}");
//!             }
//!         }),
//!     )
//!     .open();
//!
//!     tokio::signal::ctrl_c().await?;
//!     tail.close();
//!     Ok(())
//! }
//! ```
//!
//! # Limitations
//!
//! Truncation is detected by size comparison alone: replacing the file
//! with different content of the same or smaller size is indistinguishable
//! from a plain truncation, and the new content up to the old baseline is
//! not re-read.

// Internal modules - not part of public API
mod config;
mod delta;
mod error;
mod events;
mod fs;
mod monitor;
mod session;
mod stream;

#[cfg(test)]
mod test_helpers;

// Public API exports
pub use config::{Encoding, TailOptions};
pub use error::{Error, Result};
pub use events::{Callback, EventKind, TailEvent};
pub use fs::{FileHandle, FileSystem, TokioFileSystem};
pub use session::Tail;
pub use stream::TailEvents;

use std::path::Path;

/// Creates a session with `options`, subscribes an owned event stream and
/// opens it.
///
/// The returned [`Tail`] must be kept alive while the stream is consumed;
/// dropping it closes the session.
///
/// ```rust,no_run
/// use file_tail::{follow, TailEvent, TailOptions};
/// use tokio_stream::StreamExt;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let (_tail, mut events) = follow("app.log", TailOptions::default())?;
///
///     while let Some(event) = events.next().await {
///         if let TailEvent::Data { text, .. } = event {
///             print!("{text}");
///         }
///     }
///
///     Ok(())
/// }
/// ```
pub fn follow<P: AsRef<Path>>(path: P, options: TailOptions) -> Result<(Tail, TailEvents)> {
    let tail = Tail::with_options(path, options)?;
    let events = tail.events();
    tail.open();
    Ok((tail, events))
}
