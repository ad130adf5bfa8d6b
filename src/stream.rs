//! An owned event stream over a tail session, for consumers who prefer
//! `Stream` combinators to callbacks.

use crate::events::{Callback, EventKind, TailEvent};
use crate::session::Tail;
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// A `futures::Stream` yielding every event a session emits.
///
/// Created by [`Tail::events`]. The stream observes events emitted after
/// its creation; dropping it stops observing without affecting the
/// session. It ends when the session is dropped.
pub struct TailEvents {
    receiver: mpsc::UnboundedReceiver<TailEvent>,
}

impl Tail {
    /// Subscribes to all event kinds at once and returns them as an owned
    /// stream.
    pub fn events(&self) -> TailEvents {
        let (tx, rx) = mpsc::unbounded_channel();
        let forward: Callback = Arc::new(move |event: &TailEvent| {
            let _ = tx.send(event.clone());
        });
        for kind in EventKind::ALL {
            self.on(kind, Arc::clone(&forward));
        }
        TailEvents { receiver: rx }
    }
}

impl Stream for TailEvents {
    type Item = TailEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}
