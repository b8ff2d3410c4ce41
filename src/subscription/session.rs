use crate::subscription::protocol::{EntityMessage, InboundError};
use crate::subscription::{Broadcaster, Subscriber};
use crate::world::Store;
use axum::extract::ws::Message;
use futures::{Sink, SinkExt, Stream, StreamExt};
use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Lifecycle of one persistent connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Closing,
    Closed,
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Client sent a close frame or the inbound stream ended
    ClientClosed,
    /// Reading from the transport failed
    ReadFailed,
    /// Writing to the transport failed
    WriteFailed,
    /// Removed from the broadcaster (queue overflow)
    Unregistered,
}

/// Pairs the inbound reader with the outbound sender for one connection
pub struct Session {
    store: Arc<Store>,
    broadcaster: Arc<Broadcaster>,
    state: SessionState,
}

impl Session {
    pub fn new(store: Arc<Store>, broadcaster: Arc<Broadcaster>) -> Self {
        Self {
            store,
            broadcaster,
            state: SessionState::Open,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Drive the connection until either side ends.
    ///
    /// The reader runs as its own task applying inbound frames to the store;
    /// this future drains the subscriber queue into `sink`. On return the
    /// subscriber is unregistered, the reader has exited and the queue is gone.
    pub async fn run<St, Si, E>(&mut self, stream: St, mut sink: Si) -> CloseReason
    where
        St: Stream<Item = Result<Message, E>> + Unpin + Send + 'static,
        E: Display + Send + 'static,
        Si: Sink<Message> + Unpin + Send,
        Si::Error: Display + Send,
    {
        let subscriber = self.broadcaster.register();
        let id = subscriber.id;
        self.state = SessionState::Open;
        info!(subscriber_id = %id, "Session open");

        // Set by the reader before it closes the queue on its own
        let reader_done = Arc::new(AtomicBool::new(false));
        let reader = tokio::spawn(read_loop(
            stream,
            Arc::clone(&self.store),
            subscriber.clone(),
            Arc::clone(&reader_done),
        ));

        let write_failed = send_loop(&subscriber, &mut sink).await;

        self.transition(id, SessionState::Closing);
        self.broadcaster.unregister(&id);

        let reader_reason = if reader.is_finished() || reader_done.load(Ordering::SeqCst) {
            match reader.await {
                Ok(reason) => Some(reason),
                Err(e) => {
                    error!(subscriber_id = %id, error = %e, "Reader task failed");
                    Some(CloseReason::ReadFailed)
                }
            }
        } else {
            // Queue was closed from outside (write failure or overflow); the
            // reader may still be parked on the transport
            reader.abort();
            let _ = reader.await;
            None
        };

        if let Err(e) = sink.close().await {
            debug!(subscriber_id = %id, error = %e, "Error closing sink");
        }
        drop(subscriber);
        self.transition(id, SessionState::Closed);

        if write_failed {
            CloseReason::WriteFailed
        } else {
            reader_reason.unwrap_or(CloseReason::Unregistered)
        }
    }

    fn transition(&mut self, id: Uuid, next: SessionState) {
        debug!(subscriber_id = %id, from = ?self.state, to = ?next, "Session state change");
        self.state = next;
        if next == SessionState::Closed {
            info!(subscriber_id = %id, "Session closed");
        }
    }
}

/// Write queued notifications until the queue closes. Returns true on write failure.
async fn send_loop<Si>(subscriber: &Subscriber, sink: &mut Si) -> bool
where
    Si: Sink<Message> + Unpin,
    Si::Error: Display,
{
    while let Some(msg) = subscriber.queue.recv().await {
        if let Err(e) = sink.send(Message::Text(msg.to_string())).await {
            warn!(subscriber_id = %subscriber.id, error = %e, "Failed to send notification");
            return true;
        }
    }
    false
}

/// Apply inbound frames to the store until the client goes away
async fn read_loop<St, E>(
    mut stream: St,
    store: Arc<Store>,
    subscriber: Subscriber,
    done: Arc<AtomicBool>,
) -> CloseReason
where
    St: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let _guard = ReaderExit {
        subscriber: subscriber.clone(),
        done,
    };

    loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => {
                if let Err(e) = apply_frame(&store, &text) {
                    warn!(subscriber_id = %subscriber.id, error = %e, "Dropping inbound message");
                }
            }
            Some(Ok(Message::Close(_))) | None => {
                debug!(subscriber_id = %subscriber.id, "Client disconnected");
                break CloseReason::ClientClosed;
            }
            Some(Ok(_)) => {
                // Ignore binary, ping and pong frames
            }
            Some(Err(e)) => {
                let err = InboundError::Transport(e.to_string());
                warn!(subscriber_id = %subscriber.id, error = %err, "Read failed");
                break CloseReason::ReadFailed;
            }
        }
    }
}

/// Flags the reader as done and wakes the sender loop when the reader exits,
/// including by panic
struct ReaderExit {
    subscriber: Subscriber,
    done: Arc<AtomicBool>,
}

impl Drop for ReaderExit {
    fn drop(&mut self) {
        self.done.store(true, Ordering::SeqCst);
        self.subscriber.queue.close();
    }
}

/// Parse one text frame and apply it with `Store::set`
pub fn apply_frame(store: &Store, text: &str) -> Result<(), InboundError> {
    let msg = EntityMessage::parse(text)?;
    debug!(entity = %msg.entity, "Inbound entity message");
    store.set(&msg.entity, msg.data);
    Ok(())
}
