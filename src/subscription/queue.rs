use crate::config::OverflowPolicy;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

/// Result of a non-blocking push
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Message queued
    Queued,
    /// Queue was full; the oldest pending message was discarded
    DroppedOldest,
    /// Queue was full under the disconnect policy; queue is now closed
    Overflowed,
    /// Queue already closed; message discarded
    Closed,
}

struct Inner {
    items: VecDeque<Arc<str>>,
    closed: bool,
}

/// Bounded FIFO of serialized notifications for one subscriber.
///
/// Producers (the broadcaster) never block. The single consumer suspends in
/// [`recv`](Self::recv) only while the queue is empty and open. Closing the
/// queue discards anything still pending and wakes the consumer.
pub struct OutboundQueue {
    inner: Mutex<Inner>,
    notify: Notify,
    capacity: usize,
    policy: OverflowPolicy,
}

impl OutboundQueue {
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(Inner {
                items: VecDeque::with_capacity(capacity.min(64)),
                closed: false,
            }),
            notify: Notify::new(),
            capacity,
            policy,
        }
    }

    /// Enqueue without blocking, applying the overflow policy when full
    pub fn push(&self, msg: Arc<str>) -> PushOutcome {
        let outcome = {
            let mut inner = self.lock();
            if inner.closed {
                return PushOutcome::Closed;
            }

            if inner.items.len() < self.capacity {
                inner.items.push_back(msg);
                PushOutcome::Queued
            } else {
                match self.policy {
                    OverflowPolicy::DropOldest => {
                        inner.items.pop_front();
                        inner.items.push_back(msg);
                        PushOutcome::DroppedOldest
                    }
                    OverflowPolicy::Disconnect => {
                        inner.closed = true;
                        inner.items.clear();
                        PushOutcome::Overflowed
                    }
                }
            }
        };

        self.notify.notify_one();
        outcome
    }

    /// Wait for the next message. Returns `None` once the queue is closed.
    pub async fn recv(&self) -> Option<Arc<str>> {
        loop {
            {
                let mut inner = self.lock();
                if inner.closed {
                    return None;
                }
                if let Some(msg) = inner.items.pop_front() {
                    return Some(msg);
                }
            }
            // notify_one stores a permit if no waiter is registered yet,
            // so a push between the unlock above and this await is not lost
            self.notify.notified().await;
        }
    }

    /// Close the queue; pending messages are discarded and `recv` returns `None`
    pub fn close(&self) {
        {
            let mut inner = self.lock();
            inner.closed = true;
            inner.items.clear();
        }
        self.notify.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Number of pending messages
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
