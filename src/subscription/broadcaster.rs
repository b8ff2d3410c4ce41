use crate::config::SubscriberConfig;
use crate::subscription::protocol::encode_notification;
use crate::subscription::queue::{OutboundQueue, PushOutcome};
use crate::world::{Attributes, MutationListener, Store};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// One live connection's registration
#[derive(Clone)]
pub struct Subscriber {
    pub id: Uuid,
    pub queue: Arc<OutboundQueue>,
}

/// Fans every store mutation out to all registered subscribers
pub struct Broadcaster {
    /// Active subscribers; safe to mutate while a broadcast iterates
    subscribers: DashMap<Uuid, Arc<OutboundQueue>>,

    config: SubscriberConfig,
}

impl Broadcaster {
    pub fn new(config: SubscriberConfig) -> Self {
        Self {
            subscribers: DashMap::new(),
            config,
        }
    }

    /// Register this broadcaster as a listener on `store`
    pub fn attach(self: &Arc<Self>, store: &Store) {
        store.add_listener(Arc::clone(self) as Arc<dyn MutationListener>);
    }

    /// Create and register a fresh subscriber with an empty queue
    pub fn register(&self) -> Subscriber {
        let subscriber = Subscriber {
            id: Uuid::new_v4(),
            queue: Arc::new(OutboundQueue::new(
                self.config.queue_capacity,
                self.config.overflow_policy,
            )),
        };
        self.subscribers
            .insert(subscriber.id, Arc::clone(&subscriber.queue));

        info!(
            subscriber_id = %subscriber.id,
            subscribers = self.subscribers.len(),
            "Subscriber registered"
        );
        subscriber
    }

    /// Remove a subscriber and close its queue. Unknown ids are ignored.
    pub fn unregister(&self, id: &Uuid) {
        if let Some((_, queue)) = self.subscribers.remove(id) {
            queue.close();
            info!(
                subscriber_id = %id,
                subscribers = self.subscribers.len(),
                "Subscriber unregistered"
            );
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_registered(&self, id: &Uuid) -> bool {
        self.subscribers.contains_key(id)
    }

    /// Close every queue while leaving the registry untouched, as an
    /// overflow does between the push and the deferred removal
    #[cfg(test)]
    pub(crate) fn close_queues_in_place(&self) {
        for entry in self.subscribers.iter() {
            entry.value().close();
        }
    }

    /// Enqueue one serialized notification to every subscriber
    fn broadcast(&self, entity: &str, data: &Attributes) {
        let msg = match encode_notification(entity, data) {
            Ok(msg) => msg,
            Err(e) => {
                error!(entity = %entity, error = %e, "Failed to serialize notification");
                return;
            }
        };

        let mut overflowed = Vec::new();
        for entry in self.subscribers.iter() {
            match entry.value().push(Arc::clone(&msg)) {
                PushOutcome::Queued | PushOutcome::Closed => {}
                PushOutcome::DroppedOldest => {
                    warn!(subscriber_id = %entry.key(), "Subscriber queue full, dropped oldest");
                }
                PushOutcome::Overflowed => overflowed.push(*entry.key()),
            }
        }

        // Removal must wait until the iteration has released its shard locks
        for id in overflowed {
            warn!(subscriber_id = %id, "Subscriber queue overflowed, disconnecting");
            self.unregister(&id);
        }
    }
}

impl MutationListener for Broadcaster {
    fn on_mutation(&self, entity: &str, data: &Attributes) {
        self.broadcast(entity, data);
    }
}
