use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tracing::{debug, info};

/// Attribute mapping of a single entity (attribute key -> arbitrary JSON)
pub type Attributes = Map<String, Value>;

/// Full world contents (entity id -> attributes)
pub type World = HashMap<String, Attributes>;

/// Observer invoked synchronously on every `set`/`update`.
///
/// Runs while the store's mutation lock is held, so it has completed before
/// the mutating call returns and never interleaves with another mutation's
/// notification. Implementations must not block and must not call back into
/// the [`Store`].
pub trait MutationListener: Send + Sync {
    fn on_mutation(&self, entity: &str, data: &Attributes);
}

/// Authoritative in-memory world state
#[derive(Default)]
pub struct Store {
    /// Single world-wide lock; serializes every mutation and its notification
    world: Mutex<World>,

    /// Observers, in registration order
    listeners: RwLock<Vec<Arc<dyn MutationListener>>>,
}

impl Store {
    /// Create an empty store with no listeners
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mutation observer. Invoked after all previously registered ones.
    pub fn add_listener(&self, listener: Arc<dyn MutationListener>) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    /// Replace the entity's full attribute mapping, creating it if absent
    pub fn set(&self, entity: &str, data: Attributes) -> Attributes {
        let mut world = self.lock_world();
        world.insert(entity.to_string(), data.clone());
        self.notify(entity, &data);
        data
    }

    /// Set a single attribute, keeping every other attribute of the entity
    pub fn update(&self, entity: &str, key: &str, value: Value) -> Attributes {
        let mut world = self.lock_world();
        let attrs = world.entry(entity.to_string()).or_default();
        attrs.insert(key.to_string(), value);
        let data = attrs.clone();
        self.notify(entity, &data);
        data
    }

    /// Apply `update` once per attribute of `attrs`, returning the resulting entity.
    ///
    /// Each key produces its own notification. An empty `attrs` touches nothing.
    pub fn merge(&self, entity: &str, attrs: Attributes) -> Attributes {
        for (key, value) in attrs {
            self.update(entity, &key, value);
        }
        self.get(entity)
    }

    /// Current attributes of `entity`, or an empty mapping if unknown
    pub fn get(&self, entity: &str) -> Attributes {
        self.lock_world().get(entity).cloned().unwrap_or_default()
    }

    /// Empty the world. No per-entity notifications are fired.
    pub fn clear(&self) {
        let mut world = self.lock_world();
        let removed = world.len();
        world.clear();
        info!(entities = removed, "World cleared");
    }

    /// Clear the world, then apply every entity/attribute pair via `update`
    pub fn replace_world(&self, new_world: World) -> World {
        self.clear();
        for (entity, attrs) in new_world {
            for (key, value) in attrs {
                self.update(&entity, &key, value);
            }
        }
        self.world_snapshot()
    }

    /// Owned copy of the entire world
    pub fn world_snapshot(&self) -> World {
        self.lock_world().clone()
    }

    /// Number of entities in the world
    pub fn len(&self) -> usize {
        self.lock_world().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_world(&self) -> MutexGuard<'_, World> {
        self.world.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Caller holds the world lock
    fn notify(&self, entity: &str, data: &Attributes) {
        let listeners = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
        debug!(entity = %entity, listeners = listeners.len(), "Entity mutated");
        for listener in listeners.iter() {
            listener.on_mutation(entity, data);
        }
    }
}
