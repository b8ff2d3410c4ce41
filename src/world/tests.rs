use super::*;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::thread;

fn attrs(value: Value) -> Attributes {
    value.as_object().cloned().unwrap()
}

/// Records every notification it sees
#[derive(Default)]
struct Recorder {
    seen: Mutex<Vec<(String, Attributes)>>,
}

impl MutationListener for Recorder {
    fn on_mutation(&self, entity: &str, data: &Attributes) {
        self.seen
            .lock()
            .unwrap()
            .push((entity.to_string(), data.clone()));
    }
}

/// Appends its tag to a shared log, to observe invocation order
struct Tagged {
    tag: &'static str,
    log: Arc<Mutex<Vec<&'static str>>>,
}

impl MutationListener for Tagged {
    fn on_mutation(&self, _entity: &str, _data: &Attributes) {
        self.log.lock().unwrap().push(self.tag);
    }
}

#[test]
fn test_set_creates_entity() {
    let store = Store::new();

    store.set("agent_001", attrs(json!({"name": "Alice"})));

    assert_eq!(Value::Object(store.get("agent_001")), json!({"name": "Alice"}));
    assert_eq!(store.len(), 1);
}

#[test]
fn test_get_nonexistent_entity_is_empty() {
    let store = Store::new();
    assert!(store.get("nonexistent").is_empty());
    assert!(store.is_empty());
}

#[test]
fn test_update_keeps_other_attributes() {
    let store = Store::new();

    store.set("sensor_42", attrs(json!({"temperature": 22.5})));
    let data = store.update("sensor_42", "humidity", json!(60.0));

    assert_eq!(
        Value::Object(data),
        json!({"temperature": 22.5, "humidity": 60.0})
    );
}

#[test]
fn test_update_creates_entity() {
    let store = Store::new();

    store.update("fresh", "x", json!(1));

    assert_eq!(Value::Object(store.get("fresh")), json!({"x": 1}));
}

#[test]
fn test_set_after_update_replaces_everything() {
    let store = Store::new();

    store.set("a", attrs(json!({"x": 1})));
    store.update("a", "y", json!(2));
    assert_eq!(Value::Object(store.get("a")), json!({"x": 1, "y": 2}));

    store.set("a", attrs(json!({"z": 3})));
    assert_eq!(Value::Object(store.get("a")), json!({"z": 3}));
}

#[test]
fn test_sequence_of_sets_and_updates() {
    let store = Store::new();

    store.update("e", "a", json!(0));
    store.set("e", attrs(json!({"a": 1, "b": 1})));
    store.update("e", "b", json!(2));
    store.update("e", "c", json!([1, 2]));
    store.update("e", "b", json!({"nested": true}));

    assert_eq!(
        Value::Object(store.get("e")),
        json!({"a": 1, "b": {"nested": true}, "c": [1, 2]})
    );
}

#[test]
fn test_merge_applies_each_key() {
    let store = Store::new();
    let recorder = Arc::new(Recorder::default());
    store.add_listener(recorder.clone());

    store.set("a", attrs(json!({"x": 1})));
    let data = store.merge("a", attrs(json!({"y": 2, "z": 3})));

    assert_eq!(Value::Object(data), json!({"x": 1, "y": 2, "z": 3}));
    // one for the set, one per merged key
    assert_eq!(recorder.seen.lock().unwrap().len(), 3);
}

#[test]
fn test_clear_empties_world() {
    let store = Store::new();
    let recorder = Arc::new(Recorder::default());
    store.add_listener(recorder.clone());

    store.set("a", attrs(json!({"x": 1})));
    store.set("b", attrs(json!({"y": 2})));
    store.clear();

    assert!(store.world_snapshot().is_empty());
    assert!(store.get("a").is_empty());
    // clear itself does not notify
    assert_eq!(recorder.seen.lock().unwrap().len(), 2);
}

#[test]
fn test_replace_world_clears_first() {
    let store = Store::new();

    store.set("old", attrs(json!({"gone": true})));
    let mut incoming = World::new();
    incoming.insert("p".to_string(), attrs(json!({"v": 5, "w": 6})));
    incoming.insert("q".to_string(), attrs(json!({"name": "q"})));

    let world = store.replace_world(incoming);

    assert_eq!(world.len(), 2);
    assert!(!world.contains_key("old"));
    assert_eq!(Value::Object(world["p"].clone()), json!({"v": 5, "w": 6}));
}

#[test]
fn test_world_snapshot_is_a_copy() {
    let store = Store::new();
    store.set("a", attrs(json!({"x": 1})));

    let snapshot = store.world_snapshot();
    store.update("a", "x", json!(2));

    assert_eq!(snapshot["a"]["x"], json!(1));
    assert_eq!(store.get("a")["x"], json!(2));
}

#[test]
fn test_every_mutation_notifies_once_with_full_data() {
    let store = Store::new();
    let recorder = Arc::new(Recorder::default());
    store.add_listener(recorder.clone());

    store.set("a", attrs(json!({"x": 1})));
    store.update("a", "y", json!(2));

    let seen = recorder.seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].0, "a");
    assert_eq!(Value::Object(seen[0].1.clone()), json!({"x": 1}));
    // full entity, not the delta
    assert_eq!(Value::Object(seen[1].1.clone()), json!({"x": 1, "y": 2}));
}

#[test]
fn test_listeners_run_in_registration_order() {
    let store = Store::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    store.add_listener(Arc::new(Tagged { tag: "first", log: log.clone() }));
    store.add_listener(Arc::new(Tagged { tag: "second", log: log.clone() }));

    store.update("a", "x", json!(1));

    // listeners completed before update returned
    assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
}

#[test]
fn test_concurrent_access() {
    let store = Arc::new(Store::new());
    let mut handles = vec![];

    // Spawn 10 threads, each updating different entities
    for i in 0..10 {
        let store = Arc::clone(&store);
        handles.push(thread::spawn(move || {
            store.update(&format!("entity_{}", i), "value", json!(i));
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.len(), 10);
}

#[test]
fn test_concurrent_updates_same_entity_preserve_order() {
    let store = Arc::new(Store::new());
    let recorder = Arc::new(Recorder::default());
    store.add_listener(recorder.clone());
    let mut handles = vec![];

    // Spawn 10 threads, all updating the same entity with different properties
    for i in 0..10 {
        let store = Arc::clone(&store);
        handles.push(thread::spawn(move || {
            store.update("shared_entity", &format!("prop_{}", i), json!(i));
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.get("shared_entity").len(), 10);

    // Notifications observed in application order: each snapshot grows by one key
    let seen = recorder.seen.lock().unwrap();
    let sizes: Vec<usize> = seen.iter().map(|(_, data)| data.len()).collect();
    assert_eq!(sizes, (1..=10).collect::<Vec<_>>());
}
