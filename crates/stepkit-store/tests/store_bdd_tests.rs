//! BDD tests for the store and value injection

use cucumber::{given, then, when, World};
use serde_json::{json, Map, Value};
use stepkit_store::*;

#[derive(Debug, World)]
#[world(init = Self::new)]
struct StoreWorld {
    store: Store,
    injected: Option<Result<String>>,
}

impl StoreWorld {
    fn new() -> Self {
        let store = Store::new();
        store.on_scenario_start();
        Self {
            store,
            injected: None,
        }
    }
}

#[given(expr = "a {string} is stored with {word} {string}")]
async fn given_stored_record(world: &mut StoreWorld, key: String, field: String, value: String) {
    let mut record = Map::new();
    record.insert(field, Value::String(value));
    world.store.set(key, Value::Object(record));
}

#[given(expr = "the number {int} is stored as {string}")]
async fn given_stored_number(world: &mut StoreWorld, number: i64, key: String) {
    world.store.set(key, json!(number));
}

#[when(expr = "I inject stored values into {string}")]
async fn when_inject(world: &mut StoreWorld, text: String) {
    world.injected = Some(world.store.inject_stored_values(&text));
}

#[when("the scenario ends")]
async fn when_scenario_ends(world: &mut StoreWorld) {
    world.store.on_scenario_end();
}

#[then(expr = "the injected text should be {string}")]
async fn then_injected_text(world: &mut StoreWorld, expected: String) {
    match world.injected.as_ref().expect("nothing was injected") {
        Ok(text) => assert_eq!(text, &expected),
        Err(err) => panic!("injection failed: {err}"),
    }
}

#[then(expr = "the injection should fail mentioning {string}")]
async fn then_injection_fails(world: &mut StoreWorld, fragment: String) {
    match world.injected.as_ref().expect("nothing was injected") {
        Ok(text) => panic!("expected a failure, got '{text}'"),
        Err(err) => assert!(
            err.to_string().contains(&fragment),
            "'{err}' does not mention '{fragment}'"
        ),
    }
}

#[then(expr = "{string} should be stored")]
async fn then_stored(world: &mut StoreWorld, key: String) {
    world.store.assert_has(&key, None).unwrap();
}

#[then(expr = "{string} should not be stored")]
async fn then_not_stored(world: &mut StoreWorld, key: String) {
    assert!(!world.store.is_stored(&key), "'{key}' is stored");
}

#[then(expr = "{string} should be the number {int}")]
async fn then_is_number(world: &mut StoreWorld, key: String, number: i64) {
    world.store.assert_thing_is(&key, &json!(number)).unwrap();
}

#[then(expr = "{string} should not be the text {string}")]
async fn then_is_not_text(world: &mut StoreWorld, key: String, text: String) {
    let err = world.store.assert_thing_is(&key, &json!(text)).unwrap_err();
    assert!(matches!(err, StepKitError::ThingMismatch { .. }));
}

#[tokio::main]
async fn main() {
    StoreWorld::run("tests/features").await;
}
