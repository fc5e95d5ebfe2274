//! Scenario-scoped registry of things remembered between steps.

use dashmap::DashMap;
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;
use stepkit_core::{Result, StepKitError};
use tracing::{debug, instrument};

use crate::key::parse_key;
use crate::thing::Thing;

type ResetHook = Arc<dyn Fn(&Store) + Send + Sync>;

/// Ordered, multi-valued registry keyed by name.
///
/// Every `set` appends, so a key holds its full history and plain lookups
/// return the most recent entry. One store lives for exactly one scenario:
/// the host runner calls [`Store::on_scenario_start`] and
/// [`Store::on_scenario_end`] around it.
#[derive(Default)]
pub struct Store {
    things: DashMap<String, Vec<Thing>>,
    reset_hook: RwLock<Option<ResetHook>>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("keys", &self.things.len())
            .field("has_reset_hook", &self.reset_hook.read().is_some())
            .finish()
    }
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `thing` to the history of `key`.
    pub fn set(&self, key: impl Into<String>, thing: impl Into<Thing>) {
        let key = key.into();
        debug!(key = %key, "storing thing");
        self.things.entry(key).or_default().push(thing.into());
    }

    /// [`Store::set`] with the arguments the other way round.
    pub fn put(&self, thing: impl Into<Thing>, key: impl Into<String>) {
        self.set(key, thing);
    }

    /// The `nth` (1-based) entry for `key`, or the latest when `nth` is `None`.
    ///
    /// Without an explicit `nth`, an ordinal prefix such as "2nd " selects
    /// the position instead.
    pub fn get(&self, key: &str, nth: Option<usize>) -> Option<Thing> {
        let key = parse_key(key, nth);
        let entries = self.things.get(key.name)?;
        match key.nth {
            Some(0) => None,
            Some(position) => entries.get(position - 1).cloned(),
            None => entries.last().cloned(),
        }
    }

    /// Latest entry stored under exactly `key`, ordinal prefix or not.
    pub fn get_exact(&self, key: &str) -> Option<Thing> {
        self.things.get(key)?.last().cloned()
    }

    /// Drop the history of `key` and store `thing` as its only entry.
    pub fn replace(&self, key: impl Into<String>, thing: impl Into<Thing>) {
        let key = key.into();
        debug!(key = %key, "replacing thing");
        self.things.insert(key, vec![thing.into()]);
    }

    pub fn has(&self, key: &str, nth: Option<usize>) -> bool {
        self.get(key, nth).is_some()
    }

    pub fn is_stored(&self, key: &str) -> bool {
        self.has(key, None)
    }

    /// Like [`Store::get`] but a missing entry is an error.
    pub fn assert_has(&self, key: &str, nth: Option<usize>) -> Result<Thing> {
        self.get(key, nth).ok_or_else(|| StepKitError::ThingNotFound {
            key: key.to_string(),
        })
    }

    /// Read `property` from the thing stored under `key`.
    pub fn get_thing_property(&self, key: &str, property: &str, nth: Option<usize>) -> Result<Value> {
        let thing = self.assert_has(key, nth)?;
        if !thing.has_property(property) {
            return Err(StepKitError::PropertyNotFound {
                entity: key.to_string(),
                property: property.to_string(),
            });
        }
        thing
            .get_property(property)
            .ok_or_else(|| StepKitError::PropertyNotFound {
                entity: key.to_string(),
                property: property.to_string(),
            })
    }

    /// Store the latest thing under `current_key` again under `new_key`.
    pub fn refer_to(&self, current_key: &str, new_key: &str) -> Result<()> {
        let thing = self.assert_has(current_key, None)?;
        self.set(new_key, thing);
        Ok(())
    }

    /// Strict comparison of the stored thing against `expected`.
    ///
    /// Type matters: the string `"1"` is not the number `1`.
    pub fn assert_thing_is(&self, key: &str, expected: &Value) -> Result<()> {
        let thing = self.assert_has(key, None)?;
        match thing.as_value() {
            Some(actual) if actual == expected => Ok(()),
            _ => Err(StepKitError::ThingMismatch {
                key: key.to_string(),
                expected: expected.to_string(),
                actual: thing.describe(),
            }),
        }
    }

    /// Install a hook that runs after every [`Store::reset`].
    pub fn set_reset_hook(&self, hook: impl Fn(&Store) + Send + Sync + 'static) {
        *self.reset_hook.write() = Some(Arc::new(hook));
    }

    /// Forget everything, then run the reset hook if one is installed.
    #[instrument(skip(self))]
    pub fn reset(&self) {
        self.things.clear();
        let hook = self.reset_hook.read().clone();
        if let Some(hook) = hook {
            hook(self);
        }
    }

    pub fn on_scenario_start(&self) {
        self.reset();
    }

    pub fn on_scenario_end(&self) {
        self.things.clear();
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.things.iter().map(|entry| entry.key().clone()).collect();
        keys.sort();
        keys
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.things.len()
    }

    pub fn is_empty(&self) -> bool {
        self.things.is_empty()
    }
}
