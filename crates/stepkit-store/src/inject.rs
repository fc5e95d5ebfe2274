//! Value injection: `(the <property> of the <entity>)` references in step text.
//!
//! Every reference found in a string is resolved against the [`Store`] and
//! replaced by the property's string form. "(the first name of the 2nd User)"
//! reads `first_name` from the second `User` that was stored.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;
use stepkit_core::{Result, StepKitError};
use tracing::{debug, instrument};

use crate::store::Store;
use crate::thing::{stringify, Thing};

static INJECTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(the ([^)]+) of the ([^)]+)\)").expect("valid injection regex"));

type OnGet<'a> = Box<dyn Fn(Thing) -> Thing + 'a>;
type HasValue<'a> = Box<dyn Fn(&Thing, &str) -> bool + 'a>;

/// Optional overrides for how injected references are resolved.
#[derive(Default)]
pub struct InjectionHooks<'a> {
    on_get: Option<OnGet<'a>>,
    has_value: Option<HasValue<'a>>,
}

impl<'a> InjectionHooks<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transform each retrieved thing before its property is read.
    ///
    /// The result must still be an object or record.
    pub fn on_get(mut self, f: impl Fn(Thing) -> Thing + 'a) -> Self {
        self.on_get = Some(Box::new(f));
        self
    }

    /// Replace the default "does this thing have the property" check.
    pub fn has_value(mut self, f: impl Fn(&Thing, &str) -> bool + 'a) -> Self {
        self.has_value = Some(Box::new(f));
        self
    }
}

impl std::fmt::Debug for InjectionHooks<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InjectionHooks")
            .field("on_get", &self.on_get.is_some())
            .field("has_value", &self.has_value.is_some())
            .finish()
    }
}

/// "first name" -> "first_name"
pub fn property_name(phrase: &str) -> String {
    phrase.to_lowercase().replace(' ', "_")
}

impl Store {
    /// Replace every `(the <property> of the <entity>)` in `input`.
    ///
    /// Strings without a complete reference come back unchanged.
    pub fn inject_stored_values(&self, input: &str) -> Result<String> {
        self.inject_stored_values_with(input, &InjectionHooks::default())
    }

    #[instrument(skip(self, input, hooks), fields(len = input.len()))]
    pub fn inject_stored_values_with(&self, input: &str, hooks: &InjectionHooks<'_>) -> Result<String> {
        let mut output = String::with_capacity(input.len());
        let mut last = 0;

        for caps in INJECTION.captures_iter(input) {
            let Some(whole) = caps.get(0) else { continue };
            let value = self.resolve_reference(&caps, hooks)?;
            output.push_str(&input[last..whole.start()]);
            output.push_str(&stringify(&value));
            last = whole.end();
        }

        output.push_str(&input[last..]);
        Ok(output)
    }

    fn resolve_reference(&self, caps: &Captures<'_>, hooks: &InjectionHooks<'_>) -> Result<Value> {
        let property = property_name(&caps[1]);
        let entity = &caps[2];

        let mut thing = self.assert_has(entity, None)?;
        if let Some(on_get) = &hooks.on_get {
            thing = on_get(thing);
            if !thing.is_object_like() {
                return Err(StepKitError::InvalidHook {
                    reason: format!(
                        "the retrieval hook must return an object or record, got {} for '{entity}'",
                        thing.kind()
                    ),
                });
            }
        }

        if !thing.is_object_like() {
            return Err(StepKitError::NotAnObject {
                entity: entity.to_string(),
                kind: thing.kind().to_string(),
                property,
            });
        }

        let present = match &hooks.has_value {
            Some(has_value) => has_value(&thing, &property),
            None => thing.has_property(&property),
        };
        if !present {
            return Err(StepKitError::PropertyNotFound {
                entity: entity.to_string(),
                property,
            });
        }

        debug!(entity, property = %property, "injecting stored value");
        // A custom presence check may vouch for a property the thing cannot resolve.
        Ok(thing.get_property(&property).unwrap_or(Value::Null))
    }
}
