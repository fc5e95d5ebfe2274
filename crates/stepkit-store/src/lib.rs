//! Scenario-scoped store of things remembered between steps, and the
//! `(the <property> of the <entity>)` injection language built on it.

pub use stepkit_core;

mod inject;
mod key;
mod store;
mod thing;

pub use inject::{property_name, InjectionHooks};
pub use key::{parse_key, StoreKey};
pub use store::Store;
pub use thing::{stringify, Callable, DynamicObject, PropertyAccess, Thing};

// Re-export core types for convenience
pub use stepkit_core::{Result, StepKitError};
