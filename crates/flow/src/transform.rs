// SPDX-License-Identifier: MIT

//! Named, opaque input transforms (spec §4.4: "the engine does not
//! interpret them; it looks them up in a transform registry provided at
//! construction").

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

pub type Transform = Arc<dyn Fn(Value) -> Value + Send + Sync>;

pub struct TransformRegistry {
    transforms: HashMap<String, Transform>,
}

impl TransformRegistry {
    pub fn new() -> Self {
        let mut registry = TransformRegistry { transforms: HashMap::new() };
        registry.register("passthrough", |value| value);
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, f: impl Fn(Value) -> Value + Send + Sync + 'static) {
        self.transforms.insert(name.into(), Arc::new(f));
    }

    /// Apply the named transform, or pass the value through unchanged and
    /// log a warning when `name` is absent or unregistered.
    pub fn apply(&self, name: Option<&str>, value: Value) -> Value {
        match name {
            None => value,
            Some(name) => match self.transforms.get(name) {
                Some(transform) => transform(value),
                None => {
                    tracing::warn!(transform = name, "unregistered transform, passing value through unchanged");
                    value
                }
            },
        }
    }
}

impl Default for TransformRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "transform_tests.rs"]
mod tests;
