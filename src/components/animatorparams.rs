// Named parameters consumed by the animation layer

use bevy_ecs::prelude::Component;
use rustc_hash::{FxHashMap, FxHashSet};

#[derive(Debug, Clone, Default, Component)]
pub struct AnimatorParams {
    pub floats: FxHashMap<String, f32>,
    pub integers: FxHashMap<String, i32>,
    pub triggers: FxHashSet<String>,
}

impl AnimatorParams {
    pub fn set_float(&mut self, key: impl Into<String>, value: f32) {
        self.floats.insert(key.into(), value);
    }
    pub fn get_float(&self, key: &str) -> Option<f32> {
        self.floats.get(key).copied()
    }
    pub fn set_integer(&mut self, key: impl Into<String>, value: i32) {
        self.integers.insert(key.into(), value);
    }
    pub fn get_integer(&self, key: &str) -> Option<i32> {
        self.integers.get(key).copied()
    }
    pub fn set_trigger(&mut self, key: impl Into<String>) {
        self.triggers.insert(key.into());
    }
    pub fn has_trigger(&self, key: &str) -> bool {
        self.triggers.contains(key)
    }
    /// Consume a trigger; returns whether it was set.
    pub fn take_trigger(&mut self, key: &str) -> bool {
        self.triggers.remove(key)
    }
}
