//! Resource registry: typed singletons owned by the database.
//!
//! Unlike components, which are attached to entities and stored columnar,
//! resources exist at most once per database and are accessed by type.
//! The database holds one registry as a sibling field next to its archetype
//! storage; the registry's lifetime matches the database's.

use std::any::{Any, TypeId};
use std::collections::HashMap;

/// Marker trait for types usable as resources.
pub trait Resource: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> Resource for T {}

struct ResourceEntry {
    value: Box<dyn Any + Send + Sync>,
}

impl ResourceEntry {
    fn new<T: Resource>(value: T) -> Self {
        Self { value: Box::new(value) }
    }
}

/// Typed singleton map keyed by resource type.
#[derive(Default)]
pub struct ResourceRegistry {
    entries: HashMap<TypeId, ResourceEntry>,
}

impl ResourceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a resource, returning the previous value of the same type.
    pub fn set<T: Resource>(&mut self, value: T) -> Option<T> {
        let previous = self.entries.insert(TypeId::of::<T>(), ResourceEntry::new(value));
        previous.and_then(|entry| entry.value.downcast().ok().map(|boxed| *boxed))
    }

    /// Returns a reference to the stored resource of type `T`.
    pub fn get<T: Resource>(&self) -> Option<&T> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.value.downcast_ref())
    }

    /// Returns a mutable reference to the stored resource of type `T`.
    pub fn get_mut<T: Resource>(&mut self) -> Option<&mut T> {
        self.entries
            .get_mut(&TypeId::of::<T>())
            .and_then(|entry| entry.value.downcast_mut())
    }

    /// Returns `true` if a resource of type `T` is stored.
    pub fn has<T: Resource>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    /// Removes the resource of type `T`, returning it if present.
    pub fn remove<T: Resource>(&mut self) -> Option<T> {
        self.entries
            .remove(&TypeId::of::<T>())
            .and_then(|entry| entry.value.downcast().ok().map(|boxed| *boxed))
    }

    /// Returns the number of stored resources.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no resources are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceRegistry")
            .field("count", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct SimulationClock {
        tick: u64,
    }

    #[test]
    fn set_get_roundtrip() {
        let mut registry = ResourceRegistry::new();
        assert!(!registry.has::<SimulationClock>());

        registry.set(SimulationClock { tick: 3 });
        assert_eq!(registry.get::<SimulationClock>().unwrap().tick, 3);

        registry.get_mut::<SimulationClock>().unwrap().tick = 9;
        assert_eq!(registry.get::<SimulationClock>().unwrap().tick, 9);
    }

    #[test]
    fn set_returns_previous_and_remove_takes_ownership() {
        let mut registry = ResourceRegistry::new();
        assert!(registry.set(SimulationClock { tick: 1 }).is_none());
        let previous = registry.set(SimulationClock { tick: 2 });
        assert_eq!(previous, Some(SimulationClock { tick: 1 }));

        let removed = registry.remove::<SimulationClock>();
        assert_eq!(removed, Some(SimulationClock { tick: 2 }));
        assert!(registry.is_empty());
    }
}
