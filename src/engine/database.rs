//! # Database: archetype ownership and the structural-mutation protocol
//!
//! The [`Database`] owns every archetype and the entity index, and is the
//! single entry point for structural mutation. Archetypes live in a vector
//! (enumeration order is creation order) with a side map from canonical id
//! to slot; pruning removes the slot in order and repairs the map.
//!
//! ## Mutation protocol
//! Moving an entity between archetypes always runs in the same order:
//! look up or create the target, copy shared columns, fill new columns,
//! swap-remove the source row (fixing the relocated entity's record), prune
//! the source if it emptied, and finally rewrite the moved entity's
//! location. A failure before the swap-remove leaves the source
//! authoritative; the partially built target row is rolled back before the
//! error returns.

use std::collections::HashMap;

use crate::engine::archetype::Archetype;
use crate::engine::component::{ComponentMeta, ComponentSet, ComponentValue};
use crate::engine::entity::{EntityHandle, EntityLocation};
use crate::engine::error::{EcsError, EcsResult};
use crate::engine::group::GroupByResult;
use crate::engine::query::QueryResult;
use crate::engine::resource::ResourceRegistry;
use crate::engine::transaction::Transaction;
use crate::engine::types::{ArchetypeId, ComponentId, EntityId};
use crate::profiling::profiler;

/// Owner of all archetypes, the entity index, and the resource registry.
pub struct Database {
    archetypes: Vec<Archetype>,
    archetype_index: HashMap<ArchetypeId, usize>,
    entities: HashMap<EntityId, EntityLocation>,
    next_entity_id: EntityId,
    resources: ResourceRegistry,
}

impl Database {
    /// Creates an empty database.
    pub fn new() -> Self {
        Self {
            archetypes: Vec::new(),
            archetype_index: HashMap::new(),
            entities: HashMap::new(),
            next_entity_id: 0,
            resources: ResourceRegistry::new(),
        }
    }

    /// Returns a fresh entity id without creating storage for it.
    ///
    /// Used by transactions so callers receive a valid id synchronously
    /// while the actual insertion is deferred.
    pub fn reserve_entity_id(&mut self) -> EntityId {
        let entity_id = self.next_entity_id;
        self.next_entity_id += 1;
        entity_id
    }

    /// Creates an entity from captured component values.
    pub fn create_entity(&mut self, components: &[ComponentValue]) -> EcsResult<EntityId> {
        let entity_id = self.reserve_entity_id();
        self.create_entity_with_id(entity_id, components)?;
        Ok(entity_id)
    }

    /// Creates an entity under a previously reserved id.
    pub fn create_entity_with_id(
        &mut self,
        entity_id: EntityId,
        components: &[ComponentValue],
    ) -> EcsResult<()> {
        let _span = profiler::span("Database::create_entity");
        if self.entities.contains_key(&entity_id) {
            return Err(EcsError::EntityAlreadyExists(entity_id));
        }

        let set = ComponentSet::from_values(components);
        let archetype_id = set.canonical_id();
        let slot = self.get_or_create_archetype(set);
        let row_index = match self.archetypes[slot].add_entity(entity_id, components) {
            Ok(row) => row,
            Err(error) => {
                self.prune_if_empty(archetype_id);
                return Err(error);
            }
        };

        self.entities.insert(
            entity_id,
            EntityLocation { entity_id, archetype_id, row_index },
        );
        Ok(())
    }

    /// Returns a read handle for `entity_id`, if it is alive.
    pub fn get_entity(&self, entity_id: EntityId) -> Option<EntityHandle<'_>> {
        let location = *self.entities.get(&entity_id)?;
        Some(EntityHandle::new(self, location))
    }

    /// Removes an entity and all its components.
    pub fn remove_entity(&mut self, entity_id: EntityId) -> EcsResult<()> {
        let _span = profiler::span("Database::remove_entity");
        let location = *self
            .entities
            .get(&entity_id)
            .ok_or(EcsError::EntityNotFound(entity_id))?;
        let slot = self.archetype_slot(location.archetype_id)?;

        let archetype = &mut self.archetypes[slot];
        let evicted = archetype.remove_row_by_swap(location.row_index)?;
        debug_assert_eq!(evicted, entity_id);
        let moved = archetype.entity_at(location.row_index);

        if let Some(moved_id) = moved {
            if let Some(moved_location) = self.entities.get_mut(&moved_id) {
                moved_location.row_index = location.row_index;
            }
        }
        self.entities.remove(&entity_id);
        self.prune_if_empty(location.archetype_id);
        Ok(())
    }

    /// Adds components to an entity, migrating it to the union archetype.
    ///
    /// When every supplied component already exists on the entity, the row
    /// is overwritten in place and no migration happens.
    pub fn add_components(
        &mut self,
        entity_id: EntityId,
        components: &[ComponentValue],
    ) -> EcsResult<()> {
        let _span = profiler::span("Database::add_components");
        let location = *self
            .entities
            .get(&entity_id)
            .ok_or(EcsError::EntityNotFound(entity_id))?;
        let source_slot = self.archetype_slot(location.archetype_id)?;

        let target_set = self.archetypes[source_slot]
            .component_set()
            .union(&ComponentSet::from_values(components));
        let target_id = target_set.canonical_id();

        if target_id == location.archetype_id {
            let archetype = &mut self.archetypes[source_slot];
            for value in components {
                let Some(index) = archetype.get_column_index(value.id()) else {
                    return Err(EcsError::ComponentNotInArchetype {
                        archetype: target_id,
                        component: value.id(),
                    });
                };
                let Some(column) = archetype.column_by_index_mut(index) else {
                    return Err(EcsError::ComponentNotInArchetype {
                        archetype: target_id,
                        component: value.id(),
                    });
                };
                column.set(location.row_index, value.bytes())?;
            }
            return Ok(());
        }

        let target_slot = self.get_or_create_archetype(target_set);
        let (source, target) =
            Self::archetype_pair_mut(&mut self.archetypes, source_slot, target_slot);

        let new_row = match source.copy_row_to(location.row_index, target) {
            Ok(row) => row,
            Err(error) => {
                self.prune_if_empty(target_id);
                return Err(error);
            }
        };

        // Overwrite carried-over values and append brand-new columns; every
        // target column must end at exactly `new_row + 1` rows.
        let mut fill_error: Option<EcsError> = None;
        for value in components {
            let Some(index) = target.get_column_index(value.id()) else {
                fill_error = Some(EcsError::ComponentNotInArchetype {
                    archetype: target_id,
                    component: value.id(),
                });
                break;
            };
            let Some(column) = target.column_by_index_mut(index) else {
                fill_error = Some(EcsError::ComponentNotInArchetype {
                    archetype: target_id,
                    component: value.id(),
                });
                break;
            };
            let written = if column.len() == new_row {
                column.append(value.bytes())
            } else {
                column.set(new_row, value.bytes())
            };
            if let Err(error) = written {
                fill_error = Some(error.into());
                break;
            }
        }
        if let Some(error) = fill_error {
            let _ = target.remove_row_by_swap(new_row);
            self.prune_if_empty(target_id);
            return Err(error);
        }

        let evicted = match source.remove_row_by_swap(location.row_index) {
            Ok(id) => id,
            Err(error) => {
                let _ = target.remove_row_by_swap(new_row);
                self.prune_if_empty(target_id);
                return Err(error);
            }
        };
        debug_assert_eq!(evicted, entity_id);
        let moved = source.entity_at(location.row_index);

        if let Some(moved_id) = moved {
            if let Some(moved_location) = self.entities.get_mut(&moved_id) {
                moved_location.row_index = location.row_index;
            }
        }
        self.prune_if_empty(location.archetype_id);
        self.entities.insert(
            entity_id,
            EntityLocation { entity_id, archetype_id: target_id, row_index: new_row },
        );
        Ok(())
    }

    /// Removes components from an entity, migrating it to the difference
    /// archetype.
    ///
    /// Removing components the entity does not have is a no-op; removing
    /// every component it has is rejected.
    pub fn remove_components(
        &mut self,
        entity_id: EntityId,
        metas: &[ComponentMeta],
    ) -> EcsResult<()> {
        let _span = profiler::span("Database::remove_components");
        let location = *self
            .entities
            .get(&entity_id)
            .ok_or(EcsError::EntityNotFound(entity_id))?;
        let source_slot = self.archetype_slot(location.archetype_id)?;

        let target_set = self.archetypes[source_slot]
            .component_set()
            .difference(&ComponentSet::from_metas(metas));
        if target_set.is_empty() {
            return Err(EcsError::CannotRemoveAllComponents(entity_id));
        }
        let target_id = target_set.canonical_id();
        if target_id == location.archetype_id {
            return Ok(());
        }

        let target_slot = self.get_or_create_archetype(target_set);
        let (source, target) =
            Self::archetype_pair_mut(&mut self.archetypes, source_slot, target_slot);

        let new_row = match source.copy_row_to(location.row_index, target) {
            Ok(row) => row,
            Err(error) => {
                self.prune_if_empty(target_id);
                return Err(error);
            }
        };
        let evicted = match source.remove_row_by_swap(location.row_index) {
            Ok(id) => id,
            Err(error) => {
                let _ = target.remove_row_by_swap(new_row);
                self.prune_if_empty(target_id);
                return Err(error);
            }
        };
        debug_assert_eq!(evicted, entity_id);
        let moved = source.entity_at(location.row_index);

        if let Some(moved_id) = moved {
            if let Some(moved_location) = self.entities.get_mut(&moved_id) {
                moved_location.row_index = location.row_index;
            }
        }
        self.prune_if_empty(location.archetype_id);
        self.entities.insert(
            entity_id,
            EntityLocation { entity_id, archetype_id: target_id, row_index: new_row },
        );
        Ok(())
    }

    /// Collects the archetypes containing every id in `required`.
    pub fn query(&self, required: &[ComponentId]) -> QueryResult<'_> {
        let matched = self
            .archetypes
            .iter()
            .filter(|archetype| archetype.has_components(required))
            .map(Archetype::archetype_id)
            .collect();
        QueryResult::new(self, matched)
    }

    /// Groups all archetypes by the keys their columns carry for `trait_id`.
    pub fn group_by(&self, trait_id: ComponentId) -> GroupByResult<'_> {
        GroupByResult::from_trait_type(self, trait_id)
    }

    /// Opens a transaction that queues structural mutations against this
    /// database.
    pub fn transaction(&mut self) -> Transaction<'_> {
        Transaction::new(self)
    }

    /// Returns the resource registry.
    pub fn resources(&self) -> &ResourceRegistry {
        &self.resources
    }

    /// Returns the resource registry mutably.
    pub fn resources_mut(&mut self) -> &mut ResourceRegistry {
        &mut self.resources
    }

    /// Returns the number of live entities.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Returns the number of archetypes currently stored.
    pub fn archetype_count(&self) -> usize {
        self.archetypes.len()
    }

    /// Looks up an archetype by canonical id.
    pub fn archetype_by_id(&self, archetype_id: ArchetypeId) -> Option<&Archetype> {
        let slot = *self.archetype_index.get(&archetype_id)?;
        self.archetypes.get(slot)
    }

    /// Iterates archetypes in creation order.
    pub fn archetypes(&self) -> std::slice::Iter<'_, Archetype> {
        self.archetypes.iter()
    }

    /// Returns the location record for `entity_id`, if it is alive.
    pub fn entity_location(&self, entity_id: EntityId) -> Option<EntityLocation> {
        self.entities.get(&entity_id).copied()
    }

    fn archetype_slot(&self, archetype_id: ArchetypeId) -> EcsResult<usize> {
        self.archetype_index
            .get(&archetype_id)
            .copied()
            .ok_or(EcsError::ArchetypeNotFound(archetype_id))
    }

    fn get_or_create_archetype(&mut self, set: ComponentSet) -> usize {
        let archetype_id = set.canonical_id();
        if let Some(&slot) = self.archetype_index.get(&archetype_id) {
            return slot;
        }
        let slot = self.archetypes.len();
        self.archetypes.push(Archetype::from_component_set(set));
        self.archetype_index.insert(archetype_id, slot);
        slot
    }

    #[inline]
    fn archetype_pair_mut(
        archetypes: &mut [Archetype],
        slot_a: usize,
        slot_b: usize,
    ) -> (&mut Archetype, &mut Archetype) {
        assert!(slot_a != slot_b, "source and destination archetype must differ");
        let (left, right) = if slot_a < slot_b { (slot_a, slot_b) } else { (slot_b, slot_a) };

        let (head, tail) = archetypes.split_at_mut(right);
        let left_reference = &mut head[left];
        let right_reference = &mut tail[0];
        if slot_a < slot_b {
            (left_reference, right_reference)
        } else {
            (right_reference, left_reference)
        }
    }

    /// Removes `archetype_id` from the map if its table emptied.
    ///
    /// Slots after the removed one shift down; the index map is repaired so
    /// enumeration order stays the creation order of the survivors.
    fn prune_if_empty(&mut self, archetype_id: ArchetypeId) {
        let Some(&slot) = self.archetype_index.get(&archetype_id) else {
            return;
        };
        if !self.archetypes[slot].is_empty() {
            return;
        }
        debug_assert!((0..self.archetypes[slot].component_set().len())
            .all(|index| self.archetypes[slot]
                .column_by_index(index)
                .map_or(true, |column| column.is_empty())));

        self.archetypes.remove(slot);
        self.archetype_index.remove(&archetype_id);
        for mapped in self.archetype_index.values_mut() {
            if *mapped > slot {
                *mapped -= 1;
            }
        }
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("entity_count", &self.entities.len())
            .field("archetype_count", &self.archetypes.len())
            .field("next_entity_id", &self.next_entity_id)
            .finish()
    }
}
