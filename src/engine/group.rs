//! Trait-based grouping of archetypes.
//!
//! A component type may declare participation in a virtual *trait* together
//! with a signed group key. Grouping walks archetype component sets, and
//! every column whose meta carries the requested trait id with grouped
//! participation assigns its archetype to that key's group.
//!
//! ## Ordering
//! Groups iterate in strictly ascending key order no matter what order the
//! keys were discovered in. The container is a vector kept sorted by
//! binary-search insertion; a heap would only guarantee order at pop time,
//! not under arbitrary interleaved insertion, and is deliberately not used
//! here.

use crate::engine::archetype::Archetype;
use crate::engine::database::Database;
use crate::engine::query::{EntityIter, QueryResult};
use crate::engine::types::{ArchetypeId, ComponentId, GroupKey};

struct GroupSlot {
    key: GroupKey,
    archetype_ids: Vec<ArchetypeId>,
}

/// Archetypes partitioned by the group keys they carry for one trait.
pub struct GroupByResult<'db> {
    database: &'db Database,
    groups: Vec<GroupSlot>,
}

impl<'db> GroupByResult<'db> {
    /// Groups every archetype in the database by `trait_id`.
    pub(crate) fn from_trait_type(database: &'db Database, trait_id: ComponentId) -> Self {
        let mut result = Self { database, groups: Vec::new() };
        for archetype in database.archetypes() {
            result.assign(archetype, trait_id);
        }
        result
    }

    /// Groups only the given archetypes by `trait_id`.
    pub(crate) fn from_archetype_ids(
        database: &'db Database,
        archetype_ids: &[ArchetypeId],
        trait_id: ComponentId,
    ) -> Self {
        let mut result = Self { database, groups: Vec::new() };
        for archetype_id in archetype_ids {
            if let Some(archetype) = database.archetype_by_id(*archetype_id) {
                result.assign(archetype, trait_id);
            }
        }
        result
    }

    fn assign(&mut self, archetype: &Archetype, trait_id: ComponentId) {
        for meta in archetype.component_set().iter() {
            if let Some(key) = meta.grouped_key(trait_id) {
                self.insert(key, archetype.archetype_id());
            }
        }
    }

    /// Insertion-time sorted placement; keeps key order ascending.
    fn insert(&mut self, key: GroupKey, archetype_id: ArchetypeId) {
        match self.groups.binary_search_by(|slot| slot.key.cmp(&key)) {
            Ok(index) => {
                let ids = &mut self.groups[index].archetype_ids;
                if !ids.contains(&archetype_id) {
                    ids.push(archetype_id);
                }
            }
            Err(index) => self.groups.insert(
                index,
                GroupSlot { key, archetype_ids: vec![archetype_id] },
            ),
        }
    }

    /// Returns the number of distinct group keys.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns `true` if no archetype carried the trait.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Iterates group keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = GroupKey> + '_ {
        self.groups.iter().map(|slot| slot.key)
    }

    /// Iterates groups in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = Group<'_, 'db>> {
        self.groups.iter().map(move |slot| Group {
            database: self.database,
            key: slot.key,
            archetype_ids: &slot.archetype_ids,
        })
    }

    /// Returns the group stored under `key`, if any archetype carries it.
    pub fn get(&self, key: GroupKey) -> Option<Group<'_, 'db>> {
        let index = self
            .groups
            .binary_search_by(|slot| slot.key.cmp(&key))
            .ok()?;
        let slot = &self.groups[index];
        Some(Group {
            database: self.database,
            key: slot.key,
            archetype_ids: &slot.archetype_ids,
        })
    }
}

impl std::fmt::Debug for GroupByResult<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupByResult")
            .field("groups", &self.groups.len())
            .finish()
    }
}

/// One group: every archetype assigned to a single key.
pub struct Group<'g, 'db> {
    database: &'db Database,
    key: GroupKey,
    archetype_ids: &'g [ArchetypeId],
}

impl<'g, 'db> Group<'g, 'db> {
    /// Returns this group's key.
    pub fn key(&self) -> GroupKey {
        self.key
    }

    /// Returns the archetypes assigned to this group.
    pub fn archetype_ids(&self) -> &'g [ArchetypeId] {
        self.archetype_ids
    }

    /// Sums the row counts of the group's archetypes.
    pub fn count(&self) -> usize {
        self.archetype_ids
            .iter()
            .filter_map(|id| self.database.archetype_by_id(*id))
            .map(Archetype::len)
            .sum()
    }

    /// Iterates every entity in every archetype assigned to this group.
    pub fn iter(&self) -> EntityIter<'g, 'db> {
        EntityIter::new(self.database, self.archetype_ids)
    }

    /// Runs a sub-query restricted to this group's archetypes.
    pub fn query(&self, required: &[ComponentId]) -> QueryResult<'db> {
        let matched = self
            .archetype_ids
            .iter()
            .filter(|id| {
                self.database
                    .archetype_by_id(**id)
                    .map_or(false, |archetype| archetype.has_components(required))
            })
            .copied()
            .collect();
        QueryResult::new(self.database, matched)
    }
}

impl std::fmt::Debug for Group<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Group")
            .field("key", &self.key)
            .field("archetypes", &self.archetype_ids.len())
            .finish()
    }
}
