//! Query construction and execution over archetype storage.
//!
//! This module provides a *builder-style* API for describing which component
//! types an archetype must (and must not) carry, and a resolved result type
//! that streams entity handles out of every matched table.
//!
//! ## Design goals
//! * **Static intent:** Required and excluded components are declared before
//!   any iteration happens.
//! * **Runtime efficiency:** Matching walks archetype sets once; iteration
//!   reads rows directly out of columnar storage.
//! * **Mutation tolerance:** A result holds archetype *ids*, not indices.
//!   Ids that no longer resolve (the archetype was pruned after the query
//!   was built) are skipped silently.
//!
//! ## Execution model
//! Queries:
//! 1. Collect the ids of archetypes satisfying
//!    `has_components(required) && !has_any(forbidden)`.
//! 2. Enumerate matches in archetype creation order.
//! 3. Walk each table's rows in current row order, yielding one
//!    [`EntityHandle`] per row.

use hashbrown::HashSet;

use crate::engine::archetype::Archetype;
use crate::engine::component::Component;
use crate::engine::database::Database;
use crate::engine::entity::{EntityHandle, EntityLocation};
use crate::engine::group::GroupByResult;
use crate::engine::types::{ArchetypeId, ComponentId, RowIndex};

/// Builder for component queries with required and excluded types.
///
/// ## Example
/// ```ignore
/// let moving = QueryBuilder::new()
///     .with::<Position>()
///     .with::<Velocity>()
///     .without::<Frozen>()
///     .run(&database);
/// ```
#[derive(Default)]
pub struct QueryBuilder {
    required: Vec<ComponentId>,
    forbidden: Vec<ComponentId>,
}

impl QueryBuilder {
    /// Creates a new, empty query builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires component `T` to be present on matched archetypes.
    pub fn with<T: Component>(mut self) -> Self {
        self.required.push(T::id());
        self
    }

    /// Excludes archetypes carrying component `T`.
    pub fn without<T: Component>(mut self) -> Self {
        self.forbidden.push(T::id());
        self
    }

    /// Resolves the query against a database.
    ///
    /// ## Notes
    /// Consumes the builder; a query description is matched exactly once.
    pub fn run(self, database: &Database) -> QueryResult<'_> {
        let required: HashSet<ComponentId> = self.required.iter().copied().collect();
        let forbidden: HashSet<ComponentId> = self.forbidden.iter().copied().collect();
        let matched = database
            .archetypes()
            .filter(|archetype| {
                let set = archetype.component_set();
                required.iter().all(|id| set.contains(*id))
                    && !forbidden.iter().any(|id| set.contains(*id))
            })
            .map(Archetype::archetype_id)
            .collect();
        QueryResult::new(database, matched)
    }
}

/// The archetypes matched by one query, with read access to their rows.
pub struct QueryResult<'db> {
    database: &'db Database,
    archetype_ids: Vec<ArchetypeId>,
}

impl<'db> QueryResult<'db> {
    pub(crate) fn new(database: &'db Database, archetype_ids: Vec<ArchetypeId>) -> Self {
        Self { database, archetype_ids }
    }

    /// Returns the matched archetype ids in creation order.
    pub fn archetype_ids(&self) -> &[ArchetypeId] {
        &self.archetype_ids
    }

    /// Sums the row counts of every matched archetype.
    ///
    /// Archetypes pruned since the query was built contribute nothing.
    pub fn count(&self) -> usize {
        self.archetype_ids
            .iter()
            .filter_map(|id| self.database.archetype_by_id(*id))
            .map(Archetype::len)
            .sum()
    }

    /// Returns `true` if no matched archetype holds a row.
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Returns the first entity the iterator would yield.
    pub fn first(&self) -> Option<EntityHandle<'db>> {
        self.iter().next()
    }

    /// Iterates every entity of every matched archetype.
    pub fn iter(&self) -> EntityIter<'_, 'db> {
        EntityIter::new(self.database, &self.archetype_ids)
    }

    /// Groups the matched archetypes by the keys their columns carry for
    /// `trait_id`.
    pub fn group_by(&self, trait_id: ComponentId) -> GroupByResult<'db> {
        GroupByResult::from_archetype_ids(self.database, &self.archetype_ids, trait_id)
    }
}

impl std::fmt::Debug for QueryResult<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryResult")
            .field("archetypes", &self.archetype_ids.len())
            .finish()
    }
}

/// Iterator over `(archetype, row)` pairs yielding entity handles.
///
/// ## Notes
/// Archetype ids that no longer resolve are skipped; this happens when a
/// table was pruned between query construction and iteration.
pub struct EntityIter<'q, 'db> {
    database: &'db Database,
    archetype_ids: std::slice::Iter<'q, ArchetypeId>,
    current: Option<(&'db Archetype, RowIndex)>,
}

impl<'q, 'db> EntityIter<'q, 'db> {
    pub(crate) fn new(database: &'db Database, archetype_ids: &'q [ArchetypeId]) -> Self {
        Self {
            database,
            archetype_ids: archetype_ids.iter(),
            current: None,
        }
    }
}

impl<'q, 'db> Iterator for EntityIter<'q, 'db> {
    type Item = EntityHandle<'db>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((archetype, row)) = self.current.as_mut() {
                if let Some(entity_id) = archetype.entity_at(*row) {
                    let location = EntityLocation {
                        entity_id,
                        archetype_id: archetype.archetype_id(),
                        row_index: *row,
                    };
                    *row += 1;
                    return Some(EntityHandle::new(self.database, location));
                }
                self.current = None;
            }

            let archetype_id = *self.archetype_ids.next()?;
            if let Some(archetype) = self.database.archetype_by_id(archetype_id) {
                self.current = Some((archetype, 0));
            }
        }
    }
}
