//! # Entity Identity and Handles
//!
//! Entities are lightweight identifiers that reference rows in archetype
//! storage. This module defines:
//!
//! - [`EntityLocation`], the authoritative record mapping an entity to its
//!   archetype and row,
//! - [`EntityHandle`], a short-lived view for reading an entity's
//!   components.
//!
//! ## Entity Model
//! An [`EntityId`] is drawn from a monotonic counter owned by the database;
//! ids are never reused within a database's lifetime, so a dangling id can
//! only miss the entity index, never alias a different entity.
//!
//! ## Invariants
//! - A location must always reflect the actual archetype row.
//! - Locations are rewritten in the same operation as the row move that
//!   invalidates them (swap-remove fix-up, structural migration).
//!
//! ## Staleness
//! A handle borrows the database immutably, so the borrow checker rejects
//! holding a handle across any structural mutation. Handles are meant to be
//! fetched just before use and dropped immediately after.

use crate::engine::component::Component;
use crate::engine::database::Database;
use crate::engine::types::{ArchetypeId, EntityId, RowIndex};

/// Physical storage location of an entity within archetype storage.
///
/// ## Invariants
/// - Must always reflect the true location of the entity's component row.
/// - Rewritten together with every archetype row move.
/// - Removed from the index immediately when the entity is removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntityLocation {
    /// Entity this record belongs to.
    pub entity_id: EntityId,

    /// Archetype containing the entity's row.
    pub archetype_id: ArchetypeId,

    /// Row index within the archetype's parallel columns.
    pub row_index: RowIndex,
}

/// A non-owning, value-typed view of one entity.
///
/// ## Purpose
/// Bundles the entity's location with a database reference so component
/// reads resolve in two steps (archetype, then column) without extra
/// lookups.
///
/// ## Notes
/// The view is `Copy` and cheap; it must not outlive any structural
/// mutation of its archetype, which the borrow on the database enforces.
#[derive(Clone, Copy)]
pub struct EntityHandle<'db> {
    location: EntityLocation,
    database: &'db Database,
}

impl<'db> EntityHandle<'db> {
    pub(crate) fn new(database: &'db Database, location: EntityLocation) -> Self {
        Self { location, database }
    }

    /// Returns the entity's identifier.
    #[inline]
    pub fn id(&self) -> EntityId {
        self.location.entity_id
    }

    /// Returns the id of the archetype storing this entity.
    #[inline]
    pub fn archetype_id(&self) -> ArchetypeId {
        self.location.archetype_id
    }

    /// Returns the entity's row within its archetype.
    #[inline]
    pub fn row_index(&self) -> RowIndex {
        self.location.row_index
    }

    /// Returns the full location triple.
    #[inline]
    pub fn location(&self) -> EntityLocation {
        self.location
    }

    /// Reads component `T` from this entity's row.
    ///
    /// ## Behavior
    /// Returns `None` when the entity's archetype has no column for `T`, or
    /// when `T`'s layout disagrees with the stored meta, or when the
    /// component is zero-sized (no addressable payload).
    pub fn get<T: Component>(&self) -> Option<&'db T> {
        let database: &'db Database = self.database;
        let archetype = database.archetype_by_id(self.location.archetype_id)?;
        let column = archetype.get_column(T::id())?;
        column.get_as::<T>(self.location.row_index)
    }

    /// Returns `true` if this entity's archetype stores component `T`.
    pub fn has<T: Component>(&self) -> bool {
        self.database
            .archetype_by_id(self.location.archetype_id)
            .map_or(false, |archetype| archetype.component_set().contains(T::id()))
    }
}

impl std::fmt::Debug for EntityHandle<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityHandle")
            .field("entity_id", &self.location.entity_id)
            .field("archetype_id", &format_args!("{:#018x}", self.location.archetype_id))
            .field("row_index", &self.location.row_index)
            .finish()
    }
}
