//! # Archetype Tables
//!
//! An [`Archetype`] stores every entity whose component set matches the
//! archetype's set exactly. Component data is columnar: one type-erased
//! column per component type, all columns parallel to a single vector of
//! entity ids.
//!
//! ## Design
//! - Column order is the sorted id order of the component set.
//! - Rows are densely packed; evictions swap the last row into the hole.
//! - The owning database is responsible for fixing the location record of
//!   the entity that a swap relocates.
//!
//! ## Invariants
//! - After every operation, all columns and the entity-id vector have equal
//!   length.
//! - `archetype_id` equals the canonical id of the component set.
//! - A row is either fully present in every column or absent from all of
//!   them; partial inserts roll themselves back before returning an error.

use crate::engine::component::{ComponentSet, ComponentValue};
use crate::engine::error::{EcsError, EcsResult, OutOfBoundsError};
use crate::engine::storage::ComponentArray;
use crate::engine::types::{ArchetypeId, ComponentId, EntityId, RowIndex};

/// A table of entities sharing one exact component set.
pub struct Archetype {
    archetype_id: ArchetypeId,
    set: ComponentSet,
    columns: Vec<ComponentArray>,
    entity_ids: Vec<EntityId>,
}

impl Archetype {
    /// Builds an empty table with one column per meta, in set order.
    pub fn from_component_set(set: ComponentSet) -> Self {
        let archetype_id = set.canonical_id();
        let columns = set.iter().map(|meta| ComponentArray::new(*meta)).collect();
        Self {
            archetype_id,
            set,
            columns,
            entity_ids: Vec::new(),
        }
    }

    /// Returns the canonical identifier of this table.
    #[inline]
    pub fn archetype_id(&self) -> ArchetypeId {
        self.archetype_id
    }

    /// Returns the component set this table stores.
    #[inline]
    pub fn component_set(&self) -> &ComponentSet {
        &self.set
    }

    /// Returns the entity ids in current row order.
    #[inline]
    pub fn entity_ids(&self) -> &[EntityId] {
        &self.entity_ids
    }

    /// Returns the entity occupying `row`, if the row exists.
    #[inline]
    pub fn entity_at(&self, row: RowIndex) -> Option<EntityId> {
        self.entity_ids.get(row).copied()
    }

    /// Returns the number of rows in the table.
    #[inline]
    pub fn len(&self) -> usize {
        self.entity_ids.len()
    }

    /// Returns `true` if the table holds no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entity_ids.is_empty()
    }

    /// Returns `true` iff every id in `required` is present.
    #[inline]
    pub fn has_components(&self, required: &[ComponentId]) -> bool {
        required.iter().all(|id| self.set.contains(*id))
    }

    /// Returns `true` iff at least one id in `forbidden` is present.
    #[inline]
    pub fn has_any(&self, forbidden: &[ComponentId]) -> bool {
        forbidden.iter().any(|id| self.set.contains(*id))
    }

    /// Returns the column index for `id`.
    ///
    /// ## Notes
    /// Linear scan; column counts are small.
    #[inline]
    pub fn get_column_index(&self, id: ComponentId) -> Option<usize> {
        self.columns.iter().position(|column| column.meta().id == id)
    }

    /// Returns the column storing `id`.
    #[inline]
    pub fn get_column(&self, id: ComponentId) -> Option<&ComponentArray> {
        self.get_column_index(id).map(|index| &self.columns[index])
    }

    /// Returns the column at `index`.
    #[inline]
    pub fn column_by_index(&self, index: usize) -> Option<&ComponentArray> {
        self.columns.get(index)
    }

    /// Returns the column at `index` mutably.
    #[inline]
    pub fn column_by_index_mut(&mut self, index: usize) -> Option<&mut ComponentArray> {
        self.columns.get_mut(index)
    }

    /// Appends a full row for `entity_id` from the supplied components.
    ///
    /// ## Behavior
    /// 1. Validates that the caller's component ids equal this table's set
    ///    exactly.
    /// 2. Appends the entity id, then each component's bytes in column order.
    /// 3. Returns the new row index.
    ///
    /// ## Errors
    /// `ComponentSetMismatch` when the supplied components do not cover the
    /// set exactly; storage errors when a column append fails. A failed
    /// append rolls back the partially written row before returning.
    pub fn add_entity(
        &mut self,
        entity_id: EntityId,
        components: &[ComponentValue],
    ) -> EcsResult<RowIndex> {
        if components.len() != self.columns.len() {
            return Err(EcsError::ComponentSetMismatch { archetype: self.archetype_id });
        }
        for column in &self.columns {
            let id = column.meta().id;
            if !components.iter().any(|value| value.id() == id) {
                return Err(EcsError::ComponentSetMismatch { archetype: self.archetype_id });
            }
        }

        let row = self.entity_ids.len();
        self.entity_ids.push(entity_id);
        for index in 0..self.columns.len() {
            let id = self.columns[index].meta().id;
            let Some(value) = components.iter().find(|value| value.id() == id) else {
                self.rollback_partial_row(index, row);
                return Err(EcsError::ComponentSetMismatch { archetype: self.archetype_id });
            };
            if let Err(error) = self.columns[index].append(value.bytes()) {
                self.rollback_partial_row(index, row);
                return Err(error.into());
            }
        }
        Ok(row)
    }

    /// Copies the shared columns of `source_row` into `destination`.
    ///
    /// ## Behavior
    /// For every column of this table whose id also exists in the
    /// destination, appends the bytes at `source_row` to the matching
    /// destination column, then appends the entity id and returns the new
    /// destination row. Columns that exist only in the destination are left
    /// for the caller to fill.
    ///
    /// ## Errors
    /// Storage errors from destination appends; the destination's partial
    /// row is rolled back before the error is returned, leaving the source
    /// untouched on every path.
    pub fn copy_row_to(
        &self,
        source_row: RowIndex,
        destination: &mut Archetype,
    ) -> EcsResult<RowIndex> {
        let Some(&entity_id) = self.entity_ids.get(source_row) else {
            return Err(EcsError::Storage(
                OutOfBoundsError { row: source_row, len: self.entity_ids.len() }.into(),
            ));
        };

        let destination_row = destination.entity_ids.len();
        for column in &self.columns {
            let Some(index) = destination.get_column_index(column.meta().id) else {
                continue;
            };
            if let Err(error) = destination.columns[index].append_from(column, source_row) {
                for filled in &mut destination.columns {
                    if filled.len() > destination_row {
                        let _ = filled.swap_remove(destination_row);
                    }
                }
                return Err(error.into());
            }
        }
        destination.entity_ids.push(entity_id);
        Ok(destination_row)
    }

    /// Evicts `row` from every column and the entity-id vector by swapping
    /// the last row into its place.
    ///
    /// ## Behavior
    /// Returns the id that previously occupied `row`. If another entity was
    /// relocated into `row`, the owning database must rewrite that entity's
    /// location record.
    pub fn remove_row_by_swap(&mut self, row: RowIndex) -> EcsResult<EntityId> {
        if row >= self.entity_ids.len() {
            return Err(EcsError::Storage(
                OutOfBoundsError { row, len: self.entity_ids.len() }.into(),
            ));
        }
        let evicted = self.entity_ids.swap_remove(row);
        for column in &mut self.columns {
            column.swap_remove(row)?;
        }
        Ok(evicted)
    }

    fn rollback_partial_row(&mut self, appended_columns: usize, row: RowIndex) {
        for column in &mut self.columns[..appended_columns] {
            let _ = column.swap_remove(row);
        }
        self.entity_ids.pop();
    }
}

impl std::fmt::Debug for Archetype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archetype")
            .field("archetype_id", &format_args!("{:#018x}", self.archetype_id))
            .field("components", &self.set.len())
            .field("rows", &self.entity_ids.len())
            .finish()
    }
}
