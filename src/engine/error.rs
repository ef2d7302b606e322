//! Error types for columnar storage and structural mutation.
//!
//! This module declares focused, composable error types used across the
//! entity-component storage engine. Each error carries enough context to make
//! failures actionable while remaining small and cheap to pass around or
//! convert into higher-level variants like [`EcsError`].
//!
//! ## Goals
//! * **Specificity:** Each error type models a single failure mode (e.g. row
//!   bound violations, byte-size disagreements, allocation failures).
//! * **Ergonomics:** All errors implement [`std::error::Error`] and
//!   [`fmt::Display`], and provide `From<T>` conversions into aggregate
//!   errors so call sites can use `?`.
//! * **Actionability:** Structured fields (offending row vs. current length,
//!   expected vs. actual byte counts, the entity or archetype involved) make
//!   logs useful without reproducing the issue.
//!
//! ## Typical flow
//! Low-level column operations return [`StorageError`]. Database-level
//! orchestration uses `?` to bubble failures into [`EcsError`], which callers
//! can match on for control flow or log with readable messages.
//!
//! ## Display vs. Debug
//! * [`fmt::Display`] is optimized for operator logs (short, imperative
//!   phrasing).
//! * [`fmt::Debug`] (derived) retains full structure for diagnostics.

use std::fmt;

use crate::engine::types::{ArchetypeId, ComponentId, EntityId, RowIndex};

/// Returned when a row index addresses a column or archetype outside its
/// current length.
///
/// ### Fields
/// * `row` — The row index that was requested.
/// * `len` — The number of valid rows at the time of the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfBoundsError {
    /// Offending row index that was requested.
    pub row: RowIndex,

    /// Number of valid rows at the time of the request.
    pub len: usize,
}

impl fmt::Display for OutOfBoundsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row index {} out of bounds (length {})", self.row, self.len)
    }
}

impl std::error::Error for OutOfBoundsError {}

/// Returned when a byte payload disagrees with the size a column declares
/// for its component type.
///
/// This is a logic error surfaced at the type-erasure boundary: every write
/// into a column must carry exactly `size` bytes.
///
/// ### Fields
/// * `expected` — The byte size the destination column declares.
/// * `actual` — The byte length of the payload the caller provided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeMismatchError {
    /// Byte size the destination column declares.
    pub expected: usize,

    /// Byte length of the provided payload.
    pub actual: usize,
}

impl fmt::Display for TypeMismatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "component size mismatch: expected {} bytes, got {}",
            self.expected, self.actual
        )
    }
}

impl std::error::Error for TypeMismatchError {}

/// Returned when the global allocator cannot satisfy a column allocation.
///
/// ## Notes
/// Structural-mutation paths treat this as recoverable: the source row stays
/// authoritative and any partially filled destination row is rolled back
/// before the error is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationError {
    /// Number of bytes the failed allocation requested.
    pub bytes: usize,
}

impl fmt::Display for AllocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to allocate {} bytes of column storage", self.bytes)
    }
}

impl std::error::Error for AllocationError {}

/// Aggregate error for column (component storage) operations.
///
/// This wraps the precise, low-level failures that can occur when reading,
/// writing, or resizing a type-erased column. Conversions (`From<T>`) are
/// implemented for the underlying errors so callers can write `?` and still
/// return a single expressive type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// A row index addressed storage outside valid bounds.
    OutOfBounds(OutOfBoundsError),

    /// A byte payload did not match the column's declared component size.
    TypeMismatch(TypeMismatchError),

    /// The allocator could not provide backing storage.
    OutOfMemory(AllocationError),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::OutOfBounds(e) => write!(f, "{e}"),
            StorageError::TypeMismatch(e) => write!(f, "{e}"),
            StorageError::OutOfMemory(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<OutOfBoundsError> for StorageError {
    fn from(e: OutOfBoundsError) -> Self {
        StorageError::OutOfBounds(e)
    }
}

impl From<TypeMismatchError> for StorageError {
    fn from(e: TypeMismatchError) -> Self {
        StorageError::TypeMismatch(e)
    }
}

impl From<AllocationError> for StorageError {
    fn from(e: AllocationError) -> Self {
        StorageError::OutOfMemory(e)
    }
}

/// High-level error for database and transaction operations.
///
/// This aggregates the failure modes encountered while creating, mutating,
/// and destroying entities. It intentionally preserves the underlying
/// structured error to keep diagnostics actionable.
///
/// ### Usage
/// `From<StorageError>` allows `?` from column-level operations:
/// ```ignore
/// fn overwrite(column: &mut ComponentArray, row: RowIndex, bytes: &[u8]) -> EcsResult<()> {
///     column.set(row, bytes)?; // StorageError -> EcsError via `From`
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcsError {
    /// The referenced entity id is not present in the database.
    EntityNotFound(EntityId),

    /// An entity with this id already exists; reserved ids may be used once.
    EntityAlreadyExists(EntityId),

    /// An entity location referenced an archetype that is not in the map.
    ///
    /// This indicates a broken internal invariant rather than caller error.
    ArchetypeNotFound(ArchetypeId),

    /// A component id was expected in an archetype's column set but absent.
    ///
    /// Like [`EcsError::ArchetypeNotFound`], this signals an internal
    /// bookkeeping breach.
    ComponentNotInArchetype {
        /// Archetype whose columns were searched.
        archetype: ArchetypeId,

        /// Component id that was not found.
        component: ComponentId,
    },

    /// A row insertion supplied a component set that does not exactly match
    /// the archetype's set.
    ComponentSetMismatch {
        /// Archetype whose set was violated.
        archetype: ArchetypeId,
    },

    /// A removal would leave the entity with no components at all.
    CannotRemoveAllComponents(EntityId),

    /// `execute` was called on a transaction that already ran.
    TransactionAlreadyExecuted,

    /// A column-level storage operation failed.
    Storage(StorageError),
}

impl fmt::Display for EcsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EcsError::EntityNotFound(entity) => write!(f, "entity {} not found", entity),
            EcsError::EntityAlreadyExists(entity) => {
                write!(f, "entity {} already exists", entity)
            }
            EcsError::ArchetypeNotFound(archetype) => {
                write!(f, "archetype {:#018x} not found", archetype)
            }
            EcsError::ComponentNotInArchetype { archetype, component } => write!(
                f,
                "component {} is not stored in archetype {:#018x}",
                component, archetype
            ),
            EcsError::ComponentSetMismatch { archetype } => write!(
                f,
                "component set does not match archetype {:#018x}",
                archetype
            ),
            EcsError::CannotRemoveAllComponents(entity) => write!(
                f,
                "removing these components would leave entity {} empty",
                entity
            ),
            EcsError::TransactionAlreadyExecuted => {
                f.write_str("transaction has already been executed")
            }
            EcsError::Storage(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for EcsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EcsError::Storage(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StorageError> for EcsError {
    fn from(e: StorageError) -> Self {
        EcsError::Storage(e)
    }
}

/// Convenience alias for database-level results.
pub type EcsResult<T> = Result<T, EcsError>;

/// Convenience alias for column-level results.
pub type StorageResult<T> = Result<T, StorageError>;
