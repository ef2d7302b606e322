//! # Archetype Engine
//!
//! Archetype-based entity-component storage engine for building simulation,
//! game, and dataflow systems.
//!
//! ## Design Goals
//! - Columnar, type-erased storage for cache efficiency
//! - Deterministic hashed identity for components and archetypes
//! - Explicit, synchronous structural mutation with swap-remove discipline
//! - Deferred batched mutation through transactions
//!
//! Heterogeneous per-entity data lives in tables grouped by the exact set of
//! component types each entity holds. Changing that set moves the entity's
//! row between tables; queries and grouped views stream entities back out of
//! matched tables.

#![forbid(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]
#![allow(clippy::module_inception)]

pub mod engine;
pub mod profiling;

// ─────────────────────────────────────────────────────────────────────────────
// Re-exports (Public API)
// ─────────────────────────────────────────────────────────────────────────────

// Core storage types

pub use engine::database::Database;

pub use engine::component::{
    Component,
    ComponentMeta,
    ComponentSet,
    ComponentValue,
    TraitDesc,
    TraitKind,
};

pub use engine::storage::ComponentArray;
pub use engine::archetype::Archetype;

pub use engine::entity::{
    EntityHandle,
    EntityLocation,
};

pub use engine::query::{EntityIter, QueryBuilder, QueryResult};
pub use engine::group::{Group, GroupByResult};

pub use engine::transaction::{Command, Transaction};
pub use engine::resource::{Resource, ResourceRegistry};

pub use engine::error::{
    EcsError,
    EcsResult,
    StorageError,
    StorageResult,
};

pub use engine::types::{
    ArchetypeId,
    ComponentId,
    EntityId,
    GroupKey,
    RowIndex,
};

// ─────────────────────────────────────────────────────────────────────────────
// Prelude
// ─────────────────────────────────────────────────────────────────────────────

/// Commonly used engine types.
///
/// Import with:
/// ```rust
/// use archetype_engine::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Component,
        ComponentId,
        ComponentMeta,
        ComponentValue,
        Database,
        EcsError,
        EcsResult,
        EntityHandle,
        EntityId,
        QueryBuilder,
        Transaction,
    };
}
