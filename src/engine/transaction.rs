//! Deferred structural mutation.
//!
//! A [`Transaction`] queues structural commands against a database and
//! applies them in insertion order on [`Transaction::execute`]. Reads pass
//! through to the underlying database immediately, so queued mutations are
//! not visible until they execute.
//!
//! ## Command ownership
//! Commands are a typed sum; each carries its captured payload by value.
//! Execution drains the queue, so every command is consumed exactly once on
//! every path: commands that ran are dropped after application, commands
//! behind a failed one are dropped by the drain, and commands in a
//! transaction that is never executed are dropped with the queue itself.

use crate::engine::component::{ComponentMeta, ComponentValue};
use crate::engine::database::Database;
use crate::engine::entity::EntityHandle;
use crate::engine::error::{EcsError, EcsResult};
use crate::engine::group::GroupByResult;
use crate::engine::query::QueryResult;
use crate::engine::resource::ResourceRegistry;
use crate::engine::types::{ComponentId, EntityId};

/// One queued structural mutation.
pub enum Command {
    /// Insert a new entity under an id reserved at queue time.
    CreateEntity {
        /// Id handed to the caller when the command was queued.
        reserved: EntityId,

        /// Captured component payloads.
        components: Vec<ComponentValue>,
    },

    /// Remove an entity and all its components.
    RemoveEntity {
        /// Entity to remove.
        entity: EntityId,
    },

    /// Add components to an entity.
    AddComponents {
        /// Entity to extend.
        entity: EntityId,

        /// Captured component payloads.
        components: Vec<ComponentValue>,
    },

    /// Remove components from an entity.
    RemoveComponents {
        /// Entity to shrink.
        entity: EntityId,

        /// Metas naming the components to remove.
        metas: Vec<ComponentMeta>,
    },
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::CreateEntity { reserved, components } => f
                .debug_struct("CreateEntity")
                .field("reserved", reserved)
                .field("components", &components.len())
                .finish(),
            Command::RemoveEntity { entity } => {
                f.debug_struct("RemoveEntity").field("entity", entity).finish()
            }
            Command::AddComponents { entity, components } => f
                .debug_struct("AddComponents")
                .field("entity", entity)
                .field("components", &components.len())
                .finish(),
            Command::RemoveComponents { entity, metas } => f
                .debug_struct("RemoveComponents")
                .field("entity", entity)
                .field("components", &metas.len())
                .finish(),
        }
    }
}

/// A queued batch of structural mutations against one database.
pub struct Transaction<'db> {
    database: &'db mut Database,
    commands: Vec<Command>,
    executed: bool,
}

impl<'db> Transaction<'db> {
    /// Opens a transaction over `database`.
    pub fn new(database: &'db mut Database) -> Self {
        Self {
            database,
            commands: Vec::new(),
            executed: false,
        }
    }

    /// Queues an entity creation and returns its id immediately.
    ///
    /// ## Behavior
    /// The id is reserved synchronously so the caller can reference the
    /// entity in later commands; storage insertion happens on `execute`.
    pub fn create_entity(&mut self, components: Vec<ComponentValue>) -> EntityId {
        let reserved = self.database.reserve_entity_id();
        self.commands.push(Command::CreateEntity { reserved, components });
        reserved
    }

    /// Queues removal of an entity.
    pub fn remove_entity(&mut self, entity: EntityId) {
        self.commands.push(Command::RemoveEntity { entity });
    }

    /// Queues a component addition.
    pub fn add_components(&mut self, entity: EntityId, components: Vec<ComponentValue>) {
        self.commands.push(Command::AddComponents { entity, components });
    }

    /// Queues a component removal.
    pub fn remove_components(&mut self, entity: EntityId, metas: Vec<ComponentMeta>) {
        self.commands.push(Command::RemoveComponents { entity, metas });
    }

    /// Returns the number of commands waiting to execute.
    pub fn pending(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` once `execute` has run.
    pub fn is_executed(&self) -> bool {
        self.executed
    }

    /// Reads an entity directly from the underlying database.
    ///
    /// Queued mutations are not visible here until `execute` runs.
    pub fn get_entity(&self, entity_id: EntityId) -> Option<EntityHandle<'_>> {
        self.database.get_entity(entity_id)
    }

    /// Runs a query directly against the underlying database.
    pub fn query(&self, required: &[ComponentId]) -> QueryResult<'_> {
        self.database.query(required)
    }

    /// Groups archetypes directly against the underlying database.
    pub fn group_by(&self, trait_id: ComponentId) -> GroupByResult<'_> {
        self.database.group_by(trait_id)
    }

    /// Returns the database's resource registry.
    pub fn resources(&self) -> &ResourceRegistry {
        self.database.resources()
    }

    /// Returns the database's resource registry mutably.
    pub fn resources_mut(&mut self) -> &mut ResourceRegistry {
        self.database.resources_mut()
    }

    /// Applies every queued command in insertion order.
    ///
    /// ## Behavior
    /// The transaction is marked consumed before the first command runs, so
    /// a second call reports `TransactionAlreadyExecuted` whether the first
    /// succeeded or failed. On a command error, execution stops, the error
    /// propagates, and the remaining commands are discarded by the drain.
    pub fn execute(&mut self) -> EcsResult<()> {
        if self.executed {
            return Err(EcsError::TransactionAlreadyExecuted);
        }
        self.executed = true;

        for command in self.commands.drain(..) {
            match command {
                Command::CreateEntity { reserved, components } => {
                    self.database.create_entity_with_id(reserved, &components)?;
                }
                Command::RemoveEntity { entity } => {
                    self.database.remove_entity(entity)?;
                }
                Command::AddComponents { entity, components } => {
                    self.database.add_components(entity, &components)?;
                }
                Command::RemoveComponents { entity, metas } => {
                    self.database.remove_components(entity, &metas)?;
                }
            }
        }
        Ok(())
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        // Unexecuted commands are released here; executed ones were already
        // consumed by the drain in `execute`.
        self.commands.clear();
    }
}

impl std::fmt::Debug for Transaction<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("pending", &self.commands.len())
            .field("executed", &self.executed)
            .finish()
    }
}
