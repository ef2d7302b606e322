use archetype_engine::prelude::*;
use archetype_engine::EcsError;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Position {
    x: f32,
    y: f32,
}

impl Component for Position {
    fn type_name() -> &'static str {
        "Position"
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Health {
    current: u32,
    max: u32,
}

impl Component for Health {
    fn type_name() -> &'static str {
        "Health"
    }
}

#[derive(Debug, Default, PartialEq)]
struct TickCount {
    value: u64,
}

#[test]
fn queued_mutations_are_invisible_until_execute() {
    let mut database = Database::new();
    let mut transaction = database.transaction();

    let entity = transaction.create_entity(vec![ComponentValue::of(Position { x: 1.0, y: 2.0 })]);
    assert_eq!(transaction.pending(), 1);

    // Passthrough reads see the database as-is.
    assert!(transaction.get_entity(entity).is_none());
    assert_eq!(transaction.query(&[Position::id()]).count(), 0);

    transaction.execute().unwrap();
    drop(transaction);

    let handle = database.get_entity(entity).unwrap();
    assert_eq!(handle.get::<Position>(), Some(&Position { x: 1.0, y: 2.0 }));
}

#[test]
fn reserved_ids_are_handed_out_synchronously_and_distinct() {
    let mut database = Database::new();
    let mut transaction = database.transaction();

    let first = transaction.create_entity(vec![ComponentValue::of(Position { x: 0.0, y: 0.0 })]);
    let second = transaction.create_entity(vec![ComponentValue::of(Position { x: 1.0, y: 0.0 })]);
    assert_ne!(first, second);

    transaction.execute().unwrap();
    drop(transaction);
    assert!(database.get_entity(first).is_some());
    assert!(database.get_entity(second).is_some());
}

#[test]
fn commands_apply_in_fifo_order() {
    let mut database = Database::new();
    let doomed = database
        .create_entity(&[ComponentValue::of(Position { x: 9.0, y: 9.0 })])
        .unwrap();

    let mut transaction = database.transaction();
    let entity = transaction.create_entity(vec![ComponentValue::of(Position { x: 0.0, y: 0.0 })]);
    // Later commands may reference the reserved id; they run after the create.
    transaction.add_components(entity, vec![ComponentValue::of(Health { current: 3, max: 3 })]);
    transaction.remove_components(entity, vec![Health::meta()]);
    transaction.remove_entity(doomed);
    transaction.execute().unwrap();
    drop(transaction);

    let handle = database.get_entity(entity).unwrap();
    assert!(handle.has::<Position>());
    assert!(!handle.has::<Health>());
    assert!(database.get_entity(doomed).is_none());
}

#[test]
fn double_execute_is_an_error() {
    let mut database = Database::new();
    let mut transaction = database.transaction();
    transaction.create_entity(vec![ComponentValue::of(Position { x: 0.0, y: 0.0 })]);

    assert_eq!(transaction.execute(), Ok(()));
    assert_eq!(transaction.execute(), Err(EcsError::TransactionAlreadyExecuted));
    // Dropping afterwards must not double-release anything.
    drop(transaction);
    assert_eq!(database.entity_count(), 1);
}

#[test]
fn dropping_an_unexecuted_transaction_applies_nothing() {
    let mut database = Database::new();
    let reserved;
    {
        let mut transaction = database.transaction();
        reserved = transaction.create_entity(vec![ComponentValue::of(Position { x: 0.0, y: 0.0 })]);
        transaction.remove_entity(reserved);
        // Dropped without execute.
    }
    assert!(database.get_entity(reserved).is_none());
    assert_eq!(database.entity_count(), 0);

    // The reservation itself is consumed; fresh entities get later ids.
    let next = database
        .create_entity(&[ComponentValue::of(Position { x: 1.0, y: 1.0 })])
        .unwrap();
    assert!(next > reserved);
}

#[test]
fn a_failing_command_stops_execution() {
    let mut database = Database::new();
    let mut transaction = database.transaction();

    transaction.remove_entity(404);
    let entity = transaction.create_entity(vec![ComponentValue::of(Position { x: 0.0, y: 0.0 })]);

    assert_eq!(transaction.execute(), Err(EcsError::EntityNotFound(404)));
    assert_eq!(transaction.pending(), 0, "remaining commands are discarded");
    // Execution stopped before the create ran.
    assert!(transaction.get_entity(entity).is_none());

    // The transaction is consumed even though it failed.
    assert_eq!(transaction.execute(), Err(EcsError::TransactionAlreadyExecuted));
    drop(transaction);
    assert_eq!(database.entity_count(), 0);
}

#[test]
fn resource_calls_pass_through_immediately() {
    let mut database = Database::new();
    let mut transaction = database.transaction();

    transaction.resources_mut().set(TickCount { value: 7 });
    assert_eq!(transaction.resources().get::<TickCount>().unwrap().value, 7);
    // Never executed; resource writes are not queued.
    drop(transaction);

    assert_eq!(database.resources().get::<TickCount>().unwrap().value, 7);
    assert_eq!(database.resources_mut().remove::<TickCount>(), Some(TickCount { value: 7 }));
}

#[test]
fn grouping_passes_through() {
    let mut database = Database::new();
    database
        .create_entity(&[ComponentValue::of(Position { x: 0.0, y: 0.0 })])
        .unwrap();

    let mut transaction = database.transaction();
    transaction.create_entity(vec![ComponentValue::of(Position { x: 1.0, y: 1.0 })]);

    // Grouping and queries reflect only executed state.
    assert_eq!(transaction.query(&[Position::id()]).count(), 1);
    assert!(transaction.group_by(ComponentId::from_name("DrawLayer")).is_empty());
    transaction.execute().unwrap();
}
