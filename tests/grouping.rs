use archetype_engine::prelude::*;
use archetype_engine::{GroupKey, TraitDesc};

/// Virtual trait shared by every drawable component type below.
const DRAW_LAYER: ComponentId = ComponentId::from_name("DrawLayer");

macro_rules! layered_component {
    ($name:ident, $key:expr) => {
        #[derive(Clone, Copy, Debug, PartialEq)]
        struct $name {
            id: u32,
        }

        impl Component for $name {
            fn type_name() -> &'static str {
                stringify!($name)
            }

            const TRAIT_DESC: Option<TraitDesc> =
                Some(TraitDesc::grouped(DRAW_LAYER, $key));
        }
    };
}

layered_component!(Haze, 5);
layered_component!(Terrain, 3);
layered_component!(Water, 8);
layered_component!(Unit, 1);
layered_component!(Particle, 9);
layered_component!(Road, 2);
layered_component!(Cursor, 7);

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
struct Tint {
    rgba: u32,
}

impl Component for Tint {
    fn type_name() -> &'static str {
        "Tint"
    }

    const TRAIT_DESC: Option<TraitDesc> = Some(TraitDesc::grouped(DRAW_LAYER, 3));
}

#[test]
fn groups_iterate_in_ascending_key_order() {
    let mut database = Database::new();

    // Creation order deliberately scrambles the keys: 5, 3, 8, 1, 9, 2, 7.
    database.create_entity(&[ComponentValue::of(Haze { id: 0 })]).unwrap();
    database.create_entity(&[ComponentValue::of(Terrain { id: 1 })]).unwrap();
    database.create_entity(&[ComponentValue::of(Water { id: 2 })]).unwrap();
    database.create_entity(&[ComponentValue::of(Unit { id: 3 })]).unwrap();
    database.create_entity(&[ComponentValue::of(Particle { id: 4 })]).unwrap();
    database.create_entity(&[ComponentValue::of(Road { id: 5 })]).unwrap();
    database.create_entity(&[ComponentValue::of(Cursor { id: 6 })]).unwrap();

    let grouped = database.group_by(DRAW_LAYER);
    let keys: Vec<GroupKey> = grouped.keys().collect();
    assert_eq!(keys, vec![1, 2, 3, 5, 7, 8, 9]);

    let iterated: Vec<GroupKey> = grouped.iter().map(|group| group.key()).collect();
    assert_eq!(iterated, keys);
}

#[test]
fn multiple_archetypes_share_a_group() {
    let mut database = Database::new();
    let plain_terrain = database
        .create_entity(&[ComponentValue::of(Terrain { id: 0 })])
        .unwrap();
    let positioned_terrain = database
        .create_entity(&[
            ComponentValue::of(Terrain { id: 1 }),
            ComponentValue::of(Position { x: 4.0, y: 2.0 }),
        ])
        .unwrap();
    // A different component type on the same layer joins the same group.
    let tinted = database
        .create_entity(&[ComponentValue::of(Tint { rgba: 0xff00_ffff })])
        .unwrap();

    let grouped = database.group_by(DRAW_LAYER);
    assert_eq!(grouped.len(), 1);

    let layer = grouped.get(3).unwrap();
    assert_eq!(layer.archetype_ids().len(), 3);
    assert_eq!(layer.count(), 3);

    let mut seen: Vec<EntityId> = layer.iter().map(|handle| handle.id()).collect();
    seen.sort_unstable();
    assert_eq!(seen, vec![plain_terrain, positioned_terrain, tinted]);
}

#[test]
fn group_queries_are_restricted_to_the_group() {
    let mut database = Database::new();
    database.create_entity(&[ComponentValue::of(Terrain { id: 0 })]).unwrap();
    let positioned_terrain = database
        .create_entity(&[
            ComponentValue::of(Terrain { id: 1 }),
            ComponentValue::of(Position { x: 0.0, y: 0.0 }),
        ])
        .unwrap();
    // Positioned, but on a different layer; must not match the sub-query.
    database
        .create_entity(&[
            ComponentValue::of(Unit { id: 2 }),
            ComponentValue::of(Position { x: 1.0, y: 1.0 }),
        ])
        .unwrap();

    let grouped = database.group_by(DRAW_LAYER);
    let layer = grouped.get(3).unwrap();
    let positioned = layer.query(&[Position::id()]);
    assert_eq!(positioned.count(), 1);
    assert_eq!(positioned.first().unwrap().id(), positioned_terrain);
}

#[test]
fn query_results_group_their_matches_only() {
    let mut database = Database::new();
    database
        .create_entity(&[
            ComponentValue::of(Terrain { id: 0 }),
            ComponentValue::of(Position { x: 0.0, y: 0.0 }),
        ])
        .unwrap();
    database
        .create_entity(&[
            ComponentValue::of(Cursor { id: 1 }),
            ComponentValue::of(Position { x: 1.0, y: 1.0 }),
        ])
        .unwrap();
    // No Position, so the query-level grouping must not see layer 8.
    database.create_entity(&[ComponentValue::of(Water { id: 2 })]).unwrap();

    let positioned = database.query(&[Position::id()]);
    let grouped = positioned.group_by(DRAW_LAYER);
    let keys: Vec<GroupKey> = grouped.keys().collect();
    assert_eq!(keys, vec![3, 7]);
}

#[test]
fn components_without_the_trait_do_not_group() {
    let mut database = Database::new();
    database
        .create_entity(&[ComponentValue::of(Position { x: 0.0, y: 0.0 })])
        .unwrap();

    let grouped = database.group_by(DRAW_LAYER);
    assert!(grouped.is_empty());
    assert!(grouped.get(0).is_none());
}

#[test]
fn grouping_tracks_structural_mutation() {
    let mut database = Database::new();
    let entity = database
        .create_entity(&[ComponentValue::of(Unit { id: 0 })])
        .unwrap();

    assert_eq!(database.group_by(DRAW_LAYER).keys().collect::<Vec<_>>(), vec![1]);

    // Moving the entity onto another layer re-partitions the next grouping.
    database
        .add_components(entity, &[ComponentValue::of(Particle { id: 1 })])
        .unwrap();
    let keys: Vec<GroupKey> = database.group_by(DRAW_LAYER).keys().collect();
    assert_eq!(keys, vec![1, 9], "the archetype carries both layers now");

    database.remove_components(entity, &[Unit::meta()]).unwrap();
    let keys: Vec<GroupKey> = database.group_by(DRAW_LAYER).keys().collect();
    assert_eq!(keys, vec![9]);
}
