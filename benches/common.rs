#![allow(dead_code)]

use archetype_engine::prelude::*;

pub const AGENTS_SMALL: usize = 10_000;
pub const AGENTS_MED: usize = 100_000;

#[derive(Clone, Copy)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Component for Position {
    fn type_name() -> &'static str {
        "Position"
    }
}

#[derive(Clone, Copy)]
pub struct Wealth {
    pub value: f32,
}

impl Component for Wealth {
    fn type_name() -> &'static str {
        "Wealth"
    }
}

#[derive(Clone, Copy)]
pub struct Productivity {
    pub rate: f32,
}

impl Component for Productivity {
    fn type_name() -> &'static str {
        "Productivity"
    }
}

pub fn populate(database: &mut Database, agents: usize) -> EcsResult<()> {
    for index in 0..agents {
        database.create_entity(&[
            ComponentValue::of(Position { x: index as f32, y: 0.0 }),
            ComponentValue::of(Wealth { value: 100.0 }),
        ])?;
    }
    Ok(())
}
