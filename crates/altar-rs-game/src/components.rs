//! ECS components for loose item entities.

use bevy_ecs::prelude::*;

use crate::item::ItemStack;

/// Network identity for an entity.
#[derive(Component, Debug, Clone, Copy)]
pub struct EntityId {
    pub runtime_id: u64,
}

/// Position in the world.
#[derive(Component, Debug, Clone, Copy)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Velocity in blocks per tick.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Velocity {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Whether the entity is resting on the ground.
#[derive(Component, Debug, Clone, Copy)]
pub struct OnGround(pub bool);

/// The stack carried by a dropped item entity.
#[derive(Component, Debug, Clone)]
pub struct DroppedItem(pub ItemStack);
