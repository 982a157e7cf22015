//! ECS world for loose items: spawning, physics, and the event bus.
//!
//! This is the host side of [`WorldAccess`]: altars query and mutate dropped
//! items through the trait, while `tick` integrates their motion.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use bevy_ecs::prelude::*;

use crate::components::*;
use crate::geometry::{Aabb, Vec3};
use crate::item::ItemStack;
use crate::world_access::{ItemEntityId, ItemEntityView, WorldAccess};

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// Outgoing events queued by ECS operations for the driver to consume.
#[derive(Resource, Default)]
pub struct OutgoingEvents {
    pub events: Vec<GameEvent>,
}

/// Global tick counter (incremented every 50 ms).
#[derive(Resource, Default)]
pub struct TickCounter(pub u64);

/// Entity ID allocator.
#[derive(Resource)]
pub struct EntityIdAllocator {
    next: AtomicU64,
}

impl EntityIdAllocator {
    pub fn new(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
        }
    }

    pub fn allocate(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// Next ID that will be allocated.
    pub fn current(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// Game events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    ItemSpawned {
        runtime_id: u64,
        item: String,
        count: u32,
        position: (f64, f64, f64),
    },
    ItemCountChanged {
        runtime_id: u64,
        count: u32,
    },
    ItemRemoved {
        runtime_id: u64,
    },
}

// ---------------------------------------------------------------------------
// GameWorld
// ---------------------------------------------------------------------------

/// Items rest on a flat floor at this height.
pub const FLAT_FLOOR_Y: f64 = 4.0;

pub struct GameWorld {
    pub world: World,
    authoritative: bool,
    items: HashMap<u64, Entity>,
}

impl GameWorld {
    /// Authoritative world with the given starting entity ID.
    pub fn new(starting_entity_id: u64) -> Self {
        let mut world = World::new();
        world.insert_resource(OutgoingEvents::default());
        world.insert_resource(TickCounter::default());
        world.insert_resource(EntityIdAllocator::new(starting_entity_id));

        Self {
            world,
            authoritative: true,
            items: HashMap::new(),
        }
    }

    /// Non-authoritative replica. Altars ticked against it do nothing.
    pub fn observer() -> Self {
        Self {
            authoritative: false,
            ..Self::new(1)
        }
    }

    /// Run one tick: advance the clock and integrate item motion.
    pub fn tick(&mut self) {
        self.world.resource_mut::<TickCounter>().0 += 1;
        system_item_physics(&mut self.world);
    }

    /// Drain all pending outgoing events.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.world.resource_mut::<OutgoingEvents>().events)
    }

    pub fn current_tick(&self) -> u64 {
        self.world.resource::<TickCounter>().0
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Snapshots of every loose item.
    pub fn all_items(&self) -> Vec<ItemEntityView> {
        let mut ids: Vec<u64> = self.items.keys().copied().collect();
        ids.sort_unstable();
        ids.into_iter()
            .filter_map(|id| self.item(ItemEntityId(id)))
            .collect()
    }

    pub fn item_velocity(&self, id: ItemEntityId) -> Option<Vec3> {
        let entity = *self.items.get(&id.0)?;
        let vel = self.world.get::<Velocity>(entity)?;
        Some(Vec3::new(vel.x, vel.y, vel.z))
    }

    fn push_event(&mut self, event: GameEvent) {
        self.world
            .resource_mut::<OutgoingEvents>()
            .events
            .push(event);
    }
}

impl WorldAccess for GameWorld {
    fn is_authoritative(&self) -> bool {
        self.authoritative
    }

    fn game_time(&self) -> u64 {
        self.current_tick()
    }

    fn items_within(&self, bounds: &Aabb) -> Vec<ItemEntityView> {
        self.items
            .keys()
            .filter_map(|&id| self.item(ItemEntityId(id)))
            .filter(|view| bounds.contains(view.position))
            .collect()
    }

    fn item(&self, id: ItemEntityId) -> Option<ItemEntityView> {
        let entity = *self.items.get(&id.0)?;
        let pos = self.world.get::<Position>(entity)?;
        let dropped = self.world.get::<DroppedItem>(entity)?;
        Some(ItemEntityView {
            id,
            position: Vec3::new(pos.x, pos.y, pos.z),
            stack: dropped.0.clone(),
        })
    }

    fn push_item(&mut self, id: ItemEntityId, impulse: Vec3) {
        let Some(&entity) = self.items.get(&id.0) else {
            return;
        };
        if let Some(mut vel) = self.world.get_mut::<Velocity>(entity) {
            vel.x += impulse.x;
            vel.y += impulse.y;
            vel.z += impulse.z;
        }
        if let Some(mut on_ground) = self.world.get_mut::<OnGround>(entity) {
            on_ground.0 = false;
        }
    }

    fn set_item_count(&mut self, id: ItemEntityId, count: u32) {
        if count == 0 {
            self.remove_item(id);
            return;
        }
        let Some(&entity) = self.items.get(&id.0) else {
            return;
        };
        if let Some(mut dropped) = self.world.get_mut::<DroppedItem>(entity) {
            dropped.0.count = count;
        }
        self.push_event(GameEvent::ItemCountChanged {
            runtime_id: id.0,
            count,
        });
    }

    fn remove_item(&mut self, id: ItemEntityId) {
        if let Some(entity) = self.items.remove(&id.0) {
            self.world.despawn(entity);
            self.push_event(GameEvent::ItemRemoved { runtime_id: id.0 });
        }
    }

    fn spawn_item(&mut self, position: Vec3, stack: ItemStack) -> ItemEntityId {
        let runtime_id = self.world.resource::<EntityIdAllocator>().allocate();
        let event = GameEvent::ItemSpawned {
            runtime_id,
            item: stack.item.clone(),
            count: stack.count,
            position: (position.x, position.y, position.z),
        };
        let entity = self
            .world
            .spawn((
                EntityId { runtime_id },
                Position {
                    x: position.x,
                    y: position.y,
                    z: position.z,
                },
                Velocity::default(),
                OnGround(false),
                DroppedItem(stack),
            ))
            .id();
        self.items.insert(runtime_id, entity);
        self.push_event(event);
        ItemEntityId(runtime_id)
    }
}

// ---------------------------------------------------------------------------
// Systems (manual, called by GameWorld::tick)
// ---------------------------------------------------------------------------

/// Gravity, drag, and flat-floor collision for dropped items.
fn system_item_physics(world: &mut World) {
    const GRAVITY: f64 = 0.04;
    const DRAG: f64 = 0.98;
    const GROUND_FRICTION: f64 = 0.6;

    let mut query = world.query::<(&mut Position, &mut Velocity, &mut OnGround)>();

    for (mut pos, mut vel, mut on_ground) in query.iter_mut(world) {
        if on_ground.0 && vel.x == 0.0 && vel.z == 0.0 {
            continue;
        }

        vel.y -= GRAVITY;
        vel.x *= DRAG;
        vel.y *= DRAG;
        vel.z *= DRAG;

        pos.x += vel.x;
        pos.y += vel.y;
        pos.z += vel.z;

        if pos.y <= FLAT_FLOOR_Y {
            pos.y = FLAT_FLOOR_Y;
            vel.y = 0.0;
            vel.x *= GROUND_FRICTION;
            vel.z *= GROUND_FRICTION;
            if vel.x.abs() < 0.001 && vel.z.abs() < 0.001 {
                vel.x = 0.0;
                vel.z = 0.0;
                on_ground.0 = true;
            }
        } else {
            on_ground.0 = false;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
