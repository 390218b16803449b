#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state that hosts the Warden navigation core.
//!
//! The world owns the level geometry, the player position feed, the enemy
//! bodies and the ground items. It never makes navigation decisions itself;
//! it only executes [`Command`] values and reports what happened as
//! [`Event`] values.

mod items;

use std::time::Duration;

use glam::Vec2;
use tracing::debug;
use warden_core::{
    Command, EnemyId, EnemyKind, EnemyLayout, Event, ItemId, ItemKind, LineOfSight, PickupError,
    Point, Segment,
};
use warden_navigation::GlobalWaypoints;

pub use items::{GroundItem, KindIndex};

use items::ItemRegistry;

/// Largest distance from which an enemy can pick up an item.
pub const PICKUP_REACH: f32 = 0.75;

/// Static level geometry shared by every enemy.
#[derive(Clone, Debug, Default)]
pub struct Level {
    walls: Vec<Segment>,
    global_waypoints: GlobalWaypoints,
}

impl Level {
    /// Creates a level from its walls and room connectors.
    #[must_use]
    pub fn new(walls: Vec<Segment>, global_waypoints: Vec<Point>) -> Self {
        Self {
            walls,
            global_waypoints: GlobalWaypoints::new(global_waypoints),
        }
    }

    /// Wall segments that obstruct line of sight.
    #[must_use]
    pub fn walls(&self) -> &[Segment] {
        &self.walls
    }

    /// Room-connecting waypoints.
    #[must_use]
    pub fn global_waypoints(&self) -> &GlobalWaypoints {
        &self.global_waypoints
    }
}

impl LineOfSight for Level {
    fn is_obstructed(&self, from: Point, to: Point) -> bool {
        let sight = Segment::new(from, to);
        self.walls.iter().any(|wall| wall.intersects(&sight))
    }
}

/// Represents the authoritative world state.
#[derive(Debug, Default)]
pub struct World {
    level: Level,
    player: Option<Point>,
    enemies: Vec<Enemy>,
    items: ItemRegistry,
    next_enemy_id: u32,
    tick_index: u64,
    elapsed: Duration,
}

impl World {
    /// Creates an empty world without walls, enemies or items.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn enemy_mut(&mut self, enemy: EnemyId) -> Option<&mut Enemy> {
        self.enemies.iter_mut().find(|candidate| candidate.id == enemy)
    }

    fn pick_up(&mut self, enemy: EnemyId, item: ItemId) -> Result<ItemKind, PickupError> {
        let Some(body) = self.enemies.iter().find(|candidate| candidate.id == enemy) else {
            return Err(PickupError::MissingEnemy);
        };
        let Some(ground) = self.items.get(item) else {
            return Err(PickupError::MissingItem);
        };
        if body.equipped.is_some() {
            return Err(PickupError::AlreadyEquipped);
        }
        if body.position.distance(ground.position) > PICKUP_REACH {
            return Err(PickupError::OutOfReach);
        }

        let _ = self.items.remove(item);
        if let Some(body) = self.enemy_mut(enemy) {
            body.equipped = Some(ground.kind);
        }
        Ok(ground.kind)
    }
}

#[derive(Clone, Debug)]
struct Enemy {
    id: EnemyId,
    kind: EnemyKind,
    position: Point,
    layout: EnemyLayout,
    aware: bool,
    target_hidden: bool,
    equipped: Option<ItemKind>,
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureLevel {
            walls,
            global_waypoints,
        } => {
            let wall_count = walls.len();
            let global_waypoint_count = global_waypoints.len();
            world.level = Level::new(walls, global_waypoints);
            out_events.push(Event::LevelConfigured {
                wall_count,
                global_waypoint_count,
            });
        }
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            world.elapsed = world.elapsed.saturating_add(dt);
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::SetPlayerPosition { position } => {
            world.player = Some(position);
            out_events.push(Event::PlayerMoved { position });
        }
        Command::SpawnEnemy {
            kind,
            position,
            layout,
            equipped,
        } => {
            let id = EnemyId::new(world.next_enemy_id);
            world.next_enemy_id = world.next_enemy_id.saturating_add(1);
            world.enemies.push(Enemy {
                id,
                kind,
                position,
                layout,
                aware: false,
                target_hidden: false,
                equipped,
            });
            out_events.push(Event::EnemySpawned {
                enemy: id,
                kind,
                position,
            });
        }
        Command::DespawnEnemy { enemy } => {
            let before = world.enemies.len();
            world.enemies.retain(|candidate| candidate.id != enemy);
            if world.enemies.len() != before {
                out_events.push(Event::EnemyDespawned { enemy });
            }
        }
        Command::SetAwareness {
            enemy,
            aware,
            target_hidden,
        } => {
            if let Some(body) = world.enemy_mut(enemy) {
                if body.aware != aware || body.target_hidden != target_hidden {
                    body.aware = aware;
                    body.target_hidden = target_hidden;
                    out_events.push(Event::AwarenessChanged {
                        enemy,
                        aware,
                        target_hidden,
                    });
                }
            }
        }
        Command::MoveEnemy {
            enemy,
            displacement,
        } => {
            if displacement == Vec2::ZERO {
                return;
            }
            if let Some(body) = world.enemy_mut(enemy) {
                let from = body.position;
                body.position = from.offset(displacement);
                out_events.push(Event::EnemyMoved {
                    enemy,
                    from,
                    to: body.position,
                });
            }
        }
        Command::SpawnItem { kind, position } => {
            let item = world.items.spawn(kind, position);
            out_events.push(Event::ItemSpawned {
                item,
                kind,
                position,
            });
        }
        Command::RemoveItem { item } => {
            if world.items.remove(item).is_some() {
                out_events.push(Event::ItemRemoved { item });
            }
        }
        Command::PickUpItem { enemy, item } => match world.pick_up(enemy, item) {
            Ok(kind) => {
                out_events.push(Event::ItemRemoved { item });
                out_events.push(Event::ItemPickedUp { enemy, item, kind });
            }
            Err(reason) => {
                debug!(enemy = enemy.get(), item = item.get(), ?reason, "pickup rejected");
                out_events.push(Event::ItemPickupRejected {
                    enemy,
                    item,
                    reason,
                });
            }
        },
        Command::DropItem { enemy } => {
            let Some(body) = world.enemy_mut(enemy) else {
                return;
            };
            let Some(kind) = body.equipped.take() else {
                return;
            };
            let position = body.position;
            let item = world.items.spawn(kind, position);
            out_events.push(Event::ItemSpawned {
                item,
                kind,
                position,
            });
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use warden_core::{EnemyId, EnemyKind, EnemyLayout, ItemId, ItemKind, Point};
    use warden_navigation::GlobalWaypoints;

    use super::{items::ItemRegistry, GroundItem, KindIndex, Level, World};

    /// Provides read-only access to the level geometry.
    ///
    /// The level doubles as the line-of-sight oracle.
    #[must_use]
    pub fn level(world: &World) -> &Level {
        &world.level
    }

    /// Provides read-only access to the shared room connectors.
    #[must_use]
    pub fn global_waypoints(world: &World) -> &GlobalWaypoints {
        world.level.global_waypoints()
    }

    /// Current player position, if the feed has reported one.
    #[must_use]
    pub fn player_position(world: &World) -> Option<Point> {
        world.player
    }

    /// Number of ticks processed so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Simulated time accumulated across all ticks.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.elapsed
    }

    /// Captures a read-only view of every enemy.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        let mut snapshots: Vec<EnemySnapshot> = world
            .enemies
            .iter()
            .map(|enemy| EnemySnapshot {
                id: enemy.id,
                kind: enemy.kind,
                position: enemy.position,
                aware: enemy.aware,
                target_hidden: enemy.target_hidden,
                equipped: enemy.equipped,
            })
            .collect();
        snapshots.sort_by_key(|snapshot| snapshot.id);
        EnemyView { snapshots }
    }

    /// Authored navigation data of an enemy.
    #[must_use]
    pub fn enemy_layout(world: &World, enemy: EnemyId) -> Option<&EnemyLayout> {
        world
            .enemies
            .iter()
            .find(|candidate| candidate.id == enemy)
            .map(|candidate| &candidate.layout)
    }

    /// Exposes a read-only view of the ground items.
    #[must_use]
    pub fn item_view(world: &World) -> ItemView<'_> {
        ItemView {
            registry: &world.items,
        }
    }

    /// Read-only snapshot describing all enemies.
    #[derive(Clone, Debug, Default)]
    pub struct EnemyView {
        snapshots: Vec<EnemySnapshot>,
    }

    impl EnemyView {
        /// Iterator over the captured snapshots in identifier order.
        pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
            self.snapshots.iter()
        }

        /// Snapshot of a single enemy.
        #[must_use]
        pub fn get(&self, enemy: EnemyId) -> Option<&EnemySnapshot> {
            self.snapshots
                .binary_search_by_key(&enemy, |snapshot| snapshot.id)
                .ok()
                .map(|index| &self.snapshots[index])
        }

        /// Consumes the view, yielding the underlying snapshots.
        #[must_use]
        pub fn into_vec(self) -> Vec<EnemySnapshot> {
            self.snapshots
        }
    }

    /// Immutable representation of a single enemy used for queries.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct EnemySnapshot {
        /// Identifier allocated to the enemy.
        pub id: EnemyId,
        /// Behavioural archetype of the enemy.
        pub kind: EnemyKind,
        /// Current position of the enemy body.
        pub position: Point,
        /// Whether the enemy is aware of the player.
        pub aware: bool,
        /// Whether the player is hidden from the enemy.
        pub target_hidden: bool,
        /// Item currently carried by the enemy.
        pub equipped: Option<ItemKind>,
    }

    /// Read-only view into the ground item registry.
    #[derive(Clone, Copy, Debug)]
    pub struct ItemView<'a> {
        registry: &'a ItemRegistry,
    }

    impl<'a> ItemView<'a> {
        /// Iterator over every ground item in spawn order.
        pub fn iter(&self) -> impl Iterator<Item = &'a GroundItem> + 'a {
            self.registry.items().iter()
        }

        /// Looks up a ground item by identifier.
        #[must_use]
        pub fn get(&self, item: ItemId) -> Option<GroundItem> {
            self.registry.get(item)
        }

        /// Spatial index over the ground items of one kind.
        #[must_use]
        pub fn kind_index(&self, kind: ItemKind) -> Option<&'a KindIndex> {
            self.registry.kind_index(kind)
        }

        /// Ground item of `kind` closest to `from`.
        #[must_use]
        pub fn nearest_of_kind(&self, kind: ItemKind, from: Point) -> Option<GroundItem> {
            self.kind_index(kind).and_then(|index| index.nearest(from))
        }
    }
}
