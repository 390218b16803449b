#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic movement system that steers enemies through their
//! navigation meshes.
//!
//! The system registers a controller for every spawned enemy, assembles the
//! enemy's mesh against the level connectors and the meshes of enemies
//! registered earlier, and emits one movement decision per enemy and tick.

mod chase;
mod config;
mod controller;
mod evade;
mod patrol;
mod strategy;
mod weapon_seek;

use std::collections::BTreeMap;

use tracing::{debug, warn};
use warden_core::{Command, EnemyId, EnemyKind, EnemyLayout, Event, Point};
use warden_navigation::{AssemblyConfig, GraphAssembly, WaypointGraph};
use warden_world::{query::EnemyView, Level};

pub use chase::Chase;
pub use config::MovementConfig;
pub use controller::{EnemyController, Mode};
pub use evade::Evade;
pub use patrol::Patrol;
pub use strategy::{toward, ItemLocator, MovementStrategy, Step, Tick};
pub use weapon_seek::WeaponSeek;

/// Pure system that reacts to world events and emits movement commands.
#[derive(Debug, Default)]
pub struct Movement {
    config: MovementConfig,
    assembly: AssemblyConfig,
    controllers: BTreeMap<EnemyId, EnemyController>,
}

impl Movement {
    /// Creates a movement system using the supplied tunables.
    #[must_use]
    pub fn new(config: MovementConfig, assembly: AssemblyConfig) -> Self {
        Self {
            config,
            assembly,
            controllers: BTreeMap::new(),
        }
    }

    /// Controller registered for `enemy`.
    #[must_use]
    pub fn controller(&self, enemy: EnemyId) -> Option<&EnemyController> {
        self.controllers.get(&enemy)
    }

    /// Every registered controller in identifier order.
    pub fn controllers(&self) -> impl Iterator<Item = &EnemyController> {
        self.controllers.values()
    }

    /// Positions of the enemy's own waypoints.
    #[must_use]
    pub fn waypoints(&self, enemy: EnemyId) -> Option<&[Point]> {
        self.controller(enemy)
            .map(|controller| controller.mesh().waypoints())
    }

    /// Connections among the enemy's own waypoints.
    #[must_use]
    pub fn connections(&self, enemy: EnemyId) -> Option<&WaypointGraph> {
        self.controller(enemy).map(EnemyController::connections)
    }

    /// Consumes world events and immutable views to emit movement commands.
    #[allow(clippy::too_many_arguments)]
    pub fn handle<F>(
        &mut self,
        events: &[Event],
        enemy_view: &EnemyView,
        level: &Level,
        player: Option<Point>,
        items: &dyn ItemLocator,
        layout_of: F,
        out: &mut Vec<Command>,
    ) where
        F: Fn(EnemyId) -> Option<EnemyLayout>,
    {
        for event in events {
            match event {
                Event::EnemySpawned { enemy, kind, .. } => {
                    let layout = layout_of(*enemy).unwrap_or_else(|| {
                        warn!(enemy = enemy.get(), "spawned enemy has no layout");
                        EnemyLayout::default()
                    });
                    self.register(*enemy, *kind, &layout, level);
                }
                Event::EnemyDespawned { enemy } => {
                    if self.controllers.remove(enemy).is_some() {
                        debug!(enemy = enemy.get(), "movement controller deregistered");
                    }
                }
                Event::TimeAdvanced { dt } => {
                    self.advance(dt.as_secs_f32(), enemy_view, level, player, items, out);
                }
                _ => {}
            }
        }
    }

    fn register(&mut self, enemy: EnemyId, kind: EnemyKind, layout: &EnemyLayout, level: &Level) {
        let peers: Vec<&WaypointGraph> = self
            .controllers
            .values()
            .map(EnemyController::connections)
            .collect();
        let assembled = GraphAssembly::new(self.assembly, level.global_waypoints(), level)
            .assemble(&layout.waypoints, &peers);

        debug!(
            enemy = enemy.get(),
            waypoints = assembled.mesh.graph().len(),
            unlinked = assembled.unlinked,
            "movement controller registered"
        );
        let controller = EnemyController::new(enemy, kind, layout, assembled.mesh, &self.config);
        let _ = self.controllers.insert(enemy, controller);
    }

    fn advance(
        &mut self,
        dt: f32,
        enemy_view: &EnemyView,
        level: &Level,
        player: Option<Point>,
        items: &dyn ItemLocator,
        out: &mut Vec<Command>,
    ) {
        for (enemy, controller) in &mut self.controllers {
            let Some(snapshot) = enemy_view.get(*enemy) else {
                continue;
            };
            let tick = Tick {
                position: snapshot.position,
                target: player,
                equipped: snapshot.equipped,
                dt,
                line_of_sight: level,
                items,
            };

            match controller.tick(snapshot.aware, &tick) {
                Step::Hold => {}
                Step::Displace(displacement) => out.push(Command::MoveEnemy {
                    enemy: *enemy,
                    displacement,
                }),
                Step::PickUp(item) => out.push(Command::PickUpItem {
                    enemy: *enemy,
                    item,
                }),
            }
        }
    }
}
