//! Fixed-timestep loop driving the world and the movement system.

use std::time::Duration;

use tracing::{debug, trace};
use warden_core::{Command, EnemyId, Event, LineOfSight, Point};
use warden_system_movement::{toward, Mode, Movement};
use warden_world::{self as world, query, World};

use crate::level::{LevelDescription, PlayerScript};

/// Headless host that feeds the world and the movement system.
#[derive(Debug)]
pub(crate) struct Simulation {
    world: World,
    movement: Movement,
    player: PlayerTrack,
    sight_range: f32,
    tick: Duration,
    pickups: usize,
}

/// State of one enemy after a tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct EnemyTrace {
    pub(crate) enemy: EnemyId,
    pub(crate) position: Point,
    pub(crate) mode: Option<Mode>,
}

impl Simulation {
    /// Builds the level described by `level` inside a fresh world.
    pub(crate) fn new(level: &LevelDescription, movement: Movement, tick: Duration) -> Self {
        let mut simulation = Self {
            world: World::new(),
            movement,
            player: PlayerTrack::new(&level.player),
            sight_range: level.sight_range,
            tick,
            pickups: 0,
        };
        for command in level.setup_commands() {
            simulation.execute(command);
        }
        simulation
    }

    /// Number of weapons picked up so far.
    pub(crate) const fn pickups(&self) -> usize {
        self.pickups
    }

    /// Advances the simulation by one fixed tick.
    pub(crate) fn step(&mut self) -> Vec<EnemyTrace> {
        let dt = self.tick.as_secs_f32();
        if let Some(position) = self.player.advance(dt) {
            self.execute(Command::SetPlayerPosition { position });
        }

        for command in self.awareness_updates() {
            self.execute(command);
        }
        self.execute(Command::Tick { dt: self.tick });

        let traces: Vec<EnemyTrace> = query::enemy_view(&self.world)
            .iter()
            .map(|snapshot| EnemyTrace {
                enemy: snapshot.id,
                position: snapshot.position,
                mode: self
                    .movement
                    .controller(snapshot.id)
                    .map(|controller| controller.mode()),
            })
            .collect();
        for state in &traces {
            trace!(
                tick = query::tick_index(&self.world),
                enemy = state.enemy.get(),
                position = %state.position,
                mode = ?state.mode,
                "enemy state"
            );
        }
        traces
    }

    /// Host-side detection: an enemy is aware of a visible player within
    /// sight range.
    fn awareness_updates(&self) -> Vec<Command> {
        let Some(player) = query::player_position(&self.world) else {
            return Vec::new();
        };
        let level = query::level(&self.world);
        query::enemy_view(&self.world)
            .iter()
            .map(|snapshot| {
                let hidden = level.is_obstructed(snapshot.position, player);
                let in_range = snapshot.position.distance(player) <= self.sight_range;
                Command::SetAwareness {
                    enemy: snapshot.id,
                    aware: in_range && !hidden,
                    target_hidden: hidden,
                }
            })
            .collect()
    }

    fn execute(&mut self, command: Command) {
        let mut events = Vec::new();
        world::apply(&mut self.world, command, &mut events);
        self.pump(events);
    }

    fn pump(&mut self, mut events: Vec<Event>) {
        while !events.is_empty() {
            for event in &events {
                match event {
                    Event::ItemPickedUp { enemy, kind, .. } => {
                        self.pickups += 1;
                        debug!(enemy = enemy.get(), ?kind, "weapon picked up");
                    }
                    Event::ItemPickupRejected { enemy, reason, .. } => {
                        debug!(enemy = enemy.get(), ?reason, "pickup rejected");
                    }
                    Event::AwarenessChanged { enemy, aware, .. } => {
                        debug!(enemy = enemy.get(), aware, "awareness changed");
                    }
                    _ => {}
                }
            }

            let enemy_view = query::enemy_view(&self.world);
            let items = query::item_view(&self.world);
            let mut commands = Vec::new();
            let state = &self.world;
            self.movement.handle(
                &events,
                &enemy_view,
                query::level(state),
                query::player_position(state),
                &items,
                |enemy| query::enemy_layout(state, enemy).cloned(),
                &mut commands,
            );

            events.clear();
            for command in commands {
                world::apply(&mut self.world, command, &mut events);
            }
        }
    }
}

const TRACK_ARRIVAL: f32 = 1e-3;

/// Player body walking its scripted track in a loop.
#[derive(Clone, Debug)]
struct PlayerTrack {
    track: Vec<Point>,
    speed: f32,
    position: Option<Point>,
    cursor: usize,
}

impl PlayerTrack {
    fn new(script: &PlayerScript) -> Self {
        Self {
            track: script.track.clone(),
            speed: script.speed,
            position: script.track.first().copied(),
            cursor: 0,
        }
    }

    fn advance(&mut self, dt: f32) -> Option<Point> {
        let position = self.position?;
        if self.track.len() < 2 {
            return None;
        }

        let mut goal = self.track[self.cursor];
        if position.distance(goal) < TRACK_ARRIVAL {
            self.cursor = (self.cursor + 1) % self.track.len();
            goal = self.track[self.cursor];
        }
        let next = position.offset(toward(position, goal, self.speed * dt));
        self.position = Some(next);
        Some(next)
    }
}
