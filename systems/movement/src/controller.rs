use std::fmt;

use tracing::{debug, warn};
use warden_core::{EnemyId, EnemyKind, EnemyLayout, NavigationError};
use warden_navigation::{NavigationMesh, WaypointGraph};

use crate::{
    chase::Chase,
    evade::Evade,
    patrol::Patrol,
    strategy::{MovementStrategy, Step, Tick},
    weapon_seek::WeaponSeek,
    MovementConfig,
};

/// Strategy currently steering an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Standing still without a patrol route.
    Idle,
    /// Walking the patrol route.
    Patrol,
    /// Running at the player.
    Chase,
    /// Circling away from the player.
    Evade,
    /// Fetching a weapon.
    WeaponSeek,
    /// Stopped for good after a configuration error.
    Halted,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Patrol => "patrol",
            Self::Chase => "chase",
            Self::Evade => "evade",
            Self::WeaponSeek => "weapon-seek",
            Self::Halted => "halted",
        };
        f.write_str(name)
    }
}

/// Per-enemy state machine choosing between the movement strategies.
///
/// A missing weapon outranks awareness: an unarmed enemy fetches a weapon
/// whenever one is available. Aware guards chase and aware cowards evade.
/// Everything else patrols, resuming from the nearest visible route point.
#[derive(Clone, Debug)]
pub struct EnemyController {
    id: EnemyId,
    kind: EnemyKind,
    mesh: NavigationMesh,
    patrol: Option<Patrol>,
    chase: Chase,
    evade: Evade,
    seek: WeaponSeek,
    mode: Mode,
    fault: Option<NavigationError>,
}

impl EnemyController {
    /// Creates a controller over an assembled mesh.
    #[must_use]
    pub fn new(
        id: EnemyId,
        kind: EnemyKind,
        layout: &EnemyLayout,
        mesh: NavigationMesh,
        config: &MovementConfig,
    ) -> Self {
        let patrol = (!layout.patrol_route.is_empty())
            .then(|| Patrol::new(layout.patrol_route.clone(), config));
        let mode = if patrol.is_some() {
            Mode::Patrol
        } else {
            Mode::Idle
        };

        Self {
            id,
            kind,
            evade: Evade::new(&mesh, config),
            chase: Chase::new(layout.doors.clone(), config),
            seek: WeaponSeek::new(config),
            mesh,
            patrol,
            mode,
            fault: None,
        }
    }

    /// Identifier of the controlled enemy.
    #[must_use]
    pub const fn id(&self) -> EnemyId {
        self.id
    }

    /// Strategy that steered the latest tick.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Configuration error that halted the enemy, if any.
    #[must_use]
    pub fn fault(&self) -> Option<&NavigationError> {
        self.fault.as_ref()
    }

    /// Navigation mesh assembled for the enemy.
    #[must_use]
    pub fn mesh(&self) -> &NavigationMesh {
        &self.mesh
    }

    /// Connections among the enemy's own waypoints, offered to later
    /// assemblies.
    #[must_use]
    pub fn connections(&self) -> &WaypointGraph {
        self.mesh.connections()
    }

    /// Patrol strategy, when the enemy has a route.
    #[must_use]
    pub fn patrol(&self) -> Option<&Patrol> {
        self.patrol.as_ref()
    }

    /// Reports whether a multi-tick maneuver is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.evade.is_busy() || self.seek.is_busy()
    }

    /// Advances the controller by one tick.
    pub fn tick(&mut self, aware: bool, tick: &Tick<'_>) -> Step {
        self.seek.elapse(tick.dt);
        if self.mode == Mode::Halted {
            return Step::Hold;
        }

        let next = self.select(aware, tick);
        if next != self.mode {
            self.transition(next);
        }

        let result = match self.mode {
            Mode::Idle | Mode::Halted => Ok(Step::Hold),
            Mode::Patrol => match self.patrol.as_mut() {
                Some(patrol) => patrol.advance(&mut self.mesh, tick),
                None => Ok(Step::Hold),
            },
            Mode::Chase => self.chase.advance(&mut self.mesh, tick),
            Mode::Evade => self.evade.advance(&mut self.mesh, tick),
            Mode::WeaponSeek => self.seek.advance(&mut self.mesh, tick),
        };

        match result {
            Ok(step) => step,
            Err(error) => {
                warn!(
                    enemy = self.id.get(),
                    mode = %self.mode,
                    %error,
                    "navigation misconfigured; enemy halted"
                );
                self.stop_all();
                self.mode = Mode::Halted;
                self.fault = Some(error);
                Step::Hold
            }
        }
    }

    fn select(&self, aware: bool, tick: &Tick<'_>) -> Mode {
        let unarmed = tick.equipped.is_none();
        if unarmed && (self.seek.is_busy() || self.seek.is_ready(tick.items, tick.position)) {
            return Mode::WeaponSeek;
        }
        if aware {
            return match self.kind {
                EnemyKind::Guard => Mode::Chase,
                EnemyKind::Coward => Mode::Evade,
            };
        }
        if self.patrol.is_some() {
            Mode::Patrol
        } else {
            Mode::Idle
        }
    }

    fn transition(&mut self, next: Mode) {
        debug!(enemy = self.id.get(), from = %self.mode, to = %next, "movement mode changed");

        match self.mode {
            Mode::Evade => self.evade.stop_maneuvers(true),
            Mode::WeaponSeek => self.seek.stop_maneuvers(true),
            _ => {}
        }
        match next {
            Mode::Patrol => {
                if let Some(patrol) = self.patrol.as_mut() {
                    patrol.needs_repositioning(true);
                }
            }
            Mode::Chase => self.chase.needs_repositioning(true),
            Mode::Evade => self.evade.stop_maneuvers(false),
            Mode::WeaponSeek => self.seek.stop_maneuvers(false),
            Mode::Idle | Mode::Halted => {}
        }
        self.mode = next;
    }

    fn stop_all(&mut self) {
        if let Some(patrol) = self.patrol.as_mut() {
            patrol.stop_maneuvers(true);
        }
        self.chase.stop_maneuvers(true);
        self.evade.stop_maneuvers(true);
        self.seek.stop_maneuvers(true);
    }
}
