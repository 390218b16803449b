use tracing::debug;
use warden_core::{ItemId, ItemKind, NavigationError, Point, WaypointId};
use warden_navigation::{path::positions, NavigationMesh, ObstacleAwareNavigator};
use warden_world::GroundItem;

use crate::{
    strategy::{disengage, toward, ItemLocator, MovementStrategy, Route, Step, Tick},
    MovementConfig,
};

/// Fetches the preferred weapon lying on the ground.
///
/// The first kind of the priority list whose nearest item can be reached is
/// chosen; kinds whose trip cannot be planned fall through to the next. The
/// trip is planned with the obstacle-aware navigator at both ends and a
/// shortest route through the mesh in between. Every tick re-checks that the item is
/// still on the ground and that the enemy is still unarmed.
#[derive(Clone, Debug)]
pub struct WeaponSeek {
    priorities: Vec<ItemKind>,
    navigator: ObstacleAwareNavigator,
    speed: f32,
    epsilon: f32,
    pickup_radius: f32,
    retry_cooldown: f32,
    cooldown: f32,
    stopped: bool,
    transit: Option<Transit>,
}

#[derive(Clone, Debug)]
struct Transit {
    item: GroundItem,
    route: Route,
}

impl WeaponSeek {
    /// Creates a weapon seek using the configured priority list.
    #[must_use]
    pub fn new(config: &MovementConfig) -> Self {
        Self {
            priorities: config.weapon_priority.clone(),
            navigator: ObstacleAwareNavigator::new(config.max_attempts),
            speed: config.evade_speed,
            epsilon: config.arrival_epsilon,
            pickup_radius: config.pickup_radius,
            retry_cooldown: config.retry_cooldown.as_secs_f32(),
            cooldown: 0.0,
            stopped: false,
            transit: None,
        }
    }

    /// Item currently travelled to.
    #[must_use]
    pub fn goal(&self) -> Option<ItemId> {
        self.transit.as_ref().map(|transit| transit.item.id)
    }

    /// Nearest item of the first priority kind present on the ground.
    #[must_use]
    pub fn choose(&self, items: &dyn ItemLocator, from: Point) -> Option<GroundItem> {
        self.choose_excluding(items, from, &[])
    }

    fn choose_excluding(
        &self,
        items: &dyn ItemLocator,
        from: Point,
        excluded: &[ItemKind],
    ) -> Option<GroundItem> {
        self.priorities
            .iter()
            .filter(|kind| !excluded.contains(kind))
            .find_map(|kind| items.nearest_of_kind(*kind, from))
    }

    /// Plans a trip to the first kind whose item can be reached, falling back
    /// along the priority list when a trip cannot be planned.
    fn start(
        &mut self,
        mesh: &mut NavigationMesh,
        tick: &Tick<'_>,
    ) -> Result<Option<Transit>, NavigationError> {
        let mut failed_kinds: Vec<ItemKind> = Vec::new();
        let mut last_failure = None;
        while let Some(item) = self.choose_excluding(tick.items, tick.position, &failed_kinds) {
            match self.plan(mesh, tick, item) {
                Ok(route) => return Ok(Some(Transit { item, route })),
                Err(error) if error.is_configuration() => return Err(error),
                Err(error) => {
                    debug!(kind = ?item.kind, %error, "weapon kind unreachable");
                    failed_kinds.push(item.kind);
                    last_failure = Some(error);
                }
            }
        }
        last_failure.map_or(Ok(None), Err)
    }

    /// Reports whether a new trip could start once the strategy is engaged.
    #[must_use]
    pub fn is_ready(&self, items: &dyn ItemLocator, from: Point) -> bool {
        self.cooldown <= 0.0 && self.choose(items, from).is_some()
    }

    /// Counts down the retry cooldown.
    pub fn elapse(&mut self, dt: f32) {
        self.cooldown = (self.cooldown - dt).max(0.0);
    }

    fn plan(
        &mut self,
        mesh: &mut NavigationMesh,
        tick: &Tick<'_>,
        item: GroundItem,
    ) -> Result<Route, NavigationError> {
        if !tick.line_of_sight.is_obstructed(tick.position, item.position) {
            return Ok(Route::new(vec![item.position]));
        }

        let entry = self
            .navigator
            .find_clear(mesh.index(), tick.position, tick.line_of_sight)?;
        let exit = self
            .navigator
            .find_clear(mesh.index(), item.position, tick.line_of_sight)?;
        let route = mesh.route(
            WaypointId::new(entry.waypoint.slot),
            WaypointId::new(exit.waypoint.slot),
        )?;

        let mut points = positions(mesh.graph(), &route);
        points.push(item.position);
        Ok(Route::new(points))
    }

    fn abort(&mut self, reason: &'static str) {
        if let Some(transit) = self.transit.take() {
            debug!(item = transit.item.id.get(), reason, "weapon seek aborted");
        }
    }
}

impl MovementStrategy for WeaponSeek {
    fn advance(
        &mut self,
        mesh: &mut NavigationMesh,
        tick: &Tick<'_>,
    ) -> Result<Step, NavigationError> {
        if self.stopped {
            return Ok(Step::Hold);
        }

        if self.transit.is_none() {
            if self.cooldown > 0.0 {
                return Ok(Step::Hold);
            }
            match self.start(mesh, tick) {
                Ok(Some(transit)) => {
                    debug!(
                        item = transit.item.id.get(),
                        kind = ?transit.item.kind,
                        "weapon seek started"
                    );
                    self.transit = Some(transit);
                }
                Ok(None) => return Ok(Step::Hold),
                Err(error) => {
                    self.cooldown = self.retry_cooldown;
                    return disengage(error, "weapon seek");
                }
            }
        }

        if tick.equipped.is_some() {
            self.abort("already armed");
            return Ok(Step::Hold);
        }

        let Some(transit) = self.transit.as_mut() else {
            return Ok(Step::Hold);
        };
        if tick.items.item(transit.item.id).is_none() {
            self.abort("item vanished");
            return Ok(Step::Hold);
        }

        let item = transit.item;
        if tick.position.distance(item.position) <= self.pickup_radius {
            self.transit = None;
            return Ok(Step::PickUp(item.id));
        }

        let reach = self.speed * tick.dt;
        let displacement = transit
            .route
            .advance(tick.position, reach, self.epsilon)
            .unwrap_or_else(|| toward(tick.position, item.position, reach));
        Ok(Step::Displace(displacement))
    }

    // Trips are always planned from the current position.
    fn needs_repositioning(&mut self, reposition: bool) {
        if reposition {
            self.abort("repositioning");
        }
    }

    fn stop_maneuvers(&mut self, stop: bool) {
        self.stopped = stop;
        if stop {
            self.abort("stopped");
        }
    }

    fn is_busy(&self) -> bool {
        self.transit.is_some()
    }
}
