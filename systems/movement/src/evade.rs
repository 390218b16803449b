use std::cmp::Ordering;

use tracing::debug;
use warden_core::{NavigationError, Point, WaypointId};
use warden_navigation::{path::positions, NavigationMesh, ObstacleAwareNavigator};

use crate::{
    strategy::{disengage, MovementStrategy, Route, Step, Tick},
    MovementConfig,
};

/// Flees to a waypoint it can reach in a straight line, then circles its
/// room's waypoints until stopped.
///
/// The circuit orders the waypoints by angle around their centroid. On
/// entry the circuit is rotated so that the waypoints following the entry
/// point come next. Every leg between two circuit waypoints follows the
/// shortest route through the mesh.
#[derive(Clone, Debug)]
pub struct Evade {
    navigator: ObstacleAwareNavigator,
    circuit: Vec<WaypointId>,
    speed: f32,
    epsilon: f32,
    retry_cooldown: f32,
    cooldown: f32,
    stopped: bool,
    task: EvadeTask,
}

#[derive(Clone, Debug, Default)]
enum EvadeTask {
    #[default]
    Idle,
    Entering {
        entry: WaypointId,
        route: Route,
    },
    Circling {
        heading: usize,
        route: Route,
    },
}

impl Evade {
    /// Creates an evade maneuver over the enemy's mesh.
    ///
    /// The circuit covers the enemy's own waypoints, or the whole mesh when
    /// the enemy authored none.
    #[must_use]
    pub fn new(mesh: &NavigationMesh, config: &MovementConfig) -> Self {
        let pool: Vec<WaypointId> = if mesh.waypoints().is_empty() {
            mesh.graph().ids().collect()
        } else {
            (0..mesh.waypoints().len()).map(WaypointId::new).collect()
        };

        Self {
            navigator: ObstacleAwareNavigator::new(config.max_attempts),
            circuit: angular_order(mesh, pool),
            speed: config.evade_speed,
            epsilon: config.arrival_epsilon,
            retry_cooldown: config.retry_cooldown.as_secs_f32(),
            cooldown: 0.0,
            stopped: false,
            task: EvadeTask::Idle,
        }
    }

    /// Waypoints of the circuit in angular order.
    #[must_use]
    pub fn circuit(&self) -> &[WaypointId] {
        &self.circuit
    }

    /// Slots rejected by the latest search for an entry waypoint.
    #[must_use]
    pub fn rejected(&self) -> &[usize] {
        self.navigator.rejected()
    }

    fn start(&mut self, mesh: &NavigationMesh, tick: &Tick<'_>) -> Result<(), NavigationError> {
        if self.circuit.is_empty() {
            return Err(NavigationError::EmptyWaypoints {
                what: "evade circuit",
            });
        }

        let clear = self
            .navigator
            .find_clear(mesh.index(), tick.position, tick.line_of_sight)?;
        let entry = WaypointId::new(clear.waypoint.slot);
        debug!(%entry, attempts = clear.attempts, "evade entry selected");
        self.task = EvadeTask::Entering {
            entry,
            route: Route::new(vec![clear.waypoint.point]),
        };
        Ok(())
    }

    fn enter_circuit(
        &self,
        mesh: &mut NavigationMesh,
        entry: WaypointId,
    ) -> Result<EvadeTask, NavigationError> {
        let entry_point = mesh.position(entry)?;
        let heading = self
            .circuit
            .iter()
            .enumerate()
            .filter_map(|(index, waypoint)| {
                mesh.graph()
                    .position(*waypoint)
                    .map(|point| (index, point.distance_squared(entry_point)))
            })
            .min_by(|(a_index, a), (b_index, b)| a.total_cmp(b).then(a_index.cmp(b_index)))
            .map_or(0, |(index, _)| index);

        let route = mesh.route(entry, self.circuit[heading])?;
        Ok(EvadeTask::Circling {
            heading,
            route: Route::new(positions(mesh.graph(), &route)),
        })
    }

    fn walk(
        &mut self,
        mesh: &mut NavigationMesh,
        tick: &Tick<'_>,
    ) -> Result<Step, NavigationError> {
        let reach = self.speed * tick.dt;

        if let EvadeTask::Entering { entry, route } = &mut self.task {
            if let Some(displacement) = route.advance(tick.position, reach, self.epsilon) {
                return Ok(Step::Displace(displacement));
            }
            let entry = *entry;
            self.task = self.enter_circuit(mesh, entry)?;
        }

        // A full lap without movement means every circuit point is within
        // reach of the body.
        for _ in 0..=self.circuit.len() {
            let EvadeTask::Circling { heading, route } = &mut self.task else {
                return Ok(Step::Hold);
            };
            if let Some(displacement) = route.advance(tick.position, reach, self.epsilon) {
                return Ok(Step::Displace(displacement));
            }

            let from = self.circuit[*heading];
            let next = (*heading + 1) % self.circuit.len();
            let leg = mesh.route(from, self.circuit[next])?;
            *heading = next;
            *route = Route::new(positions(mesh.graph(), &leg));
        }
        Ok(Step::Hold)
    }

    fn abort(&mut self) {
        self.task = EvadeTask::Idle;
        self.cooldown = self.retry_cooldown;
    }
}

impl MovementStrategy for Evade {
    fn advance(
        &mut self,
        mesh: &mut NavigationMesh,
        tick: &Tick<'_>,
    ) -> Result<Step, NavigationError> {
        if self.stopped {
            return Ok(Step::Hold);
        }

        if matches!(self.task, EvadeTask::Idle) {
            if self.cooldown > 0.0 {
                self.cooldown = (self.cooldown - tick.dt).max(0.0);
                return Ok(Step::Hold);
            }
            if let Err(error) = self.start(mesh, tick) {
                self.abort();
                return disengage(error, "evade");
            }
        }

        match self.walk(mesh, tick) {
            Ok(step) => Ok(step),
            Err(error) => {
                self.abort();
                disengage(error, "evade")
            }
        }
    }

    fn needs_repositioning(&mut self, reposition: bool) {
        if reposition {
            self.task = EvadeTask::Idle;
        }
    }

    fn stop_maneuvers(&mut self, stop: bool) {
        self.stopped = stop;
        if stop {
            self.task = EvadeTask::Idle;
            self.cooldown = 0.0;
        }
    }

    fn is_busy(&self) -> bool {
        !matches!(self.task, EvadeTask::Idle)
    }
}

fn angular_order(mesh: &NavigationMesh, pool: Vec<WaypointId>) -> Vec<WaypointId> {
    let points: Vec<(WaypointId, Point)> = pool
        .into_iter()
        .filter_map(|waypoint| mesh.graph().position(waypoint).map(|point| (waypoint, point)))
        .collect();
    if points.is_empty() {
        return Vec::new();
    }

    let count = points.len() as f32;
    let (sum_x, sum_y) = points
        .iter()
        .fold((0.0, 0.0), |(x, y), (_, point)| (x + point.x(), y + point.y()));
    let centroid = Point::new(sum_x / count, sum_y / count);

    let mut ordered: Vec<(f32, WaypointId)> = points
        .into_iter()
        .map(|(waypoint, point)| {
            let angle = (point.y() - centroid.y()).atan2(point.x() - centroid.x());
            (angle, waypoint)
        })
        .collect();
    ordered.sort_by(|(a_angle, a), (b_angle, b)| match a_angle.total_cmp(b_angle) {
        Ordering::Equal => a.cmp(b),
        other => other,
    });
    ordered.into_iter().map(|(_, waypoint)| waypoint).collect()
}
