use warden_core::{NavigationError, Point};
use warden_navigation::NavigationMesh;

use crate::{
    strategy::{toward, MovementStrategy, Step, Tick},
    MovementConfig,
};

/// Walks a fixed cyclic route at constant speed.
#[derive(Clone, Debug)]
pub struct Patrol {
    route: Vec<Point>,
    cursor: usize,
    speed: f32,
    epsilon: f32,
    reposition: bool,
}

impl Patrol {
    /// Creates a patrol over `route`, heading for its first point.
    #[must_use]
    pub fn new(route: Vec<Point>, config: &MovementConfig) -> Self {
        Self {
            route,
            cursor: 0,
            speed: config.patrol_speed,
            epsilon: config.arrival_epsilon,
            reposition: false,
        }
    }

    /// Index of the route point currently walked toward.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Points of the patrol route.
    #[must_use]
    pub fn route(&self) -> &[Point] {
        &self.route
    }

    /// Nearest route point visible from `position`, falling back to the
    /// nearest overall when every point is hidden.
    fn closest_resume_point(&self, tick: &Tick<'_>) -> usize {
        let by_distance = |visible_only: bool| {
            self.route
                .iter()
                .enumerate()
                .filter(|(_, point)| {
                    !visible_only || !tick.line_of_sight.is_obstructed(tick.position, **point)
                })
                .map(|(index, point)| (index, point.distance_squared(tick.position)))
                .min_by(|(a_index, a), (b_index, b)| a.total_cmp(b).then(a_index.cmp(b_index)))
                .map(|(index, _)| index)
        };
        by_distance(true)
            .or_else(|| by_distance(false))
            .unwrap_or(0)
    }
}

impl MovementStrategy for Patrol {
    fn advance(
        &mut self,
        _mesh: &mut NavigationMesh,
        tick: &Tick<'_>,
    ) -> Result<Step, NavigationError> {
        if self.route.is_empty() {
            return Err(NavigationError::EmptyWaypoints {
                what: "patrol route",
            });
        }

        if self.reposition {
            self.reposition = false;
            self.cursor = self.closest_resume_point(tick);
        }

        let mut goal = self.route[self.cursor];
        if tick.position.distance(goal) < self.epsilon {
            self.cursor = (self.cursor + 1) % self.route.len();
            goal = self.route[self.cursor];
        }

        let displacement = toward(tick.position, goal, self.speed * tick.dt);
        if displacement == glam::Vec2::ZERO {
            return Ok(Step::Hold);
        }
        Ok(Step::Displace(displacement))
    }

    fn needs_repositioning(&mut self, reposition: bool) {
        self.reposition = reposition;
    }

    // Walking a route is not a suspended maneuver; nothing to cancel.
    fn stop_maneuvers(&mut self, _stop: bool) {}

    fn is_busy(&self) -> bool {
        false
    }
}
